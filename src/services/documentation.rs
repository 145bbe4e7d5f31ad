use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the tournament bot.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::events::post_message,
        crate::routes::events::post_button_press,
        crate::routes::chats::conversation_state,
        crate::routes::sse::outbox_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::events::SenderPayload,
            crate::dto::events::MessageEventRequest,
            crate::dto::events::ButtonEventRequest,
            crate::dto::events::EventOutcomeResponse,
            crate::dto::conversation::ConversationSnapshot,
            crate::dto::conversation::MutationSnapshot,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::OutboxEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "events", description = "Inbound chat events"),
        (name = "chats", description = "Conversation inspection"),
        (name = "sse", description = "Outbound action stream"),
    )
)]
pub struct ApiDoc;
