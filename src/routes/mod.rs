use axum::Router;

use crate::state::SharedState;

/// Conversation inspection.
pub mod chats;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Inbound chat events.
pub mod events;
/// Health check.
pub mod health;
/// Outbox event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(events::router())
        .merge(chats::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
