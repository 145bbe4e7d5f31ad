use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::events::{ButtonEventRequest, EventOutcomeResponse, MessageEventRequest},
    error::AppError,
    services::events_service,
    state::SharedState,
};

/// Routes receiving inbound chat events.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/events/message", post(post_message))
        .route("/events/button", post(post_button_press))
}

/// Deliver a text message typed in a chat.
#[utoipa::path(
    post,
    path = "/events/message",
    tag = "events",
    request_body = MessageEventRequest,
    responses(
        (status = 200, description = "Event handled", body = EventOutcomeResponse),
        (status = 400, description = "Invalid event payload"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<MessageEventRequest>>,
) -> Result<Json<EventOutcomeResponse>, AppError> {
    let outcome = events_service::handle_message(&state, payload).await?;
    Ok(Json(outcome))
}

/// Deliver an inline button press.
#[utoipa::path(
    post,
    path = "/events/button",
    tag = "events",
    request_body = ButtonEventRequest,
    responses(
        (status = 200, description = "Event handled", body = EventOutcomeResponse),
        (status = 400, description = "Invalid event payload"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn post_button_press(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ButtonEventRequest>>,
) -> Result<Json<EventOutcomeResponse>, AppError> {
    let outcome = events_service::handle_button_press(&state, payload).await?;
    Ok(Json(outcome))
}
