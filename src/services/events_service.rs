use tracing::debug;

use crate::{
    bot::events::{ButtonEvent, TextEvent},
    dto::events::{ButtonEventRequest, EventOutcomeResponse, MessageEventRequest},
    error::ServiceError,
    state::SharedState,
};

/// Feed a text message to the conversation engine.
pub async fn handle_message(
    state: &SharedState,
    request: MessageEventRequest,
) -> Result<EventOutcomeResponse, ServiceError> {
    let store = state.require_bot_store().await?;
    let event = TextEvent::from(request);
    debug!(chat_id = event.chat_id, "inbound message");
    let outcome = state.router().handle_message(store.as_ref(), &event).await;
    Ok(outcome.into())
}

/// Feed a button press to the conversation engine.
pub async fn handle_button_press(
    state: &SharedState,
    request: ButtonEventRequest,
) -> Result<EventOutcomeResponse, ServiceError> {
    let store = state.require_bot_store().await?;
    let event = ButtonEvent::from(request);
    debug!(chat_id = event.chat_id, message_id = event.message_id, "inbound button press");
    let outcome = state
        .router()
        .handle_button_press(store.as_ref(), &event)
        .await;
    Ok(outcome.into())
}
