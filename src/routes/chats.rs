use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    bot::events::ChatId, dto::conversation::ConversationSnapshot, error::AppError,
    services::chat_service, state::SharedState,
};

/// Routes exposing in-flight conversations.
pub fn router() -> Router<SharedState> {
    Router::new().route("/chats/{chat_id}/state", get(conversation_state))
}

/// Return the in-flight conversation of a chat.
#[utoipa::path(
    get,
    path = "/chats/{chat_id}/state",
    tag = "chats",
    params(("chat_id" = i64, Path, description = "Chat identifier")),
    responses(
        (status = 200, description = "Conversation in flight", body = ConversationSnapshot),
        (status = 404, description = "No conversation in this chat")
    )
)]
pub async fn conversation_state(
    State(state): State<SharedState>,
    Path(chat_id): Path<ChatId>,
) -> Result<Json<ConversationSnapshot>, AppError> {
    let snapshot = chat_service::conversation(&state, chat_id)?;
    Ok(Json(snapshot))
}
