use crate::{
    bot::events::ChatId, dto::conversation::ConversationSnapshot, error::ServiceError,
    state::SharedState,
};

/// Snapshot of the in-flight conversation of a chat.
pub fn conversation(
    state: &SharedState,
    chat_id: ChatId,
) -> Result<ConversationSnapshot, ServiceError> {
    state
        .router()
        .states()
        .get(chat_id)
        .map(|conversation| ConversationSnapshot::from(&conversation))
        .ok_or_else(|| ServiceError::NotFound(format!("no conversation in chat {chat_id}")))
}
