use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::{
    bot::{
        conversation::{ConversationState, MessageMutation, MutationAction, Payload},
        events::{ChatId, MessageId},
    },
    dto::format_system_time,
};

#[derive(Debug, Serialize, ToSchema)]
/// Pending change to a delivered message.
pub struct MutationSnapshot {
    /// Target message.
    pub message_id: MessageId,
    /// `remove_message`, `clear_buttons` or `replace_text`.
    pub action: String,
    /// Replacement text for `replace_text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Held back until the conversation completes.
    pub defer_until_completion: bool,
}

impl From<&MessageMutation> for MutationSnapshot {
    fn from(value: &MessageMutation) -> Self {
        let (action, text) = match &value.action {
            MutationAction::RemoveMessage => ("remove_message", None),
            MutationAction::ClearButtons => ("clear_buttons", None),
            MutationAction::ReplaceText(text) => ("replace_text", Some(text.clone())),
        };
        Self {
            message_id: value.message_id,
            action: action.to_owned(),
            text,
            defer_until_completion: value.defer_until_completion,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// In-flight conversation of a chat.
pub struct ConversationSnapshot {
    /// Chat the conversation belongs to.
    pub chat_id: ChatId,
    /// Owning process tag.
    pub process: String,
    /// Current phase tag.
    pub phase: String,
    /// Whether only a button press is accepted.
    pub awaiting_button_press: bool,
    /// Process-specific data.
    #[schema(value_type = Object)]
    pub payload: Value,
    /// Number of records held back for substitution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_reservations: Option<usize>,
    /// Pending changes to delivered messages.
    pub message_mutations: Vec<MutationSnapshot>,
    /// Set once the flow reached its end.
    pub is_complete: bool,
    /// RFC 3339 timestamp of the last change.
    pub updated_at: String,
}

impl From<&ConversationState> for ConversationSnapshot {
    fn from(value: &ConversationState) -> Self {
        let payload = match &value.payload {
            Payload::Registration(payload) => json!({ "nickname": payload.nickname }),
            Payload::TeamChoosing(payload) => json!({
                "players_count": payload.players_count,
                "rating": payload.rating.map(|rating| rating.as_f32()),
                "assignments": payload
                    .assignments
                    .iter()
                    .map(|(player, team)| json!({ "player": player, "team_id": team }))
                    .collect::<Vec<_>>(),
            }),
        };

        Self {
            chat_id: value.chat_id,
            process: value.process_kind().tag().to_owned(),
            phase: value.phase.tag().to_owned(),
            awaiting_button_press: value.awaiting_button_press,
            payload,
            pending_reservations: value.pending_reservation_ids.as_ref().map(Vec::len),
            message_mutations: value.message_mutations.values().map(Into::into).collect(),
            is_complete: value.is_complete,
            updated_at: format_system_time(value.updated_at),
        }
    }
}
