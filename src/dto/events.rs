use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    bot::{
        events::{ButtonEvent, ChatId, MessageId, Sender, TextEvent},
        router::EventOutcome,
    },
    dto::validation::validate_handle,
};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
/// Remote user an inbound event came from.
pub struct SenderPayload {
    /// Messaging handle, used to look up the sender's identity.
    #[validate(custom(function = "validate_handle"))]
    pub handle: String,
    /// Numeric platform id.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Display name.
    #[serde(default)]
    #[validate(length(max = 256))]
    pub full_name: String,
    /// Preferred language, e.g. `en` or `ru`.
    #[serde(default)]
    #[validate(length(min = 2, max = 16))]
    pub language_code: Option<String>,
}

impl From<SenderPayload> for Sender {
    fn from(value: SenderPayload) -> Self {
        Self {
            handle: value.handle,
            user_id: value.user_id,
            full_name: value.full_name,
            language_code: value.language_code,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
/// Free-text message received from a chat.
pub struct MessageEventRequest {
    /// Chat the message was typed in.
    pub chat_id: ChatId,
    /// Author of the message.
    #[validate(nested)]
    pub sender: SenderPayload,
    /// Message text.
    #[validate(length(min = 1, max = 4096))]
    pub text: String,
}

impl From<MessageEventRequest> for TextEvent {
    fn from(value: MessageEventRequest) -> Self {
        Self {
            chat_id: value.chat_id,
            sender: value.sender.into(),
            text: value.text,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
/// Inline button press received from a chat.
pub struct ButtonEventRequest {
    /// Chat the button was pressed in.
    pub chat_id: ChatId,
    /// User who pressed it.
    #[validate(nested)]
    pub sender: SenderPayload,
    /// Message the pressed button is attached to.
    pub message_id: MessageId,
    /// Value carried by the button.
    #[validate(length(min = 1, max = 64))]
    pub value: String,
}

impl From<ButtonEventRequest> for ButtonEvent {
    fn from(value: ButtonEventRequest) -> Self {
        Self {
            chat_id: value.chat_id,
            sender: value.sender.into(),
            message_id: value.message_id,
            value: value.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
/// How the bot handled an inbound event.
pub struct EventOutcomeResponse {
    /// `advanced`, `fallback`, `wrong_button`, `unexpected_text` or `failed`.
    pub outcome: String,
    /// Process that handled the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    /// Whether the conversation finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EventOutcomeResponse {
    fn bare(outcome: &str) -> Self {
        Self {
            outcome: outcome.to_owned(),
            process: None,
            completed: None,
            reason: None,
        }
    }
}

impl From<EventOutcome> for EventOutcomeResponse {
    fn from(value: EventOutcome) -> Self {
        match value {
            EventOutcome::Advanced { process, completed } => Self {
                process: Some(process.tag().to_owned()),
                completed: Some(completed),
                ..Self::bare("advanced")
            },
            EventOutcome::Fallback => Self::bare("fallback"),
            EventOutcome::WrongButton => Self::bare("wrong_button"),
            EventOutcome::UnexpectedText => Self::bare("unexpected_text"),
            EventOutcome::Failed { reason } => Self {
                reason: Some(reason),
                ..Self::bare("failed")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::conversation::ProcessKind;

    #[test]
    fn nested_sender_is_validated() {
        let request: MessageEventRequest = serde_json::from_str(
            r#"{"chat_id": 1, "sender": {"handle": "bad handle"}, "text": "hi"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: MessageEventRequest = serde_json::from_str(
            r#"{"chat_id": 1, "sender": {"handle": "alice", "language_code": "en"}, "text": "hi"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(TextEvent::from(request).sender.language_code.as_deref(), Some("en"));
    }

    #[test]
    fn outcome_serialises_without_empty_fields() {
        let advanced = EventOutcomeResponse::from(EventOutcome::Advanced {
            process: ProcessKind::Registration,
            completed: true,
        });
        assert_eq!(
            serde_json::to_value(advanced).unwrap(),
            serde_json::json!({"outcome": "advanced", "process": "REGISTRATION", "completed": true})
        );
        assert_eq!(
            serde_json::to_value(EventOutcomeResponse::from(EventOutcome::Fallback)).unwrap(),
            serde_json::json!({"outcome": "fallback"})
        );
    }
}
