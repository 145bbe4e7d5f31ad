use serde::Serialize;
use utoipa::ToSchema;

use crate::bot::{
    events::{ChatId, MessageId},
    transport::Keyboard,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialised payload.
    pub data: String,
}

impl ServerEvent {
    /// Event with a raw data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether storage is unreachable.
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
/// Outbound transport action a delivery connector must perform.
pub enum OutboxEvent {
    /// Deliver a new message under the given id.
    Send {
        /// Target chat.
        chat_id: ChatId,
        /// Outbox-assigned message id.
        message_id: MessageId,
        /// Message text.
        text: String,
        /// Keyboard to attach, if any.
        #[schema(value_type = Option<Object>)]
        #[serde(skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },
    /// Replace the text and keyboard of a delivered message.
    Edit {
        /// Target chat.
        chat_id: ChatId,
        /// Outbox-assigned message id.
        message_id: MessageId,
        /// Message text.
        text: String,
        /// Keyboard to attach, if any.
        #[schema(value_type = Option<Object>)]
        #[serde(skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },
    /// Remove the inline keyboard of a delivered message.
    ClearButtons {
        /// Target chat.
        chat_id: ChatId,
        /// Outbox-assigned message id.
        message_id: MessageId,
    },
    /// Delete a delivered message.
    Delete {
        /// Target chat.
        chat_id: ChatId,
        /// Outbox-assigned message id.
        message_id: MessageId,
    },
}

impl OutboxEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            OutboxEvent::Send { .. } => "send",
            OutboxEvent::Edit { .. } => "edit",
            OutboxEvent::ClearButtons { .. } => "clear_buttons",
            OutboxEvent::Delete { .. } => "delete",
        }
    }
}
