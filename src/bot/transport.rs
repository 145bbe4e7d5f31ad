use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::bot::events::{ChatId, MessageId};

/// Inline button: what the user sees and the value reported back when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    /// Visible caption.
    pub label: String,
    /// Encoded [`ButtonValue`](crate::bot::events::ButtonValue).
    pub value: String,
}

impl Button {
    /// Button with the given caption and value.
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Keyboard {
    /// Buttons attached to the message itself; presses arrive as button events.
    Inline {
        /// Button rows.
        rows: Vec<Vec<Button>>,
    },
    /// Persistent reply keyboard; presses arrive as plain text.
    Reply {
        /// Label rows.
        rows: Vec<Vec<String>>,
        /// Hint shown in the input field.
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

impl Keyboard {
    /// Lay `buttons` out as an inline keyboard with `per_row` buttons per row.
    pub fn inline_grid(buttons: Vec<Button>, per_row: usize) -> Self {
        let per_row = per_row.max(1);
        let mut rows = Vec::with_capacity(buttons.len().div_ceil(per_row));
        let mut row = Vec::with_capacity(per_row);
        for button in buttons {
            row.push(button);
            if row.len() == per_row {
                rows.push(std::mem::take(&mut row));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
        Keyboard::Inline { rows }
    }

    /// Single row of inline buttons.
    pub fn inline_row(buttons: Vec<Button>) -> Self {
        Keyboard::Inline {
            rows: vec![buttons],
        }
    }

    /// Whether the keyboard is attached to the message (and can be cleared later).
    pub fn is_inline(&self) -> bool {
        matches!(self, Keyboard::Inline { .. })
    }
}

/// Message to deliver to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Message body.
    pub text: String,
    /// Optional keyboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    /// Plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Attach a keyboard.
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The target message no longer exists (deleted or never delivered).
    #[error("message {message_id} no longer exists")]
    MessageGone {
        /// Message the operation targeted.
        message_id: MessageId,
    },
    /// The platform refused the request.
    #[error("transport rejected the request: {0}")]
    Rejected(String),
}

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Outbound side of the messaging platform.
pub trait Transport: Send + Sync {
    /// Deliver a message and return the id the platform assigned to it.
    fn send_text(
        &self,
        chat_id: ChatId,
        message: OutboundMessage,
    ) -> BoxFuture<'_, TransportResult<MessageId>>;

    /// Replace the text of a delivered message; `keyboard` replaces its buttons
    /// (`None` drops them).
    fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> BoxFuture<'_, TransportResult<()>>;

    /// Remove the inline keyboard of a delivered message.
    fn clear_buttons(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> BoxFuture<'_, TransportResult<()>>;

    /// Delete a delivered message.
    fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> BoxFuture<'_, TransportResult<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_grid_wraps_rows() {
        let buttons = (1..=5).map(|n| Button::new(n.to_string(), n)).collect();
        let Keyboard::Inline { rows } = Keyboard::inline_grid(buttons, 2) else {
            panic!("expected an inline keyboard");
        };
        let widths: Vec<usize> = rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![2, 2, 1]);
        assert_eq!(rows[2][0].value, "5");
    }
}
