use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use futures::future::BoxFuture;
use indexmap::IndexSet;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    bot::{
        events::{ChatId, MessageId},
        transport::{Keyboard, OutboundMessage, Transport, TransportError, TransportResult},
    },
    dto::sse::{OutboxEvent, ServerEvent},
    state::SseHub,
};

/// [`Transport`] that publishes every outbound action on the outbox SSE stream.
///
/// Message ids are assigned locally, so a delivery connector only has to replay
/// the actions against the real platform. Messages this transport never
/// delivered (or already deleted) are reported as gone.
///
/// At most `live_limit` messages are remembered; the oldest are forgotten
/// first and count as gone afterwards.
pub struct OutboxTransport {
    hub: Arc<SseHub>,
    next_id: AtomicI64,
    live: Mutex<IndexSet<(ChatId, MessageId)>>,
    live_limit: usize,
}

impl OutboxTransport {
    /// Default number of messages kept editable.
    pub const DEFAULT_LIVE_LIMIT: usize = 10_000;

    /// Publish onto `hub`.
    pub fn new(hub: Arc<SseHub>) -> Self {
        Self::with_live_limit(hub, Self::DEFAULT_LIVE_LIMIT)
    }

    /// Publish onto `hub`, remembering at most `live_limit` messages.
    pub fn with_live_limit(hub: Arc<SseHub>, live_limit: usize) -> Self {
        Self {
            hub,
            next_id: AtomicI64::new(1),
            live: Mutex::new(IndexSet::new()),
            live_limit: live_limit.max(1),
        }
    }

    /// Number of delivered messages that are still editable.
    pub async fn live_messages(&self) -> usize {
        self.live.lock().await.len()
    }

    fn publish(&self, event: OutboxEvent) {
        match ServerEvent::json(Some(event.name().to_owned()), &event) {
            Ok(payload) => self.hub.broadcast(payload),
            Err(err) => warn!(error = %err, "failed to serialise outbox event"),
        }
    }

    async fn remember(&self, chat_id: ChatId, message_id: MessageId) {
        let mut live = self.live.lock().await;
        live.insert((chat_id, message_id));
        while live.len() > self.live_limit {
            if let Some((chat_id, message_id)) = live.shift_remove_index(0) {
                debug!(chat_id, message_id, "forgetting oldest outbox message");
            }
        }
    }

    async fn ensure_live(&self, chat_id: ChatId, message_id: MessageId) -> TransportResult<()> {
        if self.live.lock().await.contains(&(chat_id, message_id)) {
            Ok(())
        } else {
            Err(TransportError::MessageGone { message_id })
        }
    }
}

impl Transport for OutboxTransport {
    fn send_text(
        &self,
        chat_id: ChatId,
        message: OutboundMessage,
    ) -> BoxFuture<'_, TransportResult<MessageId>> {
        Box::pin(async move {
            let message_id = self.next_id.fetch_add(1, Ordering::Relaxed);
            self.remember(chat_id, message_id).await;
            debug!(chat_id, message_id, "outbox send");
            self.publish(OutboxEvent::Send {
                chat_id,
                message_id,
                text: message.text,
                keyboard: message.keyboard,
            });
            Ok(message_id)
        })
    }

    fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.ensure_live(chat_id, message_id).await?;
            self.publish(OutboxEvent::Edit {
                chat_id,
                message_id,
                text,
                keyboard,
            });
            Ok(())
        })
    }

    fn clear_buttons(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.ensure_live(chat_id, message_id).await?;
            self.publish(OutboxEvent::ClearButtons {
                chat_id,
                message_id,
            });
            Ok(())
        })
    }

    fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            if !self.live.lock().await.shift_remove(&(chat_id, message_id)) {
                return Err(TransportError::MessageGone { message_id });
            }
            self.publish(OutboxEvent::Delete {
                chat_id,
                message_id,
            });
            Ok(())
        })
    }
}
