//! Reconciliation sweep: applies due message mutations of a chat.

use tracing::{debug, warn};

use crate::bot::{
    conversation::{MessageMutation, MutationAction},
    events::ChatId,
    state_store::StateStore,
    transport::{Transport, TransportError, TransportResult},
};

/// What a sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Mutations applied by the transport.
    pub applied: usize,
    /// Mutations dropped because their message was already gone.
    pub gone: usize,
    /// Mutations left pending (deferred or failed).
    pub pending: usize,
}

/// Apply every due mutation of the chat's state.
///
/// Each mutation is removed from the store as soon as it has been applied, so
/// an interrupted sweep leaves the queue consistent. Mutations that fail for
/// any reason other than a vanished message stay queued for the next sweep.
pub async fn sweep(states: &StateStore, transport: &dyn Transport, chat_id: ChatId) -> SweepReport {
    let mut report = SweepReport::default();
    let Some(state) = states.get(chat_id) else {
        return report;
    };

    for mutation in state.message_mutations.values() {
        if !mutation.is_due(state.is_complete) {
            report.pending += 1;
            continue;
        }

        match apply(transport, chat_id, mutation).await {
            Ok(()) => report.applied += 1,
            Err(TransportError::MessageGone { message_id }) => {
                debug!(chat_id, message_id, "message already gone; dropping mutation");
                report.gone += 1;
            }
            Err(err) => {
                warn!(
                    chat_id,
                    message_id = mutation.message_id,
                    error = %err,
                    "failed to apply message mutation; keeping it queued"
                );
                report.pending += 1;
                continue;
            }
        }

        if states
            .remove_mutations(chat_id, &[mutation.message_id])
            .is_err()
        {
            // state deleted concurrently; nothing left to reconcile
            break;
        }
    }

    report
}

async fn apply(
    transport: &dyn Transport,
    chat_id: ChatId,
    mutation: &MessageMutation,
) -> TransportResult<()> {
    match &mutation.action {
        MutationAction::RemoveMessage => transport.delete_message(chat_id, mutation.message_id).await,
        MutationAction::ClearButtons => transport.clear_buttons(chat_id, mutation.message_id).await,
        MutationAction::ReplaceText(text) => {
            transport
                .edit_text(chat_id, mutation.message_id, text.clone(), None)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;

    use super::*;
    use crate::bot::{
        conversation::{ConversationState, Payload, Phase, RegistrationPayload, RegistrationPhase},
        events::MessageId,
        transport::{Keyboard, OutboundMessage},
    };

    #[derive(Default)]
    struct ScriptedTransport {
        gone: Vec<MessageId>,
        failing: Vec<MessageId>,
        calls: Mutex<Vec<(String, MessageId)>>,
    }

    impl ScriptedTransport {
        fn respond(&self, call: &str, message_id: MessageId) -> TransportResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((call.to_owned(), message_id));
            if self.gone.contains(&message_id) {
                Err(TransportError::MessageGone { message_id })
            } else if self.failing.contains(&message_id) {
                Err(TransportError::Rejected("flood control".into()))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<(String, MessageId)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send_text(
            &self,
            _chat_id: ChatId,
            _message: OutboundMessage,
        ) -> BoxFuture<'_, TransportResult<MessageId>> {
            Box::pin(async { Ok(1) })
        }

        fn edit_text(
            &self,
            _chat_id: ChatId,
            message_id: MessageId,
            _text: String,
            _keyboard: Option<Keyboard>,
        ) -> BoxFuture<'_, TransportResult<()>> {
            let result = self.respond("edit", message_id);
            Box::pin(async move { result })
        }

        fn clear_buttons(
            &self,
            _chat_id: ChatId,
            message_id: MessageId,
        ) -> BoxFuture<'_, TransportResult<()>> {
            let result = self.respond("clear", message_id);
            Box::pin(async move { result })
        }

        fn delete_message(
            &self,
            _chat_id: ChatId,
            message_id: MessageId,
        ) -> BoxFuture<'_, TransportResult<()>> {
            let result = self.respond("delete", message_id);
            Box::pin(async move { result })
        }
    }

    fn store_with(mutations: Vec<MessageMutation>, complete: bool) -> StateStore {
        let mut state = ConversationState::new(
            1,
            Phase::Registration(RegistrationPhase::ExpectConfirm),
            Payload::Registration(RegistrationPayload::default()),
        );
        state.is_complete = complete;
        let store = StateStore::new();
        store.create(1, state);
        store.add_mutations(1, mutations).unwrap();
        store
    }

    #[tokio::test]
    async fn deferred_mutations_wait_for_completion() {
        let store = store_with(
            vec![
                MessageMutation::on_completion(10, MutationAction::ClearButtons),
                MessageMutation::immediate(11, MutationAction::ReplaceText("answered".into())),
            ],
            false,
        );
        let transport = ScriptedTransport::default();

        let report = sweep(&store, &transport, 1).await;

        assert_eq!(report.applied, 1);
        assert_eq!(report.pending, 1);
        assert_eq!(transport.calls(), vec![("edit".to_owned(), 11)]);
        let remaining = store.get(1).unwrap().message_mutations;
        assert!(remaining.contains_key(&10));
        assert!(!remaining.contains_key(&11));
    }

    #[tokio::test]
    async fn completed_state_flushes_everything_and_second_sweep_is_a_no_op() {
        let store = store_with(
            vec![
                MessageMutation::on_completion(10, MutationAction::ClearButtons),
                MessageMutation::immediate(11, MutationAction::RemoveMessage),
            ],
            true,
        );
        let transport = ScriptedTransport::default();

        let first = sweep(&store, &transport, 1).await;
        let second = sweep(&store, &transport, 1).await;

        assert_eq!(first.applied, 2);
        assert_eq!(second, SweepReport::default());
        assert_eq!(transport.calls().len(), 2);
        assert!(store.get(1).unwrap().message_mutations.is_empty());
    }

    #[tokio::test]
    async fn vanished_messages_are_dropped_and_failures_retried() {
        let store = store_with(
            vec![
                MessageMutation::immediate(20, MutationAction::ClearButtons),
                MessageMutation::immediate(21, MutationAction::ClearButtons),
            ],
            false,
        );
        let transport = ScriptedTransport {
            gone: vec![20],
            failing: vec![21],
            ..Default::default()
        };

        let report = sweep(&store, &transport, 1).await;

        assert_eq!(report.gone, 1);
        assert_eq!(report.pending, 1);
        let remaining = store.get(1).unwrap().message_mutations;
        assert_eq!(remaining.keys().copied().collect::<Vec<_>>(), vec![21]);
    }

    #[tokio::test]
    async fn sweep_without_state_does_nothing() {
        let store = StateStore::new();
        let transport = ScriptedTransport::default();
        assert_eq!(sweep(&store, &transport, 5).await, SweepReport::default());
        assert!(transport.calls().is_empty());
    }
}
