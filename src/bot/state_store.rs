use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;

use crate::bot::{
    conversation::{ConversationState, MessageMutation, StatePatch},
    events::{ChatId, MessageId},
};

/// Contract violations raised by the [`StateStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The chat has no conversation state.
    #[error("no conversation state for chat {0}")]
    NotFound(ChatId),
}

/// In-memory mapping from chat to its in-flight conversation.
///
/// The store only holds data; serialising the read-modify-write cycle of a
/// chat is the caller's job (see the per-chat locks of the event router).
#[derive(Debug, Default)]
pub struct StateStore {
    states: DashMap<ChatId, ConversationState>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `state` for `chat_id`, overwriting any previous state.
    ///
    /// Returns the replaced state, if there was one.
    pub fn create(&self, chat_id: ChatId, state: ConversationState) -> Option<ConversationState> {
        self.states.insert(chat_id, state)
    }

    /// Snapshot of the chat's state.
    pub fn get(&self, chat_id: ChatId) -> Option<ConversationState> {
        self.states.get(&chat_id).map(|entry| entry.value().clone())
    }

    /// Merge `patch` into the existing state and return the merged result.
    pub fn update(
        &self,
        chat_id: ChatId,
        patch: StatePatch,
    ) -> Result<ConversationState, StateError> {
        let mut entry = self
            .states
            .get_mut(&chat_id)
            .ok_or(StateError::NotFound(chat_id))?;
        entry.apply(patch);
        Ok(entry.value().clone())
    }

    /// Insert or overwrite mutations, keyed by their message id.
    pub fn add_mutations<I>(&self, chat_id: ChatId, mutations: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = MessageMutation>,
    {
        let mut entry = self
            .states
            .get_mut(&chat_id)
            .ok_or(StateError::NotFound(chat_id))?;
        for mutation in mutations {
            entry
                .message_mutations
                .insert(mutation.message_id, mutation);
        }
        Ok(())
    }

    /// Drop mutations by message id; unknown ids are ignored.
    pub fn remove_mutations(
        &self,
        chat_id: ChatId,
        message_ids: &[MessageId],
    ) -> Result<(), StateError> {
        let mut entry = self
            .states
            .get_mut(&chat_id)
            .ok_or(StateError::NotFound(chat_id))?;
        for message_id in message_ids {
            entry.message_mutations.shift_remove(message_id);
        }
        Ok(())
    }

    /// Remove the chat's state, returning it. No-op when absent.
    pub fn delete(&self, chat_id: ChatId) -> Option<ConversationState> {
        self.states.remove(&chat_id).map(|(_, state)| state)
    }

    /// Drop every state untouched for longer than `ttl`, returning how many went.
    pub fn expire_idle(&self, ttl: Duration) -> usize {
        let before = self.states.len();
        self.states.retain(|_, state| {
            state
                .updated_at
                .elapsed()
                .map(|idle| idle <= ttl)
                .unwrap_or(true)
        });
        before.saturating_sub(self.states.len())
    }

    /// Number of chats with an in-flight conversation.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no conversation is in flight.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
