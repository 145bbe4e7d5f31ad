//! Entry point for inbound events.
//!
//! One call handles one event end to end under the chat's lock: resolve the
//! sender's language and identity, pick the owning process, run it, execute
//! its effects, commit the state transition and reconcile pending message
//! mutations.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::{
    bot::{
        conversation::ProcessKind,
        events::{ButtonEvent, ChatId, InboundEvent, TextEvent},
        processes::{Turn, main_menu},
        reconcile,
        registry::ProcessRegistry,
        state_store::StateStore,
        step::{Effect, Step, Transition},
        transport::{OutboundMessage, Transport},
    },
    dao::bot_store::BotStore,
    error::{BotError, UnexpectedEvent},
    locale::{LocaleRegistry, PhraseBundle},
};

/// How an inbound event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A process handled the event.
    Advanced {
        /// Process that handled it.
        process: ProcessKind,
        /// The conversation finished and its state was deleted.
        completed: bool,
    },
    /// Nothing matched; a fallback phrase was sent.
    Fallback,
    /// The button press did not belong to the current step; the user was told.
    WrongButton,
    /// Text arrived while a button press was expected; the user was told.
    UnexpectedText,
    /// The turn failed and was rolled back.
    Failed {
        /// Error description.
        reason: String,
    },
}

/// Per-chat mutual exclusion around a whole turn.
#[derive(Debug, Default)]
pub struct ChatLocks {
    locks: DashMap<ChatId, Arc<Mutex<()>>>,
}

impl ChatLocks {
    /// Wait for exclusive access to `chat_id`.
    pub async fn acquire(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(chat_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Forget locks nobody holds or waits for, returning how many were dropped.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of tracked chats.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no chat is tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Routes inbound events to processes and keeps conversation state.
pub struct EventRouter {
    states: StateStore,
    registry: ProcessRegistry,
    transport: Arc<dyn Transport>,
    locales: Arc<LocaleRegistry>,
    locks: ChatLocks,
}

impl EventRouter {
    /// Router with an empty state store.
    pub fn new(
        registry: ProcessRegistry,
        transport: Arc<dyn Transport>,
        locales: Arc<LocaleRegistry>,
    ) -> Self {
        Self {
            states: StateStore::new(),
            registry,
            transport,
            locales,
            locks: ChatLocks::default(),
        }
    }

    /// Conversation states of every chat.
    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// Handle a free-text message.
    pub async fn handle_message(&self, store: &dyn BotStore, event: &TextEvent) -> EventOutcome {
        self.handle(store, InboundEvent::Text(event)).await
    }

    /// Handle an inline button press.
    pub async fn handle_button_press(
        &self,
        store: &dyn BotStore,
        event: &ButtonEvent,
    ) -> EventOutcome {
        self.handle(store, InboundEvent::Button(event)).await
    }

    /// Drop conversations idle for longer than `ttl` and unused chat locks.
    pub fn expire_idle(&self, ttl: Duration) -> usize {
        let expired = self.states.expire_idle(ttl);
        let pruned = self.locks.prune();
        if expired > 0 || pruned > 0 {
            info!(expired, pruned, "expired idle conversations");
        }
        expired
    }

    async fn handle(&self, store: &dyn BotStore, event: InboundEvent<'_>) -> EventOutcome {
        let chat_id = event.chat_id();
        let _guard = self.locks.acquire(chat_id).await;

        let sender = event.sender();
        let phrases = self.locales.resolve(sender.language_code.as_deref());
        debug!(
            chat_id,
            handle = %sender.handle,
            language = %phrases.language_code,
            button = event.message_id().is_some(),
            "inbound event"
        );

        let outcome = match self.turn(store, event, &phrases).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(chat_id, error = %err, "event handling failed; turn rolled back");
                EventOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        debug!(chat_id, ?outcome, "event handled");
        outcome
    }

    async fn turn(
        &self,
        store: &dyn BotStore,
        event: InboundEvent<'_>,
        phrases: &PhraseBundle,
    ) -> Result<EventOutcome, BotError> {
        let chat_id = event.chat_id();
        let identity = store.find_by_handle(event.sender().handle.clone()).await?;
        let state = self.states.get(chat_id);

        let awaiting_button = state.as_ref().map(|state| state.awaiting_button_press);
        match (event, awaiting_button) {
            (InboundEvent::Button(_), None | Some(false)) => {
                warn!(chat_id, "button pressed without a conversation awaiting it");
                return self
                    .notify(chat_id, &phrases.wrong_btn_pressing, EventOutcome::WrongButton)
                    .await;
            }
            (InboundEvent::Text(_), Some(true)) => {
                warn!(chat_id, "text received while a button press is expected");
                return self
                    .notify(chat_id, &phrases.unexpected_text, EventOutcome::UnexpectedText)
                    .await;
            }
            _ => {}
        }

        let resolved = match (&state, event) {
            (Some(state), _) => self.registry.resolve(state.process_kind().tag(), phrases),
            (None, InboundEvent::Text(text)) => self.registry.resolve(&text.text, phrases),
            (None, InboundEvent::Button(button)) => {
                Err(BotError::ProcessNotFound(button.value.clone()))
            }
        };
        let process = match resolved {
            Ok(process) => process,
            Err(BotError::ProcessNotFound(key)) => {
                debug!(chat_id, key = %key, "no process matches; sending fallback");
                let text = phrases
                    .fallback
                    .choose(&mut rand::rng())
                    .cloned()
                    .unwrap_or_else(|| phrases.unexpected_text.clone());
                self.transport
                    .send_text(
                        chat_id,
                        OutboundMessage::text(text)
                            .with_keyboard(main_menu(identity.is_some(), phrases)),
                    )
                    .await?;
                return Ok(EventOutcome::Fallback);
            }
            Err(err) => return Err(err),
        };

        let turn = Turn {
            chat_id,
            event,
            state: state.as_ref(),
            identity: identity.as_ref(),
            phrases,
            store,
        };
        let step = match process.advance(turn).await {
            Ok(step) => step,
            Err(BotError::UnexpectedEvent(reason)) => {
                warn!(chat_id, process = process.kind().tag(), %reason, "event does not fit the conversation");
                return match reason {
                    UnexpectedEvent::TextWhileAwaitingButton => {
                        self.notify(chat_id, &phrases.unexpected_text, EventOutcome::UnexpectedText)
                            .await
                    }
                    _ => {
                        self.notify(chat_id, &phrases.wrong_btn_pressing, EventOutcome::WrongButton)
                            .await
                    }
                };
            }
            Err(err) => return Err(err),
        };

        let completed = self.apply(store, chat_id, step).await?;
        Ok(EventOutcome::Advanced {
            process: process.kind(),
            completed,
        })
    }

    /// Execute the effects of `step`, then commit its transition and sweep.
    ///
    /// Returns whether the conversation completed (and was deleted).
    async fn apply(
        &self,
        store: &dyn BotStore,
        chat_id: ChatId,
        step: Step,
    ) -> Result<bool, BotError> {
        let Step {
            transition,
            effects,
        } = step;

        let mut mutations = Vec::new();
        for effect in effects {
            match effect {
                Effect::Send { message, track } => {
                    let message_id = self.transport.send_text(chat_id, message).await?;
                    if let Some(track) = track {
                        mutations.push(track.into_mutation(message_id));
                    }
                }
                Effect::Edit {
                    message_id,
                    text,
                    keyboard,
                } => {
                    self.transport
                        .edit_text(chat_id, message_id, text, keyboard)
                        .await?;
                }
                Effect::Register(mutation) => mutations.push(mutation),
                Effect::CreateIdentity(identity) => {
                    let created = store.create_identity(identity).await?;
                    info!(
                        chat_id,
                        handle = %created.handle,
                        nickname = %created.nickname,
                        "identity registered"
                    );
                }
            }
        }

        let complete = match transition {
            Transition::Start(state) => {
                let complete = state.is_complete;
                debug!(chat_id, phase = ?state.phase, "conversation started");
                if self.states.create(chat_id, state).is_some() {
                    warn!(chat_id, "replaced an existing conversation");
                }
                complete
            }
            Transition::Update(patch) => {
                let state = self.states.update(chat_id, patch)?;
                debug!(chat_id, phase = ?state.phase, complete = state.is_complete, "conversation advanced");
                state.is_complete
            }
            Transition::Keep => self
                .states
                .get(chat_id)
                .is_some_and(|state| state.is_complete),
        };
        if !mutations.is_empty() {
            self.states.add_mutations(chat_id, mutations)?;
        }

        reconcile::sweep(&self.states, self.transport.as_ref(), chat_id).await;
        if complete {
            let report = reconcile::sweep(&self.states, self.transport.as_ref(), chat_id).await;
            if report.pending > 0 {
                warn!(chat_id, pending = report.pending, "dropping unapplied mutations of a finished conversation");
            }
            self.states.delete(chat_id);
            debug!(chat_id, "conversation finished");
        }

        Ok(complete)
    }

    async fn notify(
        &self,
        chat_id: ChatId,
        text: &str,
        outcome: EventOutcome,
    ) -> Result<EventOutcome, BotError> {
        self.transport
            .send_text(chat_id, OutboundMessage::text(text))
            .await?;
        Ok(outcome)
    }
}
