//! Conversation flows. Each process is a phase-transition function from the
//! current state and an inbound event to a [`Step`].

mod registration;
mod team_choosing;

use futures::future::BoxFuture;

pub use self::{registration::Registration, team_choosing::TeamChoosing};
use crate::{
    bot::{
        conversation::{ConversationState, ProcessKind},
        events::{ButtonValue, ChatId, InboundEvent},
        step::Step,
        transport::Keyboard,
    },
    dao::{bot_store::BotStore, models::IdentityEntity},
    error::{BotError, UnexpectedEvent},
    locale::PhraseBundle,
};

/// Everything a process may look at while handling one event.
#[derive(Clone, Copy)]
pub struct Turn<'a> {
    /// Chat the event belongs to.
    pub chat_id: ChatId,
    /// The event itself.
    pub event: InboundEvent<'a>,
    /// Current conversation, `None` when the process is being started.
    pub state: Option<&'a ConversationState>,
    /// Identity of the sender, when registered.
    pub identity: Option<&'a IdentityEntity>,
    /// Phrases in the sender's language.
    pub phrases: &'a PhraseBundle,
    /// Identity and catalog lookups.
    pub store: &'a dyn BotStore,
}

impl Turn<'_> {
    /// Decoded value of a button event.
    ///
    /// Text events and undecodable values are unexpected at a button step.
    pub fn button_value(&self) -> Result<ButtonValue, BotError> {
        match self.event {
            InboundEvent::Button(event) => event
                .value
                .parse::<ButtonValue>()
                .map_err(|_| BotError::from(UnexpectedEvent::UnknownButton(event.value.clone()))),
            InboundEvent::Text(_) => Err(UnexpectedEvent::TextWhileAwaitingButton.into()),
        }
    }

    /// Text of a text event; a button press is unexpected at a text step.
    pub fn text(&self) -> Result<&str, BotError> {
        match self.event {
            InboundEvent::Text(event) => Ok(&event.text),
            InboundEvent::Button(_) => Err(UnexpectedEvent::ButtonWhileAwaitingText.into()),
        }
    }
}

/// A named multi-turn conversation flow.
pub trait Process: Send + Sync {
    /// Which conversation this process drives.
    fn kind(&self) -> ProcessKind;

    /// Handle one event, starting the conversation when `turn.state` is `None`.
    fn advance<'a>(&'a self, turn: Turn<'a>) -> BoxFuture<'a, Result<Step, BotError>>;
}

/// Reply keyboard listing the processes the sender can start.
pub fn main_menu(registered: bool, phrases: &PhraseBundle) -> Keyboard {
    let mut rows = vec![vec![phrases.generate_teams_btn.clone()]];
    if !registered {
        rows.push(vec![phrases.registrate_btn.clone()]);
    }
    Keyboard::Reply {
        rows,
        placeholder: Some(phrases.input_field_placeholder.clone()),
    }
}

/// Prompt text with the chosen answer appended, used to freeze answered prompts.
pub fn answered(phrases: &PhraseBundle, prompt: &str, answer: &str) -> String {
    format!("{prompt}\n\n{}: {answer}", phrases.answer)
}
