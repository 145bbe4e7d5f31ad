//! Outcome of a single process turn.
//!
//! Processes never touch the state store or the transport directly: they
//! describe what should happen and the router carries it out, committing the
//! state transition only after every effect succeeded.

use crate::{
    bot::{
        conversation::{ConversationState, MessageMutation, MutationAction, StatePatch},
        events::MessageId,
        transport::{Keyboard, OutboundMessage},
    },
    dao::models::NewIdentity,
};

/// How the router should register a mutation for a freshly sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracking {
    /// Action to apply to the message later.
    pub action: MutationAction,
    /// Hold the action back until the conversation completes.
    pub defer_until_completion: bool,
}

impl Tracking {
    /// Mutation for the message once its id is known.
    pub fn into_mutation(self, message_id: MessageId) -> MessageMutation {
        MessageMutation {
            message_id,
            action: self.action,
            defer_until_completion: self.defer_until_completion,
        }
    }
}

/// Side effect requested by a process, executed in order by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a message, optionally tracking it for later reconciliation.
    Send {
        /// Message to deliver.
        message: OutboundMessage,
        /// Mutation to register against the delivered message id.
        track: Option<Tracking>,
    },
    /// Edit a message in place.
    Edit {
        /// Target message.
        message_id: MessageId,
        /// New text.
        text: String,
        /// New keyboard (`None` drops the buttons).
        keyboard: Option<Keyboard>,
    },
    /// Register a mutation for a message sent in an earlier turn.
    Register(MessageMutation),
    /// Persist a new identity.
    CreateIdentity(NewIdentity),
}

/// State change requested by a process.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Create the chat's state.
    Start(ConversationState),
    /// Merge a patch into the existing state.
    Update(StatePatch),
    /// Leave the state as it is.
    Keep,
}

/// Everything a process decided for one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// State change, committed after the effects ran.
    pub transition: Transition,
    /// Ordered side effects.
    pub effects: Vec<Effect>,
}

impl Step {
    /// Start a new conversation.
    pub fn start(state: ConversationState) -> Self {
        Self::with(Transition::Start(state))
    }

    /// Patch the current conversation.
    pub fn update(patch: StatePatch) -> Self {
        Self::with(Transition::Update(patch))
    }

    /// Leave the state untouched.
    pub fn keep() -> Self {
        Self::with(Transition::Keep)
    }

    fn with(transition: Transition) -> Self {
        Self {
            transition,
            effects: Vec::new(),
        }
    }

    /// Queue an untracked message.
    pub fn send(mut self, message: OutboundMessage) -> Self {
        self.effects.push(Effect::Send {
            message,
            track: None,
        });
        self
    }

    /// Queue a message whose delivery registers a mutation.
    pub fn send_tracked(
        mut self,
        message: OutboundMessage,
        action: MutationAction,
        defer_until_completion: bool,
    ) -> Self {
        self.effects.push(Effect::Send {
            message,
            track: Some(Tracking {
                action,
                defer_until_completion,
            }),
        });
        self
    }

    /// Queue an in-place edit.
    pub fn edit(mut self, message_id: MessageId, text: String, keyboard: Option<Keyboard>) -> Self {
        self.effects.push(Effect::Edit {
            message_id,
            text,
            keyboard,
        });
        self
    }

    /// Queue a mutation for an already delivered message.
    pub fn register(mut self, mutation: MessageMutation) -> Self {
        self.effects.push(Effect::Register(mutation));
        self
    }

    /// Queue an identity creation.
    pub fn create_identity(mut self, identity: NewIdentity) -> Self {
        self.effects.push(Effect::CreateIdentity(identity));
        self
    }

    /// Whether committing the step completes the conversation.
    pub fn completes(&self) -> bool {
        match &self.transition {
            Transition::Start(state) => state.is_complete,
            Transition::Update(patch) => patch.completes(),
            Transition::Keep => false,
        }
    }
}
