use std::time::SystemTime;

use indexmap::IndexMap;

use crate::{
    bot::events::{ChatId, MessageId},
    dao::models::{StarRating, TeamId},
};

/// Conversation flows the bot knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    /// Identity registration.
    Registration,
    /// Random team assignment for a group of players.
    TeamChoosing,
}

impl ProcessKind {
    /// Every process kind, in registration order.
    pub const ALL: [ProcessKind; 2] = [ProcessKind::Registration, ProcessKind::TeamChoosing];

    /// Stable tag used as the dispatch key once a conversation is in flight.
    pub fn tag(&self) -> &'static str {
        match self {
            ProcessKind::Registration => "REGISTRATION",
            ProcessKind::TeamChoosing => "TEAM_CHOOSING",
        }
    }
}

/// Steps of the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPhase {
    /// Waiting for the user to type a nickname.
    ExpectNickname,
    /// Waiting for the yes/no confirmation of the nickname.
    ExpectConfirm,
}

/// Steps of the team-choosing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamChoosingPhase {
    /// Waiting for the player count button.
    ExpectPlayersCount,
    /// Waiting for the rating tier button.
    ExpectTeamRating,
    /// Waiting for the country button (only when country filtering is enabled).
    ExpectTeamCountry,
    /// Teams were drawn; waiting for change requests or the final confirmation.
    ExpectTeamsConfirm,
}

/// Current step, scoped to the process that owns the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A registration step.
    Registration(RegistrationPhase),
    /// A team-choosing step.
    TeamChoosing(TeamChoosingPhase),
}

impl Phase {
    /// Stable tag of the phase, e.g. `EXPECT_NICKNAME`.
    pub fn tag(&self) -> &'static str {
        match self {
            Phase::Registration(RegistrationPhase::ExpectNickname) => "EXPECT_NICKNAME",
            Phase::Registration(RegistrationPhase::ExpectConfirm) => "EXPECT_CONFIRM",
            Phase::TeamChoosing(TeamChoosingPhase::ExpectPlayersCount) => "EXPECT_PLAYERS_COUNT",
            Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamRating) => "EXPECT_TEAM_RATING",
            Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamCountry) => "EXPECT_TEAM_COUNTRY",
            Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamsConfirm) => "EXPECT_TEAMS_CONFIRM",
        }
    }

    /// Process owning this phase.
    pub fn process_kind(&self) -> ProcessKind {
        match self {
            Phase::Registration(_) => ProcessKind::Registration,
            Phase::TeamChoosing(_) => ProcessKind::TeamChoosing,
        }
    }
}

/// Data the registration flow carries between phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationPayload {
    /// Nickname awaiting confirmation.
    pub nickname: Option<String>,
}

/// Data the team-choosing flow carries between phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamChoosingPayload {
    /// Number of players, once chosen.
    pub players_count: Option<u32>,
    /// Rating tier, once chosen.
    pub rating: Option<StarRating>,
    /// Team currently assigned to each player number.
    pub assignments: IndexMap<u32, TeamId>,
}

/// Per-process payload, one variant per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Registration data.
    Registration(RegistrationPayload),
    /// Team-choosing data.
    TeamChoosing(TeamChoosingPayload),
}

impl Payload {
    /// Borrow the registration payload, if this is one.
    pub fn as_registration(&self) -> Option<&RegistrationPayload> {
        match self {
            Payload::Registration(payload) => Some(payload),
            _ => None,
        }
    }

    /// Borrow the team-choosing payload, if this is one.
    pub fn as_team_choosing(&self) -> Option<&TeamChoosingPayload> {
        match self {
            Payload::TeamChoosing(payload) => Some(payload),
            _ => None,
        }
    }
}

/// What to do with a previously sent message.
///
/// `ReplaceText` edits the text without a keyboard, so it also removes any
/// buttons the message had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationAction {
    /// Delete the message.
    RemoveMessage,
    /// Drop the inline keyboard, keep the text.
    ClearButtons,
    /// Replace the text (and drop the keyboard).
    ReplaceText(String),
}

/// Deferred instruction to alter a message that is still live in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMutation {
    /// Target message.
    pub message_id: MessageId,
    /// Change to apply.
    pub action: MutationAction,
    /// Only apply once the owning conversation is complete.
    pub defer_until_completion: bool,
}

impl MessageMutation {
    /// Mutation applied on the next sweep.
    pub fn immediate(message_id: MessageId, action: MutationAction) -> Self {
        Self {
            message_id,
            action,
            defer_until_completion: false,
        }
    }

    /// Mutation held back until the conversation completes.
    pub fn on_completion(message_id: MessageId, action: MutationAction) -> Self {
        Self {
            message_id,
            action,
            defer_until_completion: true,
        }
    }

    /// Whether a sweep may apply this mutation now.
    pub fn is_due(&self, conversation_complete: bool) -> bool {
        !self.defer_until_completion || conversation_complete
    }
}

/// State of the single in-flight conversation of a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    /// Owning chat.
    pub chat_id: ChatId,
    /// Current step; also identifies the owning process.
    pub phase: Phase,
    /// The next valid event must be a button press.
    pub awaiting_button_press: bool,
    /// Process data carried between phases.
    pub payload: Payload,
    /// Records held back for later substitution.
    pub pending_reservation_ids: Option<Vec<TeamId>>,
    /// Pending changes to previously sent messages, keyed by message id.
    pub message_mutations: IndexMap<MessageId, MessageMutation>,
    /// The process reached its terminal step.
    pub is_complete: bool,
    /// Last time the state was created or changed.
    pub updated_at: SystemTime,
}

impl ConversationState {
    /// Fresh state at the given phase with no pending mutations.
    pub fn new(chat_id: ChatId, phase: Phase, payload: Payload) -> Self {
        Self {
            chat_id,
            phase,
            awaiting_button_press: false,
            payload,
            pending_reservation_ids: None,
            message_mutations: IndexMap::new(),
            is_complete: false,
            updated_at: SystemTime::now(),
        }
    }

    /// Builder-style setter for [`ConversationState::awaiting_button_press`].
    pub fn awaiting_button_press(mut self, awaiting: bool) -> Self {
        self.awaiting_button_press = awaiting;
        self
    }

    /// Process owning the conversation.
    pub fn process_kind(&self) -> ProcessKind {
        self.phase.process_kind()
    }

    /// Merge the fields present in `patch`, leaving everything else untouched.
    pub fn apply(&mut self, patch: StatePatch) {
        let StatePatch {
            phase,
            awaiting_button_press,
            payload,
            pending_reservation_ids,
            is_complete,
        } = patch;

        if let Some(phase) = phase {
            self.phase = phase;
        }
        if let Some(awaiting) = awaiting_button_press {
            self.awaiting_button_press = awaiting;
        }
        if let Some(payload) = payload {
            self.payload = payload;
        }
        if let Some(reservations) = pending_reservation_ids {
            self.pending_reservation_ids = reservations;
        }
        if let Some(complete) = is_complete {
            self.is_complete = complete;
        }
        self.updated_at = SystemTime::now();
    }
}

/// Partial update of a [`ConversationState`]; `None` fields are preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    /// New phase.
    pub phase: Option<Phase>,
    /// New button expectation.
    pub awaiting_button_press: Option<bool>,
    /// New payload.
    pub payload: Option<Payload>,
    /// New reservation list (`Some(None)` clears it).
    pub pending_reservation_ids: Option<Option<Vec<TeamId>>>,
    /// New completion flag.
    pub is_complete: Option<bool>,
}

impl StatePatch {
    /// Move to `phase`.
    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Set whether a button press is expected next.
    pub fn awaiting_button_press(mut self, awaiting: bool) -> Self {
        self.awaiting_button_press = Some(awaiting);
        self
    }

    /// Replace the payload.
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Replace the reservation list.
    pub fn reservations(mut self, reservations: Option<Vec<TeamId>>) -> Self {
        self.pending_reservation_ids = Some(reservations);
        self
    }

    /// Mark the conversation as complete.
    pub fn complete(mut self) -> Self {
        self.is_complete = Some(true);
        self
    }

    /// Whether applying the patch completes the conversation.
    pub fn completes(&self) -> bool {
        self.is_complete == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration_state() -> ConversationState {
        ConversationState::new(
            1,
            Phase::Registration(RegistrationPhase::ExpectNickname),
            Payload::Registration(RegistrationPayload::default()),
        )
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut state = registration_state().awaiting_button_press(true);
        state.message_mutations.insert(
            10,
            MessageMutation::immediate(10, MutationAction::ClearButtons),
        );

        state.apply(StatePatch::default().phase(Phase::Registration(RegistrationPhase::ExpectConfirm)));

        assert_eq!(
            state.phase,
            Phase::Registration(RegistrationPhase::ExpectConfirm)
        );
        assert!(state.awaiting_button_press);
        assert_eq!(state.message_mutations.len(), 1);
        assert!(!state.is_complete);
    }

    #[test]
    fn patch_can_reset_flags_to_false() {
        let mut state = registration_state().awaiting_button_press(true);
        state.apply(StatePatch::default().awaiting_button_press(false));
        assert!(!state.awaiting_button_press);
    }

    #[test]
    fn deferred_mutations_wait_for_completion() {
        let deferred = MessageMutation::on_completion(4, MutationAction::ClearButtons);
        let immediate = MessageMutation::immediate(5, MutationAction::RemoveMessage);

        assert!(!deferred.is_due(false));
        assert!(deferred.is_due(true));
        assert!(immediate.is_due(false));
    }

    #[test]
    fn phase_identifies_owning_process() {
        assert_eq!(
            Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamRating).process_kind(),
            ProcessKind::TeamChoosing
        );
        assert_eq!(registration_state().process_kind().tag(), "REGISTRATION");
    }
}
