use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use tournament_bot::{
    bot::{
        conversation::ProcessKind,
        events::{ButtonEvent, ButtonValue, ChatId, Choice, MessageId, Sender, TextEvent},
        processes::{Process, Registration, TeamChoosing},
        registry::ProcessRegistry,
        router::{EventOutcome, EventRouter},
        transport::{Keyboard, OutboundMessage, Transport, TransportError, TransportResult},
    },
    dao::{
        bot_store::IdentityStore,
        memory::{InMemoryStore, sample_catalog},
        models::{Country, NewIdentity, StarRating, TeamEntity, TeamId},
    },
    locale::LocaleRegistry,
};

const CHAT: ChatId = 42;

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Send {
        id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Clear(MessageId),
    Delete(MessageId),
}

#[derive(Default)]
struct RecordingTransport {
    log: Mutex<Vec<Action>>,
    last_id: Mutex<MessageId>,
    reject_send: Mutex<Option<MessageId>>,
}

impl RecordingTransport {
    /// Reject the send that would be assigned `id`, once.
    fn reject_send(&self, id: MessageId) {
        *self.reject_send.lock().unwrap() = Some(id);
    }

    fn drain(&self) -> Vec<Action> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    fn push(&self, action: Action) {
        self.log.lock().unwrap().push(action);
    }

    fn known(&self, id: MessageId) -> TransportResult<()> {
        if (1..=*self.last_id.lock().unwrap()).contains(&id) {
            Ok(())
        } else {
            Err(TransportError::MessageGone { message_id: id })
        }
    }
}

impl Transport for RecordingTransport {
    fn send_text(
        &self,
        _chat_id: ChatId,
        message: OutboundMessage,
    ) -> BoxFuture<'_, TransportResult<MessageId>> {
        Box::pin(async move {
            let id = {
                let mut last_id = self.last_id.lock().unwrap();
                let mut reject = self.reject_send.lock().unwrap();
                if *reject == Some(*last_id + 1) {
                    *reject = None;
                    return Err(TransportError::Rejected("chat is unreachable".into()));
                }
                *last_id += 1;
                *last_id
            };
            self.push(Action::Send {
                id,
                text: message.text,
                keyboard: message.keyboard,
            });
            Ok(id)
        })
    }

    fn edit_text(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.known(message_id)?;
            self.push(Action::Edit {
                id: message_id,
                text,
                keyboard,
            });
            Ok(())
        })
    }

    fn clear_buttons(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
    ) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.known(message_id)?;
            self.push(Action::Clear(message_id));
            Ok(())
        })
    }

    fn delete_message(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
    ) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.known(message_id)?;
            self.push(Action::Delete(message_id));
            Ok(())
        })
    }
}

struct Harness {
    router: EventRouter,
    transport: Arc<RecordingTransport>,
    store: InMemoryStore,
}

impl Harness {
    fn new() -> Self {
        Self::with(TeamChoosing::default(), InMemoryStore::with_teams(sample_catalog()))
    }

    fn with(team_choosing: TeamChoosing, store: InMemoryStore) -> Self {
        let locales = Arc::new(LocaleRegistry::builtin("en"));
        let transport = Arc::new(RecordingTransport::default());
        let processes: Vec<Arc<dyn Process>> =
            vec![Arc::new(Registration), Arc::new(team_choosing)];
        let registry = ProcessRegistry::new(processes, &locales);
        Self {
            router: EventRouter::new(registry, transport.clone(), locales),
            transport,
            store,
        }
    }

    async fn text(&self, text: &str) -> EventOutcome {
        let event = TextEvent {
            chat_id: CHAT,
            sender: sender(),
            text: text.to_owned(),
        };
        self.router.handle_message(&self.store, &event).await
    }

    async fn press(&self, message_id: MessageId, value: ButtonValue) -> EventOutcome {
        let event = ButtonEvent {
            chat_id: CHAT,
            sender: sender(),
            message_id,
            value: value.to_string(),
        };
        self.router.handle_button_press(&self.store, &event).await
    }
}

fn sender() -> Sender {
    Sender {
        handle: "neo".into(),
        user_id: Some(7),
        full_name: "Thomas Anderson".into(),
        language_code: Some("en-US".into()),
    }
}

fn sent(actions: &[Action]) -> Vec<(MessageId, &str, bool)> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::Send { id, text, keyboard } => Some((
                *id,
                text.as_str(),
                keyboard.as_ref().is_some_and(Keyboard::is_inline),
            )),
            _ => None,
        })
        .collect()
}

fn five_stars() -> StarRating {
    StarRating::from_half_stars(10).unwrap()
}

fn advanced(process: ProcessKind, completed: bool) -> EventOutcome {
    EventOutcome::Advanced { process, completed }
}

fn transport_failure() -> EventOutcome {
    EventOutcome::Failed {
        reason: "transport failure".into(),
    }
}

fn asking_country() -> TeamChoosing {
    TeamChoosing::new(10, StarRating::all_tiers(), true)
}

fn team(name: &str, country: Country) -> TeamEntity {
    TeamEntity {
        id: TeamId::new_v4(),
        name: name.into(),
        league: "Test League".into(),
        country: Some(country),
        rating: five_stars(),
        attack: 80,
        midfield: 80,
        defense: 80,
        general: 80,
    }
}

#[tokio::test]
async fn registration_confirms_and_stores_the_identity() {
    let bot = Harness::new();

    assert_eq!(
        bot.text("/start-registration").await,
        advanced(ProcessKind::Registration, false)
    );
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions),
        vec![(1, "Send me the nickname you want to play under.", false)]
    );

    assert_eq!(
        bot.text("  Neo ").await,
        advanced(ProcessKind::Registration, false)
    );
    let actions = bot.transport.drain();
    assert_eq!(sent(&actions), vec![(2, "Register as Neo?", true)]);
    let state = bot.router.states().get(CHAT).unwrap();
    assert!(state.awaiting_button_press);
    assert_eq!(state.message_mutations.len(), 1);

    assert_eq!(
        bot.press(2, ButtonValue::Answer(Choice::Yes)).await,
        advanced(ProcessKind::Registration, true)
    );
    let actions = bot.transport.drain();
    assert!(actions.contains(&Action::Edit {
        id: 2,
        text: "Register as Neo?\n\nAnswer: Yes".into(),
        keyboard: None,
    }));
    assert_eq!(
        sent(&actions),
        vec![
            (3, "Done! You are registered as Neo.", false),
            (4, "You can now generate teams from the menu.", false),
        ]
    );
    assert!(bot.router.states().get(CHAT).is_none());
    assert_eq!(bot.store.identity_count(), 1);

    assert_eq!(
        bot.text("Register").await,
        advanced(ProcessKind::Registration, false)
    );
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions),
        vec![(5, "You are already registered as Neo.", false)]
    );
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn answering_no_asks_for_another_nickname() {
    let bot = Harness::new();
    bot.text("/start-registration").await;
    bot.text("Neo").await;
    bot.transport.drain();

    assert_eq!(
        bot.press(2, ButtonValue::Answer(Choice::No)).await,
        advanced(ProcessKind::Registration, false)
    );
    let actions = bot.transport.drain();
    assert_eq!(
        actions,
        vec![
            Action::Send {
                id: 3,
                text: "Alright, send me another nickname.".into(),
                keyboard: None,
            },
            Action::Edit {
                id: 2,
                text: "Register as Neo?\n\nAnswer: No".into(),
                keyboard: None,
            },
        ]
    );

    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_NICKNAME");
    assert!(!state.awaiting_button_press);
    assert!(state.message_mutations.is_empty());
}

#[tokio::test]
async fn taken_nickname_is_refused() {
    let bot = Harness::new();
    bot.store
        .create_identity(NewIdentity {
            handle: "trinity".into(),
            nickname: "Neo".into(),
            full_name: "Trinity".into(),
            user_id: None,
            chat_id: 1,
        })
        .await
        .unwrap();

    bot.text("/start-registration").await;
    bot.text("Neo").await;
    let actions = bot.transport.drain();

    assert_eq!(
        sent(&actions).last().map(|(_, text, _)| *text),
        Some("The nickname Neo is already taken. Try another one.")
    );
    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_NICKNAME");
}

#[tokio::test]
async fn failed_confirmation_reply_keeps_the_state_and_can_be_retried() {
    let bot = Harness::new();
    bot.text("/start-registration").await;
    bot.text("Neo").await;
    bot.transport.drain();
    let before = bot.router.states().get(CHAT).unwrap();

    bot.transport.reject_send(3);
    assert_eq!(
        bot.press(2, ButtonValue::Answer(Choice::Yes)).await,
        transport_failure()
    );
    assert_eq!(bot.router.states().get(CHAT).unwrap(), before);
    assert_eq!(bot.store.identity_count(), 0);
    assert!(sent(&bot.transport.drain()).is_empty());

    assert_eq!(
        bot.press(2, ButtonValue::Answer(Choice::Yes)).await,
        advanced(ProcessKind::Registration, true)
    );
    assert_eq!(
        sent(&bot.transport.drain()),
        vec![
            (3, "Done! You are registered as Neo.", false),
            (4, "You can now generate teams from the menu.", false),
        ]
    );
    assert_eq!(bot.store.identity_count(), 1);
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn confirmation_after_the_identity_was_stored_completes() {
    let bot = Harness::new();
    bot.text("/start-registration").await;
    bot.text("Neo").await;
    bot.transport.drain();
    bot.store
        .create_identity(NewIdentity {
            handle: "neo".into(),
            nickname: "Neo".into(),
            full_name: "Thomas Anderson".into(),
            user_id: Some(7),
            chat_id: CHAT,
        })
        .await
        .unwrap();

    assert_eq!(
        bot.press(2, ButtonValue::Answer(Choice::Yes)).await,
        advanced(ProcessKind::Registration, true)
    );
    assert_eq!(
        sent(&bot.transport.drain()),
        vec![
            (3, "Done! You are registered as Neo.", false),
            (4, "You can now generate teams from the menu.", false),
        ]
    );
    assert_eq!(bot.store.identity_count(), 1);
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn failed_draw_message_keeps_the_state() {
    let bot = Harness::new();
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(3)).await;
    bot.transport.drain();
    let before = bot.router.states().get(CHAT).unwrap();

    bot.transport.reject_send(3);
    assert_eq!(
        bot.press(2, ButtonValue::Rating(five_stars())).await,
        transport_failure()
    );
    assert_eq!(bot.router.states().get(CHAT).unwrap(), before);
    assert_eq!(before.phase.tag(), "EXPECT_TEAM_RATING");
    assert!(bot.transport.drain().is_empty());

    assert_eq!(
        bot.press(2, ButtonValue::Rating(five_stars())).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_TEAMS_CONFIRM");
}

#[tokio::test]
async fn stale_button_is_rejected_without_creating_state() {
    let bot = Harness::new();

    assert_eq!(
        bot.press(99, ButtonValue::ConfirmTeams).await,
        EventOutcome::WrongButton
    );
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions),
        vec![(
            1,
            "This button is no longer active. Please use the latest message.",
            false
        )]
    );
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn unknown_text_gets_a_fallback_with_the_menu() {
    let bot = Harness::new();

    assert_eq!(bot.text("what is this").await, EventOutcome::Fallback);
    let actions = bot.transport.drain();
    let [Action::Send { text, keyboard, .. }] = actions.as_slice() else {
        panic!("expected a single message, got {actions:?}");
    };
    assert!(LocaleRegistry::builtin("en")
        .default_bundle()
        .fallback
        .contains(text));
    let Some(Keyboard::Reply { rows, .. }) = keyboard else {
        panic!("expected the main menu");
    };
    assert_eq!(
        rows,
        &vec![vec!["Generate teams".to_owned()], vec!["Register".to_owned()]]
    );
}

#[tokio::test]
async fn text_while_awaiting_a_button_leaves_the_state_alone() {
    let bot = Harness::new();
    bot.text("/generate-teams").await;
    let before = bot.router.states().get(CHAT).unwrap();
    bot.transport.drain();

    assert_eq!(bot.text("3").await, EventOutcome::UnexpectedText);
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions),
        vec![(2, "Please answer by pressing one of the buttons above.", false)]
    );
    assert_eq!(bot.router.states().get(CHAT).unwrap(), before);
}

#[tokio::test]
async fn button_from_another_step_is_rejected() {
    let bot = Harness::new();
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(3)).await;
    let before = bot.router.states().get(CHAT).unwrap();
    bot.transport.drain();

    assert_eq!(
        bot.press(2, ButtonValue::Number(3)).await,
        EventOutcome::WrongButton
    );
    assert_eq!(bot.router.states().get(CHAT).unwrap(), before);
}

#[tokio::test]
async fn small_draw_offers_substitutions_until_confirmed() {
    let bot = Harness::new();

    bot.text("Generate teams").await;
    assert_eq!(
        bot.press(1, ButtonValue::Number(3)).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    bot.transport.drain();

    assert_eq!(
        bot.press(2, ButtonValue::Rating(five_stars())).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    let actions = bot.transport.drain();
    assert!(actions.contains(&Action::Edit {
        id: 2,
        text: "Which team rating?\n\nAnswer: 5.0 ★".into(),
        keyboard: None,
    }));
    let messages = sent(&actions);
    assert_eq!(messages.len(), 4);
    assert!(messages[..3].iter().all(|(_, _, inline)| *inline));
    assert!(messages[0].1.starts_with("Player 1: "));
    assert!(messages[3].1.starts_with("First round:\n"));
    assert_eq!(messages[3].1.lines().count(), 4);

    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_TEAMS_CONFIRM");
    assert_eq!(state.pending_reservation_ids.as_ref().map(Vec::len), Some(4));
    let first_team = state.payload.as_team_choosing().unwrap().assignments[&1];
    let first_message = messages[0].0;

    assert_eq!(
        bot.press(first_message, ButtonValue::ChangeTeam(1)).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    let actions = bot.transport.drain();
    let [Action::Edit { id, text, keyboard }] = actions.as_slice() else {
        panic!("expected one edit, got {actions:?}");
    };
    assert_eq!(*id, first_message);
    assert!(text.starts_with("Player 1: "));
    assert!(keyboard.as_ref().is_some_and(Keyboard::is_inline));

    let state = bot.router.states().get(CHAT).unwrap();
    let assignments = &state.payload.as_team_choosing().unwrap().assignments;
    assert_ne!(assignments[&1], first_team);
    assert_ne!(assignments[&1], assignments[&2]);
    assert_ne!(assignments[&1], assignments[&3]);
    assert_eq!(state.pending_reservation_ids.as_ref().map(Vec::len), Some(3));

    assert_eq!(
        bot.press(first_message, ButtonValue::ConfirmTeams).await,
        advanced(ProcessKind::TeamChoosing, true)
    );
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions).first().map(|(_, text, _)| *text),
        Some("Teams are set. Have a good game!")
    );
    let cleared: Vec<MessageId> = actions
        .iter()
        .filter_map(|action| match action {
            Action::Clear(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(cleared, messages[..3].iter().map(|(id, _, _)| *id).collect::<Vec<_>>());
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn large_draw_completes_without_substitutions() {
    let bot = Harness::new();
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(4)).await;
    bot.transport.drain();

    assert_eq!(
        bot.press(2, ButtonValue::Rating(five_stars())).await,
        advanced(ProcessKind::TeamChoosing, true)
    );
    let actions = bot.transport.drain();
    let messages = sent(&actions);
    assert_eq!(messages.len(), 6);
    assert!(messages.iter().all(|(_, _, inline)| !inline));
    assert_eq!(messages[5].1, "Teams are set. Have a good game!");
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn too_small_pool_ends_the_conversation() {
    let bot = Harness::new();
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(8)).await;
    bot.transport.drain();

    assert_eq!(
        bot.press(2, ButtonValue::Rating(five_stars())).await,
        advanced(ProcessKind::TeamChoosing, true)
    );
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions),
        vec![(
            3,
            "Only 7 team(s) match, 8 are needed. Try another rating.",
            false
        )]
    );
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn idle_conversations_expire() {
    let bot = Harness::new();
    bot.text("/start-registration").await;
    assert_eq!(bot.router.expire_idle(Duration::from_secs(60)), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(bot.router.expire_idle(Duration::from_millis(1)), 1);
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn country_choice_narrows_the_draw() {
    let bot = Harness::with(asking_country(), InMemoryStore::with_teams(sample_catalog()));
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(1)).await;
    bot.transport.drain();

    assert_eq!(
        bot.press(2, ButtonValue::Rating(five_stars())).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    let actions = bot.transport.drain();
    let messages = sent(&actions);
    let [(prompt, text, true)] = messages[..] else {
        panic!("expected the country prompt, got {actions:?}");
    };
    assert_eq!(text, "Teams from which country?");
    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_TEAM_COUNTRY");
    assert!(state.awaiting_button_press);

    assert_eq!(
        bot.press(prompt, ButtonValue::Country(Some(Country::Spain))).await,
        advanced(ProcessKind::TeamChoosing, true)
    );
    let actions = bot.transport.drain();
    assert!(actions.contains(&Action::Edit {
        id: prompt,
        text: "Teams from which country?\n\nAnswer: Spain".into(),
        keyboard: None,
    }));
    let messages = sent(&actions);
    assert_eq!(messages.len(), 2, "{actions:?}");
    assert!(messages[0].1.starts_with("Player 1: "));
    assert!(messages[0].1.contains("Real Madrid") || messages[0].1.contains("FC Barcelona"));
    assert_eq!(messages[1].1, "Teams are set. Have a good game!");
    assert!(bot.router.states().is_empty());
}

#[tokio::test]
async fn never_mind_draws_from_every_country() {
    let bot = Harness::with(asking_country(), InMemoryStore::with_teams(sample_catalog()));
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(1)).await;
    bot.press(2, ButtonValue::Rating(five_stars())).await;
    bot.transport.drain();

    assert_eq!(
        bot.press(3, ButtonValue::Country(None)).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    let actions = bot.transport.drain();
    assert!(actions.contains(&Action::Edit {
        id: 3,
        text: "Teams from which country?\n\nAnswer: Never mind".into(),
        keyboard: None,
    }));
    assert_eq!(sent(&actions).len(), 1);

    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_TEAMS_CONFIRM");
    assert_eq!(state.pending_reservation_ids.as_ref().map(Vec::len), Some(6));
}

#[tokio::test]
async fn running_out_of_reservations_keeps_the_confirmation_open() {
    let store = InMemoryStore::with_teams([
        team("Alpha", Country::England),
        team("Bravo", Country::Spain),
        team("Charlie", Country::Italy),
    ]);
    let bot = Harness::with(asking_country(), store);
    bot.text("/generate-teams").await;
    bot.press(1, ButtonValue::Number(1)).await;
    bot.press(2, ButtonValue::Rating(five_stars())).await;
    bot.press(3, ButtonValue::Country(None)).await;
    let actions = bot.transport.drain();
    let messages = sent(&actions);
    let [(team_message, _, true)] = messages[..] else {
        panic!("expected one team message with buttons, got {actions:?}");
    };
    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.pending_reservation_ids.as_ref().map(Vec::len), Some(2));

    for left in [1, 0] {
        assert_eq!(
            bot.press(team_message, ButtonValue::ChangeTeam(1)).await,
            advanced(ProcessKind::TeamChoosing, false)
        );
        let actions = bot.transport.drain();
        assert!(matches!(actions.as_slice(), [Action::Edit { id, .. }] if *id == team_message));
        let state = bot.router.states().get(CHAT).unwrap();
        assert_eq!(state.pending_reservation_ids.as_ref().map(Vec::len), Some(left));
    }

    assert_eq!(
        bot.press(team_message, ButtonValue::ChangeTeam(1)).await,
        advanced(ProcessKind::TeamChoosing, false)
    );
    let actions = bot.transport.drain();
    assert_eq!(
        sent(&actions),
        vec![(team_message + 1, "There are no more teams left to swap in.", false)]
    );
    let state = bot.router.states().get(CHAT).unwrap();
    assert_eq!(state.phase.tag(), "EXPECT_TEAMS_CONFIRM");
    assert!(state.awaiting_button_press);

    assert_eq!(
        bot.press(team_message, ButtonValue::ConfirmTeams).await,
        advanced(ProcessKind::TeamChoosing, true)
    );
}
