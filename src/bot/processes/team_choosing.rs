use futures::future::BoxFuture;
use indexmap::IndexMap;

use super::{Process, Turn, answered, main_menu};
use crate::{
    bot::{
        assignment::{
            describe_pairs, describe_team, draw_teams, first_round_pairs, substitution_available,
        },
        conversation::{
            ConversationState, MessageMutation, MutationAction, Payload, Phase, ProcessKind,
            StatePatch, TeamChoosingPayload, TeamChoosingPhase,
        },
        events::ButtonValue,
        step::Step,
        transport::{Button, Keyboard, OutboundMessage},
    },
    dao::models::{Country, StarRating, TeamEntity, TeamFilter, TeamId},
    error::{BotError, UnexpectedEvent},
    locale::{PhraseBundle, render},
};

/// Buttons per row in choice prompts.
const CHOICES_PER_ROW: usize = 2;

/// Draws a random team of the chosen rating for every player and lets the
/// group swap individual teams before confirming.
///
/// `EXPECT_PLAYERS_COUNT -> EXPECT_TEAM_RATING [-> EXPECT_TEAM_COUNTRY] ->
/// EXPECT_TEAMS_CONFIRM -> done`. The confirm phase is skipped when the pool is
/// too small to offer substitutions.
#[derive(Debug, Clone)]
pub struct TeamChoosing {
    max_players: u32,
    rating_tiers: Vec<StarRating>,
    ask_country: bool,
}

impl TeamChoosing {
    /// Process offering `1..=max_players` players and the given rating tiers.
    pub fn new(max_players: u32, rating_tiers: Vec<StarRating>, ask_country: bool) -> Self {
        Self {
            max_players: max_players.max(1),
            rating_tiers,
            ask_country,
        }
    }
}

impl Default for TeamChoosing {
    fn default() -> Self {
        Self::new(10, StarRating::all_tiers(), false)
    }
}

impl Process for TeamChoosing {
    fn kind(&self) -> ProcessKind {
        ProcessKind::TeamChoosing
    }

    fn advance<'a>(&'a self, turn: Turn<'a>) -> BoxFuture<'a, Result<Step, BotError>> {
        Box::pin(async move {
            let Some(state) = turn.state else {
                return Ok(self.start(&turn));
            };
            let Phase::TeamChoosing(phase) = state.phase else {
                return Err(BotError::InvalidState(format!(
                    "team choosing cannot handle phase {:?}",
                    state.phase
                )));
            };
            let payload = state.payload.as_team_choosing().ok_or_else(|| {
                BotError::InvalidState("team choosing state without its payload".into())
            })?;
            let value = turn.button_value()?;

            match phase {
                TeamChoosingPhase::ExpectPlayersCount => self.players_count(&turn, value),
                TeamChoosingPhase::ExpectTeamRating => {
                    self.team_rating(&turn, payload, value).await
                }
                TeamChoosingPhase::ExpectTeamCountry => {
                    self.team_country(&turn, payload, value).await
                }
                TeamChoosingPhase::ExpectTeamsConfirm => {
                    self.teams_confirm(&turn, state, payload, value).await
                }
            }
        })
    }
}

impl TeamChoosing {
    fn start(&self, turn: &Turn<'_>) -> Step {
        let phrases = turn.phrases;
        let buttons = (1..=self.max_players)
            .map(|count| Button::new(count.to_string(), ButtonValue::Number(count)))
            .collect();
        let state = ConversationState::new(
            turn.chat_id,
            Phase::TeamChoosing(TeamChoosingPhase::ExpectPlayersCount),
            Payload::TeamChoosing(TeamChoosingPayload::default()),
        )
        .awaiting_button_press(true);

        Step::start(state).send_tracked(
            OutboundMessage::text(&phrases.tc_players_count_request)
                .with_keyboard(Keyboard::inline_grid(buttons, CHOICES_PER_ROW)),
            MutationAction::ClearButtons,
            true,
        )
    }

    fn players_count(&self, turn: &Turn<'_>, value: ButtonValue) -> Result<Step, BotError> {
        let phrases = turn.phrases;
        let players = match value {
            ButtonValue::Number(count) if (1..=self.max_players).contains(&count) => count,
            other => return Err(UnexpectedEvent::UnknownButton(other.to_string()).into()),
        };
        let echo = echo(
            turn,
            &phrases.tc_players_count_request,
            &players.to_string(),
        )?;

        let buttons = self
            .rating_tiers
            .iter()
            .map(|rating| Button::new(rating_label(*rating), ButtonValue::Rating(*rating)))
            .collect();
        let patch = StatePatch::default()
            .phase(Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamRating))
            .payload(Payload::TeamChoosing(TeamChoosingPayload {
                players_count: Some(players),
                ..TeamChoosingPayload::default()
            }));

        Ok(Step::update(patch).register(echo).send_tracked(
            OutboundMessage::text(&phrases.tc_rating_request)
                .with_keyboard(Keyboard::inline_grid(buttons, CHOICES_PER_ROW)),
            MutationAction::ClearButtons,
            true,
        ))
    }

    async fn team_rating(
        &self,
        turn: &Turn<'_>,
        payload: &TeamChoosingPayload,
        value: ButtonValue,
    ) -> Result<Step, BotError> {
        let phrases = turn.phrases;
        let rating = match value {
            ButtonValue::Rating(rating) if self.rating_tiers.contains(&rating) => rating,
            other => return Err(UnexpectedEvent::UnknownButton(other.to_string()).into()),
        };
        let players = chosen_players(payload)?;
        let echo = echo(turn, &phrases.tc_rating_request, &rating_label(rating))?;

        if !self.ask_country {
            return assign(turn, players, rating, None, echo).await;
        }

        let mut buttons: Vec<Button> = Country::ALL
            .into_iter()
            .map(|country| Button::new(country.display_name(), ButtonValue::Country(Some(country))))
            .collect();
        buttons.push(Button::new(
            &phrases.tc_teams_country_never_mind_btn,
            ButtonValue::Country(None),
        ));
        let patch = StatePatch::default()
            .phase(Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamCountry))
            .payload(Payload::TeamChoosing(TeamChoosingPayload {
                rating: Some(rating),
                ..payload.clone()
            }));

        Ok(Step::update(patch).register(echo).send_tracked(
            OutboundMessage::text(&phrases.tc_teams_country_request)
                .with_keyboard(Keyboard::inline_grid(buttons, CHOICES_PER_ROW)),
            MutationAction::ClearButtons,
            true,
        ))
    }

    async fn team_country(
        &self,
        turn: &Turn<'_>,
        payload: &TeamChoosingPayload,
        value: ButtonValue,
    ) -> Result<Step, BotError> {
        let phrases = turn.phrases;
        let ButtonValue::Country(country) = value else {
            return Err(UnexpectedEvent::UnknownButton(value.to_string()).into());
        };
        let players = chosen_players(payload)?;
        let rating = payload
            .rating
            .ok_or_else(|| BotError::InvalidState("country chosen before rating".into()))?;
        let label = match country {
            Some(country) => country.display_name(),
            None => phrases.tc_teams_country_never_mind_btn.clone(),
        };
        let echo = echo(turn, &phrases.tc_teams_country_request, &label)?;

        assign(turn, players, rating, country, echo).await
    }

    async fn teams_confirm(
        &self,
        turn: &Turn<'_>,
        state: &ConversationState,
        payload: &TeamChoosingPayload,
        value: ButtonValue,
    ) -> Result<Step, BotError> {
        let phrases = turn.phrases;
        let player = match value {
            ButtonValue::ConfirmTeams => {
                return Ok(Step::update(StatePatch::default().complete()).send(
                    OutboundMessage::text(&phrases.tc_done)
                        .with_keyboard(main_menu(turn.identity.is_some(), phrases)),
                ));
            }
            ButtonValue::ChangeTeam(player) if payload.assignments.contains_key(&player) => player,
            other => return Err(UnexpectedEvent::UnknownButton(other.to_string()).into()),
        };

        let mut reservations = state.pending_reservation_ids.clone().unwrap_or_default();
        if reservations.is_empty() {
            return Ok(Step::keep().send(OutboundMessage::text(&phrases.tc_no_more_teams)));
        }

        let drawn = {
            let mut rng = rand::rng();
            draw_teams(&mut reservations, 1, &mut rng)
        };
        let Some(replacement) = drawn.into_iter().next() else {
            return Ok(Step::keep().send(OutboundMessage::text(&phrases.tc_no_more_teams)));
        };
        let team = fetch_team(turn, replacement).await?;
        let message_id = turn
            .event
            .message_id()
            .ok_or_else(|| BotError::InvalidState("button event without a message".into()))?;

        let mut assignments = payload.assignments.clone();
        assignments.insert(player, replacement);
        let patch = StatePatch::default()
            .payload(Payload::TeamChoosing(TeamChoosingPayload {
                assignments,
                ..payload.clone()
            }))
            .reservations(Some(reservations));

        Ok(Step::update(patch).edit(
            message_id,
            describe_team(phrases, player, &team),
            Some(substitution_keyboard(phrases, player)),
        ))
    }
}

/// Draw a team per player and present the result.
async fn assign(
    turn: &Turn<'_>,
    players: u32,
    rating: StarRating,
    country: Option<Country>,
    echo: MessageMutation,
) -> Result<Step, BotError> {
    let phrases = turn.phrases;
    let menu = main_menu(turn.identity.is_some(), phrases);
    let mut pool = turn.store.query_teams(TeamFilter { rating, country }).await?;

    if pool.len() < players as usize {
        let text = render(
            &phrases.tc_not_enough_teams,
            &[
                ("available", &pool.len().to_string()),
                ("players", &players.to_string()),
            ],
        );
        return Ok(Step::update(StatePatch::default().complete())
            .register(echo)
            .send(OutboundMessage::text(text).with_keyboard(menu)));
    }

    let offer = substitution_available(pool.len(), players);
    let (drawn, pairs) = {
        let mut rng = rand::rng();
        let drawn = draw_teams(&mut pool, players as usize, &mut rng);
        (drawn, first_round_pairs(players, &mut rng))
    };

    let mut teams = Vec::with_capacity(drawn.len());
    for (player, id) in (1..=players).zip(drawn) {
        teams.push((player, fetch_team(turn, id).await?));
    }
    let assignments: IndexMap<u32, TeamId> =
        teams.iter().map(|(player, team)| (*player, team.id)).collect();

    let patch = if offer {
        StatePatch::default()
            .phase(Phase::TeamChoosing(TeamChoosingPhase::ExpectTeamsConfirm))
            .awaiting_button_press(true)
            .payload(Payload::TeamChoosing(TeamChoosingPayload {
                players_count: Some(players),
                rating: Some(rating),
                assignments,
            }))
            .reservations(Some(pool))
    } else {
        StatePatch::default().complete()
    };

    let mut step = Step::update(patch).register(echo);
    for (player, team) in &teams {
        let message = OutboundMessage::text(describe_team(phrases, *player, team));
        step = if offer {
            step.send_tracked(
                message.with_keyboard(substitution_keyboard(phrases, *player)),
                MutationAction::ClearButtons,
                true,
            )
        } else {
            step.send(message)
        };
    }
    if let Some(pairs) = pairs {
        step = step.send(OutboundMessage::text(describe_pairs(phrases, &pairs)));
    }
    if !offer {
        step = step.send(OutboundMessage::text(&phrases.tc_done).with_keyboard(menu));
    }

    Ok(step)
}

async fn fetch_team(turn: &Turn<'_>, id: TeamId) -> Result<TeamEntity, BotError> {
    turn.store
        .get_team(id)
        .await?
        .ok_or_else(|| BotError::InvalidState(format!("team {id} vanished from the catalog")))
}

fn chosen_players(payload: &TeamChoosingPayload) -> Result<u32, BotError> {
    payload
        .players_count
        .ok_or_else(|| BotError::InvalidState("player count missing from payload".into()))
}

/// Rewrite the answered prompt so it shows the choice and loses its buttons.
fn echo(turn: &Turn<'_>, prompt: &str, answer: &str) -> Result<MessageMutation, BotError> {
    let message_id = turn
        .event
        .message_id()
        .ok_or_else(|| BotError::InvalidState("button event without a message".into()))?;
    Ok(MessageMutation::immediate(
        message_id,
        MutationAction::ReplaceText(answered(turn.phrases, prompt, answer)),
    ))
}

fn rating_label(rating: StarRating) -> String {
    format!("{rating} ★")
}

fn substitution_keyboard(phrases: &PhraseBundle, player: u32) -> Keyboard {
    Keyboard::inline_grid(
        vec![
            Button::new(
                render(
                    &phrases.tc_change_team_btn,
                    &[("player_number", &player.to_string())],
                ),
                ButtonValue::ChangeTeam(player),
            ),
            Button::new(&phrases.tc_confirm_teams_btn, ButtonValue::ConfirmTeams),
        ],
        1,
    )
}
