use futures::future::BoxFuture;

use super::{Process, Turn, answered, main_menu};
use crate::{
    bot::{
        conversation::{
            ConversationState, MessageMutation, MutationAction, Payload, Phase, ProcessKind,
            RegistrationPayload, RegistrationPhase, StatePatch,
        },
        events::{ButtonValue, Choice},
        step::Step,
        transport::{Button, Keyboard, OutboundMessage},
    },
    dao::models::NewIdentity,
    error::{BotError, UnexpectedEvent},
    locale::render,
};

/// Longest accepted nickname, in characters.
const MAX_NICKNAME_CHARS: usize = 64;

/// Registers the sender under a unique nickname.
///
/// `EXPECT_NICKNAME -> EXPECT_CONFIRM -> done`; answering "no" loops back.
#[derive(Debug, Default)]
pub struct Registration;

impl Process for Registration {
    fn kind(&self) -> ProcessKind {
        ProcessKind::Registration
    }

    fn advance<'a>(&'a self, turn: Turn<'a>) -> BoxFuture<'a, Result<Step, BotError>> {
        Box::pin(async move {
            let Some(state) = turn.state else {
                return Ok(start(&turn));
            };

            match state.phase {
                Phase::Registration(RegistrationPhase::ExpectNickname) => {
                    expect_nickname(&turn).await
                }
                Phase::Registration(RegistrationPhase::ExpectConfirm) => {
                    expect_confirm(&turn, state).await
                }
                other => Err(BotError::InvalidState(format!(
                    "registration cannot handle phase {other:?}"
                ))),
            }
        })
    }
}

fn start(turn: &Turn<'_>) -> Step {
    let phrases = turn.phrases;
    if let Some(identity) = turn.identity {
        let text = render(
            &phrases.reg_already_registered,
            &[("nickname", &identity.nickname)],
        );
        return Step::keep()
            .send(OutboundMessage::text(text).with_keyboard(main_menu(true, phrases)));
    }

    let state = ConversationState::new(
        turn.chat_id,
        Phase::Registration(RegistrationPhase::ExpectNickname),
        Payload::Registration(RegistrationPayload::default()),
    );
    Step::start(state).send(OutboundMessage::text(&phrases.reg_nickname_request))
}

async fn expect_nickname(turn: &Turn<'_>) -> Result<Step, BotError> {
    let phrases = turn.phrases;
    let nickname = turn.text()?.trim();

    if nickname.is_empty() || nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Ok(Step::keep().send(OutboundMessage::text(&phrases.reg_nickname_invalid)));
    }

    if turn.store.exists_by_nickname(nickname.to_owned()).await? {
        let text = render(&phrases.reg_nickname_in_use, &[("nickname", nickname)]);
        return Ok(Step::keep().send(OutboundMessage::text(text)));
    }

    let prompt = render(&phrases.reg_nickname_confirm, &[("nickname", nickname)]);
    let keyboard = Keyboard::inline_row(vec![
        Button::new(&phrases.yes_btn, ButtonValue::Answer(Choice::Yes)),
        Button::new(&phrases.no_btn, ButtonValue::Answer(Choice::No)),
    ]);

    let patch = StatePatch::default()
        .phase(Phase::Registration(RegistrationPhase::ExpectConfirm))
        .awaiting_button_press(true)
        .payload(Payload::Registration(RegistrationPayload {
            nickname: Some(nickname.to_owned()),
        }));

    Ok(Step::update(patch).send_tracked(
        OutboundMessage::text(prompt).with_keyboard(keyboard),
        MutationAction::ClearButtons,
        true,
    ))
}

async fn expect_confirm(turn: &Turn<'_>, state: &ConversationState) -> Result<Step, BotError> {
    let phrases = turn.phrases;
    let value = turn.button_value()?;
    let ButtonValue::Answer(choice) = value else {
        return Err(UnexpectedEvent::UnknownButton(value.to_string()).into());
    };
    let nickname = state
        .payload
        .as_registration()
        .and_then(|payload| payload.nickname.clone())
        .ok_or_else(|| BotError::InvalidState("confirmation without a nickname".into()))?;
    let message_id = turn
        .event
        .message_id()
        .ok_or_else(|| BotError::InvalidState("button event without a message".into()))?;

    let prompt = render(&phrases.reg_nickname_confirm, &[("nickname", &nickname)]);
    let label = match choice {
        Choice::Yes => &phrases.yes_btn,
        Choice::No => &phrases.no_btn,
    };
    let echo = MessageMutation::immediate(
        message_id,
        MutationAction::ReplaceText(answered(phrases, &prompt, label)),
    );

    let ask_again = |notice: OutboundMessage| {
        Step::update(
            StatePatch::default()
                .phase(Phase::Registration(RegistrationPhase::ExpectNickname))
                .awaiting_button_press(false)
                .payload(Payload::Registration(RegistrationPayload::default())),
        )
        .register(echo.clone())
        .send(notice)
    };

    if choice == Choice::No {
        return Ok(ask_again(OutboundMessage::text(
            &phrases.reg_nickname_request_again,
        )));
    }

    let done = |text: String| {
        Step::update(StatePatch::default().complete())
            .register(echo.clone())
            .send(OutboundMessage::text(text))
            .send(OutboundMessage::text(&phrases.reg_after).with_keyboard(main_menu(true, phrases)))
    };

    // the sender may have registered meanwhile, e.g. from another chat
    if let Some(identity) = turn.identity {
        let template = if identity.nickname == nickname {
            &phrases.reg_done
        } else {
            &phrases.reg_already_registered
        };
        return Ok(done(render(template, &[("nickname", &identity.nickname)])));
    }

    // the nickname may have been claimed since it was checked
    if turn.store.exists_by_nickname(nickname.clone()).await? {
        let text = render(&phrases.reg_nickname_in_use, &[("nickname", &nickname)]);
        return Ok(ask_again(OutboundMessage::text(text)));
    }

    let sender = turn.event.sender();
    let identity = NewIdentity {
        handle: sender.handle.clone(),
        nickname: nickname.clone(),
        full_name: sender.full_name.clone(),
        user_id: sender.user_id,
        chat_id: turn.chat_id,
    };

    // created last so a failed reply leaves nothing persisted
    Ok(done(render(&phrases.reg_done, &[("nickname", &nickname)])).create_identity(identity))
}
