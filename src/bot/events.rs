use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dao::models::{Country, StarRating};

/// Opaque session key of a chat with one remote user.
pub type ChatId = i64;

/// Identifier the transport assigns to every message it delivers.
pub type MessageId = i64;

/// Remote user that produced an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Messaging handle, used as the identity lookup key.
    pub handle: String,
    /// Numeric platform id, when the transport knows it.
    pub user_id: Option<i64>,
    /// Display name as reported by the platform.
    pub full_name: String,
    /// Preferred language reported by the platform client.
    pub language_code: Option<String>,
}

/// Free-text message typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
    /// Chat the message was written in.
    pub chat_id: ChatId,
    /// Author of the message.
    pub sender: Sender,
    /// Raw message text.
    pub text: String,
}

/// Press of an inline button attached to a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Chat owning the pressed message.
    pub chat_id: ChatId,
    /// User who pressed the button.
    pub sender: Sender,
    /// Message the pressed button belongs to.
    pub message_id: MessageId,
    /// Encoded [`ButtonValue`] carried by the button.
    pub value: String,
}

/// Borrowed view over either inbound event kind, handed to processes.
#[derive(Debug, Clone, Copy)]
pub enum InboundEvent<'a> {
    /// Free text.
    Text(&'a TextEvent),
    /// Inline button press.
    Button(&'a ButtonEvent),
}

impl InboundEvent<'_> {
    /// Chat the event belongs to.
    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundEvent::Text(event) => event.chat_id,
            InboundEvent::Button(event) => event.chat_id,
        }
    }

    /// Message a pressed button belongs to; `None` for text.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            InboundEvent::Text(_) => None,
            InboundEvent::Button(event) => Some(event.message_id),
        }
    }

    /// Sender of the event.
    pub fn sender(&self) -> &Sender {
        match self {
            InboundEvent::Text(event) => &event.sender,
            InboundEvent::Button(event) => &event.sender,
        }
    }
}

/// Yes/no answer to a confirmation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Accept.
    Yes,
    /// Reject.
    No,
}

/// Typed payload of an inline button, encoded as `<kind>:<argument>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonValue {
    /// Answer to a yes/no question.
    Answer(Choice),
    /// Numeric choice, e.g. a player count.
    Number(u32),
    /// Team rating tier.
    Rating(StarRating),
    /// Team country; `None` means any country.
    Country(Option<Country>),
    /// Replace the team drawn for the given player.
    ChangeTeam(u32),
    /// Accept the drawn teams.
    ConfirmTeams,
}

/// Raised when a button value cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised button value `{0}`")]
pub struct ParseButtonError(pub String);

impl fmt::Display for ButtonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonValue::Answer(Choice::Yes) => f.write_str("answer:yes"),
            ButtonValue::Answer(Choice::No) => f.write_str("answer:no"),
            ButtonValue::Number(value) => write!(f, "number:{value}"),
            ButtonValue::Rating(rating) => write!(f, "rating:{rating}"),
            ButtonValue::Country(Some(country)) => write!(f, "country:{}", country.as_str()),
            ButtonValue::Country(None) => f.write_str("country:any"),
            ButtonValue::ChangeTeam(player) => write!(f, "change:{player}"),
            ButtonValue::ConfirmTeams => f.write_str("confirm"),
        }
    }
}

impl FromStr for ButtonValue {
    type Err = ParseButtonError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseButtonError(raw.to_owned());
        let (kind, argument) = raw.split_once(':').unwrap_or((raw, ""));

        let value = match (kind, argument) {
            ("answer", "yes") => ButtonValue::Answer(Choice::Yes),
            ("answer", "no") => ButtonValue::Answer(Choice::No),
            ("number", number) => ButtonValue::Number(number.parse().map_err(|_| invalid())?),
            ("rating", rating) => ButtonValue::Rating(rating.parse().map_err(|_| invalid())?),
            ("country", "any") => ButtonValue::Country(None),
            ("country", country) => {
                ButtonValue::Country(Some(country.parse().map_err(|_| invalid())?))
            }
            ("change", player) => ButtonValue::ChangeTeam(player.parse().map_err(|_| invalid())?),
            ("confirm", "") => ButtonValue::ConfirmTeams,
            _ => return Err(invalid()),
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_and_country_use_readable_arguments() {
        let rating = StarRating::from_half_stars(9).unwrap();
        assert_eq!(ButtonValue::Rating(rating).to_string(), "rating:4.5");
        assert_eq!(
            ButtonValue::Country(Some(Country::Spain)).to_string(),
            "country:SPAIN"
        );
        assert_eq!(
            "country:any".parse::<ButtonValue>(),
            Ok(ButtonValue::Country(None))
        );
        assert_eq!(
            "rating:5.0".parse::<ButtonValue>(),
            Ok(ButtonValue::Rating(StarRating::from_half_stars(10).unwrap()))
        );
    }

    #[test]
    fn malformed_button_values_are_rejected() {
        assert!("answer:maybe".parse::<ButtonValue>().is_err());
        assert!("number:x".parse::<ButtonValue>().is_err());
        assert!("rating:4.3".parse::<ButtonValue>().is_err());
        assert!("country:atlantis".parse::<ButtonValue>().is_err());
        assert!("confirm:now".parse::<ButtonValue>().is_err());
        assert!("".parse::<ButtonValue>().is_err());
    }
}
