use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::bot::events::ChatId;

/// Identifier of a team record in the catalog.
pub type TeamId = Uuid;

/// Registered user record, keyed by messaging handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityEntity {
    /// Stable identifier of the identity.
    pub id: Uuid,
    /// Messaging handle (unique).
    pub handle: String,
    /// Nickname chosen during registration (unique).
    pub nickname: String,
    /// Display name reported by the platform at registration time.
    pub full_name: String,
    /// Numeric platform id, when known.
    pub user_id: Option<i64>,
    /// Chat the identity registered from.
    pub chat_id: ChatId,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

/// Data needed to register a new identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    /// Messaging handle.
    pub handle: String,
    /// Confirmed nickname.
    pub nickname: String,
    /// Display name.
    pub full_name: String,
    /// Numeric platform id, when known.
    pub user_id: Option<i64>,
    /// Chat the registration happened in.
    pub chat_id: ChatId,
}

impl From<NewIdentity> for IdentityEntity {
    fn from(value: NewIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            handle: value.handle,
            nickname: value.nickname,
            full_name: value.full_name,
            user_id: value.user_id,
            chat_id: value.chat_id,
            created_at: SystemTime::now(),
        }
    }
}

/// Country a team's league belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum Country {
    England,
    Spain,
    Germany,
    Italy,
    France,
    Netherlands,
    Portugal,
}

/// Raised when a country code is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown country `{0}`")]
pub struct UnknownCountry(pub String);

impl Country {
    /// Every supported country, in display order.
    pub const ALL: [Country; 7] = [
        Country::England,
        Country::Spain,
        Country::Germany,
        Country::Italy,
        Country::France,
        Country::Netherlands,
        Country::Portugal,
    ];

    /// Upper-case code used in storage and button values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::England => "ENGLAND",
            Country::Spain => "SPAIN",
            Country::Germany => "GERMANY",
            Country::Italy => "ITALY",
            Country::France => "FRANCE",
            Country::Netherlands => "NETHERLANDS",
            Country::Portugal => "PORTUGAL",
        }
    }

    /// Human-readable name, e.g. `England`.
    pub fn display_name(&self) -> String {
        let code = self.as_str();
        let mut name = code[..1].to_owned();
        name.push_str(&code[1..].to_lowercase());
        name
    }
}

impl FromStr for Country {
    type Err = UnknownCountry;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Country::ALL
            .into_iter()
            .find(|country| country.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| UnknownCountry(raw.to_owned()))
    }
}

/// Team rating in half-star steps, from 0.5 to 5.0 stars.
///
/// Stored as the number of half stars so that filtering is exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct StarRating(u8);

/// Raised when a value is not a whole number of half stars in range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid star rating `{0}` (expected 0.5 to 5.0 in 0.5 steps)")]
pub struct InvalidRating(pub String);

impl StarRating {
    /// Highest supported rating, in half stars.
    pub const MAX_HALF_STARS: u8 = 10;

    /// Build from a half-star count in `1..=10`.
    pub fn from_half_stars(half_stars: u8) -> Option<Self> {
        (1..=Self::MAX_HALF_STARS)
            .contains(&half_stars)
            .then_some(Self(half_stars))
    }

    /// Every tier from 0.5 to 5.0 stars.
    pub fn all_tiers() -> Vec<Self> {
        (1..=Self::MAX_HALF_STARS).map(Self).collect()
    }

    /// Half-star count.
    pub fn half_stars(&self) -> u8 {
        self.0
    }

    /// Rating as stars.
    pub fn as_f32(&self) -> f32 {
        f32::from(self.0) / 2.0
    }
}

impl TryFrom<f32> for StarRating {
    type Error = InvalidRating;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 || !(1.0..=f32::from(Self::MAX_HALF_STARS)).contains(&doubled) {
            return Err(InvalidRating(value.to_string()));
        }
        Ok(Self(doubled as u8))
    }
}

impl From<StarRating> for f32 {
    fn from(value: StarRating) -> Self {
        value.as_f32()
    }
}

impl FromStr for StarRating {
    type Err = InvalidRating;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value: f32 = raw.parse().map_err(|_| InvalidRating(raw.to_owned()))?;
        value.try_into()
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = if self.0 % 2 == 1 { 5 } else { 0 };
        write!(f, "{}.{}", self.0 / 2, tenths)
    }
}

/// Team record as exposed by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier; generated when a seed file omits it.
    #[serde(default = "Uuid::new_v4")]
    pub id: TeamId,
    /// Club name.
    pub name: String,
    /// League the club plays in.
    pub league: String,
    /// Country of the league, when known.
    #[serde(default)]
    pub country: Option<Country>,
    /// Overall star rating.
    pub rating: StarRating,
    /// Attack rating.
    pub attack: u8,
    /// Midfield rating.
    pub midfield: u8,
    /// Defense rating.
    pub defense: u8,
    /// General (overall) rating.
    pub general: u8,
}

/// Equality filter over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamFilter {
    /// Exact rating tier.
    pub rating: StarRating,
    /// Exact country, or any when `None`.
    pub country: Option<Country>,
}

impl TeamFilter {
    /// Whether `team` passes the filter.
    pub fn matches(&self, team: &TeamEntity) -> bool {
        team.rating == self.rating
            && self
                .country
                .is_none_or(|country| team.country == Some(country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(rating: u8, country: Option<Country>) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            name: "Test FC".into(),
            league: "Test League".into(),
            country,
            rating: StarRating::from_half_stars(rating).unwrap(),
            attack: 80,
            midfield: 80,
            defense: 80,
            general: 80,
        }
    }

    #[test]
    fn star_rating_accepts_only_half_steps() {
        assert_eq!("4.5".parse::<StarRating>().unwrap().half_stars(), 9);
        assert_eq!("0.5".parse::<StarRating>().unwrap().half_stars(), 1);
        assert!("4.3".parse::<StarRating>().is_err());
        assert!("0".parse::<StarRating>().is_err());
        assert!("5.5".parse::<StarRating>().is_err());
        assert_eq!(StarRating::from_half_stars(10).unwrap().to_string(), "5.0");
    }

    #[test]
    fn filter_is_exact_on_rating_and_optional_country() {
        let four = StarRating::from_half_stars(8).unwrap();
        let any_country = TeamFilter {
            rating: four,
            country: None,
        };
        let english = TeamFilter {
            rating: four,
            country: Some(Country::England),
        };

        assert!(any_country.matches(&team(8, Some(Country::Italy))));
        assert!(!any_country.matches(&team(9, Some(Country::Italy))));
        assert!(english.matches(&team(8, Some(Country::England))));
        assert!(!english.matches(&team(8, None)));
    }

    #[test]
    fn team_seed_parses_rating_from_stars() {
        let team: TeamEntity = serde_json::from_str(
            r#"{"name":"Arsenal","league":"Premier League","country":"ENGLAND","rating":4.5,
                "attack":84,"midfield":83,"defense":82,"general":83}"#,
        )
        .unwrap();
        assert_eq!(team.rating.half_stars(), 9);
        assert_eq!(team.country, Some(Country::England));
        assert_eq!(Country::England.display_name(), "England");
    }
}
