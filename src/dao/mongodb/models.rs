use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{Country, IdentityEntity, StarRating, TeamEntity};

use super::error::MongoDaoError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoIdentityDocument {
    #[serde(rename = "_id")]
    id: String,
    handle: String,
    nickname: String,
    full_name: String,
    user_id: Option<i64>,
    chat_id: i64,
    created_at: DateTime,
}

impl From<IdentityEntity> for MongoIdentityDocument {
    fn from(value: IdentityEntity) -> Self {
        Self {
            id: value.id.to_string(),
            handle: value.handle,
            nickname: value.nickname,
            full_name: value.full_name,
            user_id: value.user_id,
            chat_id: value.chat_id,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoIdentityDocument> for IdentityEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoIdentityDocument) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id).map_err(|err| MongoDaoError::Malformed {
            collection: "identities",
            id: value.id.clone(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            id,
            handle: value.handle,
            nickname: value.nickname,
            full_name: value.full_name,
            user_id: value.user_id,
            chat_id: value.chat_id,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    pub id: String,
    name: String,
    league: String,
    #[serde(default)]
    country: Option<Country>,
    rating: f64,
    attack: i32,
    midfield: i32,
    defense: i32,
    general: i32,
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> Result<Self, Self::Error> {
        let malformed = |reason: String| MongoDaoError::Malformed {
            collection: "teams",
            id: value.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&value.id).map_err(|err| malformed(err.to_string()))?;
        let rating =
            StarRating::try_from(value.rating as f32).map_err(|err| malformed(err.to_string()))?;
        let stat = |raw: i32| u8::try_from(raw).map_err(|err| malformed(err.to_string()));

        Ok(Self {
            id,
            name: value.name.clone(),
            league: value.league.clone(),
            country: value.country,
            rating,
            attack: stat(value.attack)?,
            midfield: stat(value.midfield)?,
            defense: stat(value.defense)?,
            general: stat(value.general)?,
        })
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
