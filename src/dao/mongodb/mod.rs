mod config;
mod connection;
mod error;
mod models;
/// MongoDB-backed [`BotStore`](crate::dao::bot_store::BotStore).
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoBotStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateIdentity { handle, nickname } => StorageError::Conflict(
                format!("identity `{handle}` or nickname `{nickname}` already exists"),
            ),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
