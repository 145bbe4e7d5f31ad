use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "tournament_bot";

/// Where the identity and team collections live.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed client options.
    pub options: ClientOptions,
    /// Database name, `tournament_bot` unless overridden.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`, using `db_name` or the default database.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
