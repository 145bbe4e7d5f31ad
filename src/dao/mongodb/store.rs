use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoIdentityDocument, MongoTeamDocument, doc_id},
};
use crate::dao::{
    bot_store::{BotStore, IdentityStore, TeamCatalog},
    models::{IdentityEntity, NewIdentity, TeamEntity, TeamFilter, TeamId},
    storage::StorageResult,
};

const IDENTITY_COLLECTION_NAME: &str = "identities";
const TEAM_COLLECTION_NAME: &str = "teams";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed identity store and team catalog.
#[derive(Clone)]
pub struct MongoBotStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBotStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let identities = self.identity_collection().await;
        for field in ["handle", "nickname"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("identity_{field}_idx")))
                        .unique(Some(true))
                        .build(),
                )
                .build();
            identities
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: IDENTITY_COLLECTION_NAME,
                    index: field,
                    source,
                })?;
        }

        let teams = self.team_collection().await;
        let index = IndexModel::builder()
            .keys(doc! { "rating": 1, "country": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("team_rating_country_idx".to_owned()))
                    .build(),
            )
            .build();
        teams
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TEAM_COLLECTION_NAME,
                index: "rating,country",
                source,
            })?;

        Ok(())
    }

    async fn identity_collection(&self) -> Collection<MongoIdentityDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoIdentityDocument>(IDENTITY_COLLECTION_NAME)
    }

    async fn team_collection(&self) -> Collection<MongoTeamDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
    }

    async fn find_by_handle(&self, handle: String) -> MongoResult<Option<IdentityEntity>> {
        let collection = self.identity_collection().await;
        let document = collection
            .find_one(doc! { "handle": &handle })
            .await
            .map_err(|source| MongoDaoError::LoadIdentity { handle, source })?;

        document.map(IdentityEntity::try_from).transpose()
    }

    async fn exists_by_nickname(&self, nickname: String) -> MongoResult<bool> {
        let collection = self.identity_collection().await;
        let found = collection
            .find_one(doc! { "nickname": &nickname })
            .await
            .map_err(|source| MongoDaoError::LookupNickname { nickname, source })?;
        Ok(found.is_some())
    }

    async fn create_identity(&self, identity: NewIdentity) -> MongoResult<IdentityEntity> {
        let entity: IdentityEntity = identity.into();
        let document: MongoIdentityDocument = entity.clone().into();
        let collection = self.identity_collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(entity),
            Err(err) if is_duplicate_key(&err) => Err(MongoDaoError::DuplicateIdentity {
                handle: entity.handle,
                nickname: entity.nickname,
            }),
            Err(source) => Err(MongoDaoError::SaveIdentity {
                handle: entity.handle,
                source,
            }),
        }
    }

    async fn query_teams(&self, filter: TeamFilter) -> MongoResult<Vec<TeamId>> {
        let mut query = doc! { "rating": f64::from(filter.rating.as_f32()) };
        if let Some(country) = filter.country {
            query.insert("country", country.as_str());
        }

        let collection = self.team_collection().await;
        let documents: Vec<MongoTeamDocument> = collection
            .find(query)
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?;

        documents
            .into_iter()
            .map(|document| {
                Uuid::parse_str(&document.id).map_err(|err| MongoDaoError::Malformed {
                    collection: TEAM_COLLECTION_NAME,
                    id: document.id.clone(),
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    async fn get_team(&self, id: TeamId) -> MongoResult<Option<TeamEntity>> {
        let collection = self.team_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTeam {
                id: id.to_string(),
                source,
            })?;

        document.map(TeamEntity::try_from).transpose()
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

impl IdentityStore for MongoBotStore {
    fn find_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<IdentityEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_handle(handle).await.map_err(Into::into) })
    }

    fn exists_by_nickname(&self, nickname: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.exists_by_nickname(nickname).await.map_err(Into::into) })
    }

    fn create_identity(
        &self,
        identity: NewIdentity,
    ) -> BoxFuture<'static, StorageResult<IdentityEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_identity(identity).await.map_err(Into::into) })
    }
}

impl TeamCatalog for MongoBotStore {
    fn query_teams(&self, filter: TeamFilter) -> BoxFuture<'static, StorageResult<Vec<TeamId>>> {
        let store = self.clone();
        Box::pin(async move { store.query_teams(filter).await.map_err(Into::into) })
    }

    fn get_team(&self, id: TeamId) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_team(id).await.map_err(Into::into) })
    }
}

impl BotStore for MongoBotStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
