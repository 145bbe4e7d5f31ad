use futures::future::BoxFuture;

use crate::dao::{
    models::{IdentityEntity, NewIdentity, TeamEntity, TeamFilter, TeamId},
    storage::StorageResult,
};

/// Lookup and creation of registered identities.
pub trait IdentityStore: Send + Sync {
    /// Identity registered under a messenger handle.
    fn find_by_handle(&self, handle: String)
    -> BoxFuture<'static, StorageResult<Option<IdentityEntity>>>;
    /// Whether any identity already uses `nickname`.
    fn exists_by_nickname(&self, nickname: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Persist a new identity; fails with a conflict when the handle or nickname is taken.
    fn create_identity(&self, identity: NewIdentity)
    -> BoxFuture<'static, StorageResult<IdentityEntity>>;
}

/// Read-only access to the team catalog.
pub trait TeamCatalog: Send + Sync {
    /// Ids of the teams matching `filter`.
    fn query_teams(&self, filter: TeamFilter) -> BoxFuture<'static, StorageResult<Vec<TeamId>>>;
    /// Team by id.
    fn get_team(&self, id: TeamId) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
}

/// Storage backend used by the bot: identities, catalog and connection upkeep.
pub trait BotStore: IdentityStore + TeamCatalog {
    /// Cheap round trip to the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
