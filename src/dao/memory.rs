use std::{fs, io, path::Path, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::info;

use crate::dao::{
    bot_store::{BotStore, IdentityStore, TeamCatalog},
    models::{Country, IdentityEntity, NewIdentity, StarRating, TeamEntity, TeamFilter, TeamId},
    storage::{StorageError, StorageResult},
};

/// Errors raised while loading a catalog seed file.
#[derive(Debug, Error)]
pub enum CatalogSeedError {
    /// The seed file could not be read.
    #[error("failed to read catalog seed `{path}`")]
    Read {
        /// Seed file path.
        path: String,
        /// I/O failure.
        #[source]
        source: io::Error,
    },
    /// The seed file is not a JSON team list.
    #[error("failed to parse catalog seed `{path}`")]
    Parse {
        /// Seed file path.
        path: String,
        /// JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Process-local store backing identities and the team catalog with [`DashMap`]s.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    identities: DashMap<String, IdentityEntity>,
    // nickname -> handle
    nicknames: DashMap<String, String>,
    teams: DashMap<TeamId, TeamEntity>,
}

impl InMemoryStore {
    /// Empty store without identities or teams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with `teams`.
    pub fn with_teams(teams: impl IntoIterator<Item = TeamEntity>) -> Self {
        let store = Self::new();
        for team in teams {
            store.insert_team(team);
        }
        store
    }

    /// Add or replace a catalog entry.
    pub fn insert_team(&self, team: TeamEntity) {
        self.inner.teams.insert(team.id, team);
    }

    /// Number of registered identities.
    pub fn identity_count(&self) -> usize {
        self.inner.identities.len()
    }

    fn create(&self, identity: NewIdentity) -> StorageResult<IdentityEntity> {
        match self.inner.nicknames.entry(identity.nickname.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::Conflict(format!(
                    "nickname `{}` is already in use",
                    identity.nickname
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(identity.handle.clone());
            }
        }

        match self.inner.identities.entry(identity.handle.clone()) {
            Entry::Occupied(_) => {
                self.inner.nicknames.remove(&identity.nickname);
                Err(StorageError::Conflict(format!(
                    "handle `{}` is already registered",
                    identity.handle
                )))
            }
            Entry::Vacant(slot) => {
                let entity: IdentityEntity = identity.into();
                slot.insert(entity.clone());
                Ok(entity)
            }
        }
    }
}

impl IdentityStore for InMemoryStore {
    fn find_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<IdentityEntity>>> {
        let found = self
            .inner
            .identities
            .get(&handle)
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn exists_by_nickname(&self, nickname: String) -> BoxFuture<'static, StorageResult<bool>> {
        let exists = self.inner.nicknames.contains_key(&nickname);
        Box::pin(async move { Ok(exists) })
    }

    fn create_identity(
        &self,
        identity: NewIdentity,
    ) -> BoxFuture<'static, StorageResult<IdentityEntity>> {
        let result = self.create(identity);
        Box::pin(async move { result })
    }
}

impl TeamCatalog for InMemoryStore {
    fn query_teams(&self, filter: TeamFilter) -> BoxFuture<'static, StorageResult<Vec<TeamId>>> {
        let mut ids: Vec<TeamId> = self
            .inner
            .teams
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        Box::pin(async move { Ok(ids) })
    }

    fn get_team(&self, id: TeamId) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let team = self.inner.teams.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(team) })
    }
}

impl BotStore for InMemoryStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Read a JSON array of teams from `path`.
pub fn load_catalog(path: &Path) -> Result<Vec<TeamEntity>, CatalogSeedError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogSeedError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let teams: Vec<TeamEntity> =
        serde_json::from_str(&contents).map_err(|source| CatalogSeedError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), count = teams.len(), "loaded team catalog seed");
    Ok(teams)
}

/// Built-in catalog used when no seed file is configured.
pub fn sample_catalog() -> Vec<TeamEntity> {
    let rows: [(&str, &str, Country, u8, [u8; 4]); 24] = [
        ("Real Madrid", "LaLiga", Country::Spain, 10, [90, 87, 83, 86]),
        ("Manchester City", "Premier League", Country::England, 10, [88, 87, 85, 87]),
        ("FC Bayern", "Bundesliga", Country::Germany, 10, [87, 84, 83, 85]),
        ("Paris Saint-Germain", "Ligue 1", Country::France, 10, [88, 82, 81, 84]),
        ("Liverpool", "Premier League", Country::England, 10, [86, 83, 84, 85]),
        ("FC Barcelona", "LaLiga", Country::Spain, 10, [85, 84, 82, 84]),
        ("Inter", "Serie A", Country::Italy, 10, [84, 84, 84, 84]),
        ("Arsenal", "Premier League", Country::England, 9, [84, 83, 82, 83]),
        ("Atletico de Madrid", "LaLiga", Country::Spain, 9, [83, 81, 82, 82]),
        ("Borussia Dortmund", "Bundesliga", Country::Germany, 9, [82, 80, 79, 81]),
        ("AC Milan", "Serie A", Country::Italy, 9, [83, 80, 80, 81]),
        ("Napoli", "Serie A", Country::Italy, 9, [82, 80, 80, 81]),
        ("Juventus", "Serie A", Country::Italy, 9, [80, 80, 82, 81]),
        ("Bayer 04 Leverkusen", "Bundesliga", Country::Germany, 9, [81, 81, 79, 80]),
        ("Newcastle United", "Premier League", Country::England, 8, [80, 79, 79, 79]),
        ("Aston Villa", "Premier League", Country::England, 8, [80, 79, 78, 79]),
        ("Real Sociedad", "LaLiga", Country::Spain, 8, [78, 79, 78, 78]),
        ("RB Leipzig", "Bundesliga", Country::Germany, 8, [81, 78, 77, 79]),
        ("SL Benfica", "Liga Portugal", Country::Portugal, 8, [79, 78, 77, 78]),
        ("FC Porto", "Liga Portugal", Country::Portugal, 8, [78, 78, 77, 78]),
        ("PSV", "Eredivisie", Country::Netherlands, 7, [78, 76, 74, 76]),
        ("Ajax", "Eredivisie", Country::Netherlands, 7, [77, 76, 73, 75]),
        ("Olympique de Marseille", "Ligue 1", Country::France, 7, [77, 76, 75, 76]),
        ("AS Monaco", "Ligue 1", Country::France, 7, [78, 75, 74, 76]),
    ];

    rows.into_iter()
        .filter_map(|(name, league, country, half_stars, [attack, midfield, defense, general])| {
            Some(TeamEntity {
                id: TeamId::new_v4(),
                name: name.to_owned(),
                league: league.to_owned(),
                country: Some(country),
                rating: StarRating::from_half_stars(half_stars)?,
                attack,
                midfield,
                defense,
                general,
            })
        })
        .collect()
}
