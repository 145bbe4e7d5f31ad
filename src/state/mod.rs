mod sse;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::{
    bot::{
        processes::{Process, Registration, TeamChoosing},
        registry::ProcessRegistry,
        router::EventRouter,
        transport::Transport,
    },
    config::AppConfig,
    dao::bot_store::BotStore,
    dto::sse::{ServerEvent, SystemStatus},
    error::ServiceError,
    locale::LocaleRegistry,
};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: conversation engine, storage handle and outbox.
pub struct AppState {
    config: AppConfig,
    router: EventRouter,
    bot_store: RwLock<Option<Arc<dyn BotStore>>>,
    outbox: Arc<SseHub>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        locales: Arc<LocaleRegistry>,
        transport: Arc<dyn Transport>,
        outbox: Arc<SseHub>,
    ) -> SharedState {
        let processes: Vec<Arc<dyn Process>> = vec![
            Arc::new(Registration),
            Arc::new(TeamChoosing::new(
                config.max_players,
                config.rating_tiers.clone(),
                config.ask_team_country,
            )),
        ];
        let registry = ProcessRegistry::new(processes, &locales);
        let (degraded_tx, _rx) = watch::channel(true);

        Arc::new(Self {
            router: EventRouter::new(registry, transport, locales),
            config,
            bot_store: RwLock::new(None),
            outbox,
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Conversation engine.
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Hub carrying outbound transport actions and status events.
    pub fn outbox(&self) -> &SseHub {
        &self.outbox
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn bot_store(&self) -> Option<Arc<dyn BotStore>> {
        let guard = self.bot_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_bot_store(&self) -> Result<Arc<dyn BotStore>, ServiceError> {
        self.bot_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_bot_store(&self, store: Arc<dyn BotStore>) {
        {
            let mut guard = self.bot_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_bot_store(&self) {
        {
            let mut guard = self.bot_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
        if !changed {
            return;
        }

        match ServerEvent::json(
            Some("system_status".to_owned()),
            &SystemStatus { degraded: value },
        ) {
            Ok(event) => self.outbox.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialise system status event"),
        }
    }
}
