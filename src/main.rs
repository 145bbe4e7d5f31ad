//! Tournament bot binary entrypoint wiring the conversation engine, REST, SSE and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tournament_bot::{
    bot::transport::Transport,
    config::AppConfig,
    dao::{
        bot_store::BotStore,
        memory::{InMemoryStore, load_catalog, sample_catalog},
    },
    locale::LocaleRegistry,
    routes,
    services::{janitor, outbox::OutboxTransport},
    state::{AppState, SharedState, SseHub},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let locales = Arc::new(LocaleRegistry::load(
        &config.default_language,
        config.locales_dir.as_deref(),
    ));
    let outbox = Arc::new(SseHub::new(config.outbox_capacity));
    let transport: Arc<dyn Transport> = Arc::new(OutboxTransport::new(outbox.clone()));

    let app_state = AppState::new(config, locales, transport, outbox);

    install_storage(&app_state).await;
    tokio::spawn(janitor::run(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the storage backend: MongoDB when `MONGO_URI` is set, the in-memory
/// store otherwise.
async fn install_storage(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    if let Ok(uri) = env::var("MONGO_URI") {
        let db_name = env::var("MONGO_DB").ok();
        tokio::spawn(run_mongo_supervisor(state.clone(), uri, db_name));
        return;
    }

    let teams = match state.config().catalog_path.as_deref() {
        Some(path) => match load_catalog(path) {
            Ok(teams) => teams,
            Err(err) => {
                warn!(error = %err, "failed to load team catalog; using the sample catalog");
                sample_catalog()
            }
        },
        None => sample_catalog(),
    };
    info!(teams = teams.len(), "using in-memory storage");
    let store: Arc<dyn BotStore> = Arc::new(InMemoryStore::with_teams(teams));
    state.install_bot_store(store).await;
}

/// Keep a MongoDB-backed store installed, toggling degraded mode while it is unreachable.
#[cfg(feature = "mongo-store")]
async fn run_mongo_supervisor(state: SharedState, uri: String, db_name: Option<String>) {
    use tournament_bot::{
        dao::{
            mongodb::{MongoBotStore, MongoConfig},
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                .await
                .map_err(StorageError::from)?;
            let store = MongoBotStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn BotStore>)
        }
    })
    .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
