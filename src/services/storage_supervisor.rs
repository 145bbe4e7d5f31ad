use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{bot_store::BotStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a storage backend installed, reconnecting with backoff and flagging
/// degraded mode while it is unreachable.
///
/// Never returns; spawn it.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn BotStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = backoff(delay);
                continue;
            }
        };

        state.install_bot_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        delay = INITIAL_DELAY;

        watch_health(&state, store.as_ref()).await;

        warn!("storage lost; dropping the store and reconnecting from scratch");
        state.clear_bot_store().await;
        sleep(delay).await;
        delay = backoff(delay);
    }
}

/// Poll `store` until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: &dyn BotStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        if !reconnect_in_place(state, store).await {
            return;
        }
        state.update_degraded(false).await;
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Retry `try_reconnect` a bounded number of times, entering degraded mode
/// after the first failure. Returns whether the store came back.
async fn reconnect_in_place(state: &SharedState, store: &dyn BotStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "storage reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = backoff(delay);
            }
        }
    }

    warn!(
        attempts = MAX_RECONNECT_ATTEMPTS,
        "exhausted storage reconnect attempts"
    );
    false
}

fn backoff(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}
