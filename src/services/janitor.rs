use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::state::SharedState;

/// Periodically drop conversations idle for longer than the configured TTL.
///
/// Returns immediately when expiry is disabled.
pub async fn run(state: SharedState) {
    let Some(ttl) = state.config().state_ttl() else {
        info!("conversation expiry disabled");
        return;
    };
    let period = state.config().janitor_interval;
    info!(
        ttl_secs = ttl.as_secs(),
        period_secs = period.as_secs(),
        "conversation janitor started"
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        sweep_once(&state, ttl);
    }
}

/// Single expiry pass; returns the number of dropped conversations.
pub fn sweep_once(state: &SharedState, ttl: Duration) -> usize {
    let expired = state.router().expire_idle(ttl);
    debug!(expired, remaining = state.router().states().len(), "janitor pass");
    expired
}
