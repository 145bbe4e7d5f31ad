//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::dao::models::StarRating;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "bot-config.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BOT_CONFIG_PATH";
/// Largest player count the team-choosing flow supports.
const MAX_SUPPORTED_PLAYERS: u32 = 10;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Language used when a sender's language has no phrase bundle.
    pub default_language: String,
    /// Highest player count offered by team choosing.
    pub max_players: u32,
    /// Rating tiers offered by team choosing.
    pub rating_tiers: Vec<StarRating>,
    /// Ask for a country after the rating.
    pub ask_team_country: bool,
    /// Idle time after which a conversation is dropped; zero disables expiry.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub state_ttl: Duration,
    /// Period of the expiry janitor.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub janitor_interval: Duration,
    /// Directory of `<code>.json` phrase bundles.
    pub locales_dir: Option<PathBuf>,
    /// JSON seed for the in-memory team catalog.
    pub catalog_path: Option<PathBuf>,
    /// Capacity of the outbox SSE channel.
    pub outbox_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: "ru".into(),
            max_players: MAX_SUPPORTED_PLAYERS,
            rating_tiers: StarRating::all_tiers(),
            ask_team_country: false,
            state_ttl: Duration::from_secs(24 * 60 * 60),
            janitor_interval: Duration::from_secs(60),
            locales_dir: None,
            catalog_path: None,
            outbox_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    let config = config.sanitized();
                    info!(
                        path = %path.display(),
                        language = %config.default_language,
                        max_players = config.max_players,
                        "loaded bot config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Expiry TTL, or `None` when expiry is disabled.
    pub fn state_ttl(&self) -> Option<Duration> {
        (!self.state_ttl.is_zero()).then_some(self.state_ttl)
    }

    /// Clamp values the flows cannot honour.
    fn sanitized(mut self) -> Self {
        if !(1..=MAX_SUPPORTED_PLAYERS).contains(&self.max_players) {
            warn!(
                max_players = self.max_players,
                "max_players out of range; clamping"
            );
            self.max_players = self.max_players.clamp(1, MAX_SUPPORTED_PLAYERS);
        }
        if self.rating_tiers.is_empty() {
            warn!("no rating tiers configured; offering every tier");
            self.rating_tiers = StarRating::all_tiers();
        }
        if self.janitor_interval.is_zero() {
            self.janitor_interval = Self::default().janitor_interval;
        }
        self
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config: AppConfig = serde_json::from_str(
            r#"{"default_language": "en", "state_ttl": 0, "rating_tiers": [4.5, 5.0]}"#,
        )
        .unwrap();

        assert_eq!(config.default_language, "en");
        assert_eq!(config.state_ttl(), None);
        assert_eq!(config.rating_tiers.len(), 2);
        assert_eq!(config.max_players, 10);
        assert_eq!(config.janitor_interval, Duration::from_secs(60));
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let config = AppConfig {
            max_players: 40,
            rating_tiers: Vec::new(),
            janitor_interval: Duration::ZERO,
            ..AppConfig::default()
        }
        .sanitized();

        assert_eq!(config.max_players, 10);
        assert_eq!(config.rating_tiers, StarRating::all_tiers());
        assert_eq!(config.janitor_interval, Duration::from_secs(60));
        assert_eq!(config.state_ttl(), Some(Duration::from_secs(86_400)));
    }
}
