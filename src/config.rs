//! Application-level configuration loading: room lifetime, limits and stream tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MOVIE_NIGHT_BACK_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Immutable runtime configuration shared across the application.
///
/// Every field is optional in the file; missing ones keep their default.
pub struct AppConfig {
    /// Seconds a room survives without any committed change.
    pub room_ttl_secs: u64,
    /// Upper bound on nominations per room.
    pub max_nominations: usize,
    /// Interval between SSE heartbeat comments.
    pub heartbeat_interval_secs: u64,
    /// Movie overviews longer than this are truncated.
    pub overview_max_chars: usize,
    /// Deadline for a single session store call.
    pub store_timeout_ms: u64,
    /// Pending events a subscriber may lag behind before it is dropped.
    pub subscriber_buffer: usize,
    /// Interval of the expiry sweeper.
    pub sweep_interval_secs: u64,
    /// Collisions tolerated when drawing a new room code.
    pub room_code_attempts: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        room_ttl_secs = config.room_ttl_secs,
                        max_nominations = config.max_nominations,
                        "loaded configuration"
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

    /// Parse a configuration document, clamping values that would disable a feature.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        config.room_ttl_secs = config.room_ttl_secs.max(1);
        config.store_timeout_ms = config.store_timeout_ms.max(1);
        config.max_nominations = config.max_nominations.max(2);
        config.subscriber_buffer = config.subscriber_buffer.max(1);
        config.room_code_attempts = config.room_code_attempts.max(1);
        config.heartbeat_interval_secs = config.heartbeat_interval_secs.max(1);
        config.sweep_interval_secs = config.sweep_interval_secs.max(1);
        Ok(config)
    }

    /// Lifetime of an idle room.
    pub fn room_ttl(&self) -> Duration {
        Duration::from_secs(self.room_ttl_secs.max(1))
    }

    /// Interval between SSE keep-alive comments.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Deadline of one session store call.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Period of the expiry sweeper.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room_ttl_secs: 2 * 60 * 60,
            max_nominations: 10,
            heartbeat_interval_secs: 30,
            overview_max_chars: 1000,
            store_timeout_ms: 5000,
            subscriber_buffer: 32,
            sweep_interval_secs: 60,
            room_code_attempts: 8,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
