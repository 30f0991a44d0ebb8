//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::http::DEFAULT_TIMEOUT;
use crate::types::ApiUrl;

/// Refresh proactively once the access token has this many seconds left.
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 120;

/// Default prefix for persisted keys.
pub const DEFAULT_NAMESPACE: &str = "leadr";

pub const ENV_API_URL: &str = "LEADR_API_URL";
pub const ENV_GAME_ID: &str = "LEADR_GAME_ID";
pub const ENV_PLATFORM: &str = "LEADR_PLATFORM";

/// Settings for a [`LeadrClient`](crate::LeadrClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the leaderboard API.
    pub api_url: ApiUrl,
    /// Game the device sessions belong to.
    pub game_id: String,
    /// Platform string reported at session creation.
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_secs: i64,
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub request_timeout: Duration,
    /// Prefix for keys in the credential store.
    #[serde(default = "default_namespace")]
    pub storage_namespace: String,
}

fn default_platform() -> String {
    std::env::consts::OS.to_string()
}

fn default_refresh_threshold() -> i64 {
    DEFAULT_REFRESH_THRESHOLD_SECS
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the API URL
    /// and game.
    pub fn new(api_url: ApiUrl, game_id: impl Into<String>) -> Self {
        Self {
            api_url,
            game_id: game_id.into(),
            platform: default_platform(),
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
            request_timeout: DEFAULT_TIMEOUT,
            storage_namespace: default_namespace(),
        }
    }

    /// Read `LEADR_API_URL`, `LEADR_GAME_ID` and optionally `LEADR_PLATFORM`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var(ENV_API_URL).map_err(|_| ConfigError::Missing {
            name: ENV_API_URL,
        })?;
        let game_id = std::env::var(ENV_GAME_ID).map_err(|_| ConfigError::Missing {
            name: ENV_GAME_ID,
        })?;

        let mut config = Self::new(ApiUrl::new(api_url)?, game_id);
        if let Ok(platform) = std::env::var(ENV_PLATFORM) {
            config.platform = platform;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_refresh_threshold(mut self, seconds: i64) -> Self {
        self.refresh_threshold_secs = seconds;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_storage_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.storage_namespace = namespace.into();
        self
    }

    /// Check settings that cannot be enforced by their types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game_id.trim().is_empty() {
            return Err(ConfigError::Missing { name: "game_id" });
        }
        if self.platform.trim().is_empty() {
            return Err(ConfigError::Missing { name: "platform" });
        }
        if self.refresh_threshold_secs < 0 {
            return Err(ConfigError::Invalid {
                name: "refresh_threshold_secs",
                reason: "must not be negative".to_string(),
            });
        }
        if self.storage_namespace.is_empty() {
            return Err(ConfigError::Missing {
                name: "storage_namespace",
            });
        }
        Ok(())
    }
}
