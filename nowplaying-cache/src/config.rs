//! Cache configuration.

use std::time::Duration;

/// Default expiry window for both the lookup index and station entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

/// Default bound on the number of keys held by the in-process store.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Environment variable overriding the TTL, in whole seconds.
pub const TTL_ENV: &str = "NOWPLAYING_TTL_SECS";

/// Environment variable overriding the store capacity.
pub const MAX_CAPACITY_ENV: &str = "NOWPLAYING_MAX_CAPACITY";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed, or is out of range.
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Configuration for the now-playing cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied on every write. Reads never extend it.
    pub ttl: Duration,

    /// Maximum number of keys kept by the in-process store.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set a custom store capacity.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Build a config from the process environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(TTL_ENV) {
            // TTL must be at least one second
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: TTL_ENV,
                    value: value.clone(),
                })?;
            config.ttl = Duration::from_secs(secs);
        }

        if let Some(value) = lookup(MAX_CAPACITY_ENV) {
            config.max_capacity = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: MAX_CAPACITY_ENV,
                value: value.clone(),
            })?;
        }

        Ok(config)
    }
}
