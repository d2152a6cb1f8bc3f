//! Store configuration loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_LOCK_TTL_SECS: u64 = 30;

/// Connection and lock settings for the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL.
    pub redis_url: String,
    /// Admission lock TTL in seconds. Must exceed the critical section's
    /// worst-case latency.
    pub lock_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            lock_ttl_secs: DEFAULT_LOCK_TTL_SECS,
        }
    }
}

impl StoreConfig {
    /// Load from `FLASHGATE_REDIS_URL` and `FLASHGATE_LOCK_TTL_SECS`,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("FLASHGATE_REDIS_URL")
                .unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            lock_ttl_secs: parse_lock_ttl(std::env::var("FLASHGATE_LOCK_TTL_SECS").ok()),
        }
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }
}

fn parse_lock_ttl(raw: Option<String>) -> u64 {
    match raw {
        None => DEFAULT_LOCK_TTL_SECS,
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                warn!(value = %raw, "invalid lock TTL, using default");
                DEFAULT_LOCK_TTL_SECS
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_settings() {
        let config = StoreConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.lock_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn lock_ttl_falls_back_on_garbage() {
        assert_eq!(parse_lock_ttl(None), DEFAULT_LOCK_TTL_SECS);
        assert_eq!(parse_lock_ttl(Some("soon".into())), DEFAULT_LOCK_TTL_SECS);
        assert_eq!(parse_lock_ttl(Some("0".into())), DEFAULT_LOCK_TTL_SECS);
        assert_eq!(parse_lock_ttl(Some("45".into())), 45);
    }
}
