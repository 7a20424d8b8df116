//! Session keyspace, timing, and mode configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("prefix must not be empty")]
    EmptyPrefix,
    #[error("spin_lock_wait_micros must be positive")]
    ZeroSpinWait,
    #[error("lock_max_wait_micros ({max}) must be >= spin_lock_wait_micros ({spin})")]
    WaitBudgetTooSmall { max: u64, spin: u64 },
}

/// Configuration for session persistence and lock timing.
///
/// All fields have defaults, so hosts can embed this in their own config
/// files and override selectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keyspace prefix for session data keys.
    pub prefix: String,

    /// Session data time-to-live in seconds. `None` means session keys
    /// never expire on their own.
    pub ttl: Option<u64>,

    /// Interval between lock acquisition polls, in microseconds.
    pub spin_lock_wait_micros: u64,

    /// Total lock acquisition wait budget, in microseconds.
    pub lock_max_wait_micros: u64,

    /// When true, no lock is ever taken and writes are suppressed.
    pub read_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prefix: "session".to_string(),
            ttl: None,
            spin_lock_wait_micros: 150_000,
            lock_max_wait_micros: 30_000_000,
            read_only: false,
        }
    }
}

impl SessionConfig {
    /// Key under which a session's data is stored.
    #[must_use]
    pub fn data_key(&self, session_id: &str) -> String {
        format!("{}:{session_id}", self.prefix)
    }

    /// Key under which a session's lock is stored.
    #[must_use]
    pub fn lock_key(&self, session_id: &str) -> String {
        format!("{}.lock", self.data_key(session_id))
    }

    /// Validate the timing contract and keyspace prefix.
    ///
    /// # Errors
    /// Returns an error if the prefix is empty, either wait value is zero,
    /// or the total budget is smaller than the poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.spin_lock_wait_micros == 0 || self.lock_max_wait_micros == 0 {
            return Err(ConfigError::ZeroSpinWait);
        }
        if self.lock_max_wait_micros < self.spin_lock_wait_micros {
            return Err(ConfigError::WaitBudgetTooSmall {
                max: self.lock_max_wait_micros,
                spin: self.spin_lock_wait_micros,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation() {
        let config = SessionConfig::default();
        assert_eq!(config.data_key("abc"), "session:abc");
        assert_eq!(config.lock_key("abc"), "session:abc.lock");

        let config = SessionConfig {
            prefix: "app".to_string(),
            ..SessionConfig::default()
        };
        assert_eq!(config.data_key("u-42"), "app:u-42");
        assert_eq!(config.lock_key("u-42"), "app:u-42.lock");
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.prefix, "session");
        assert_eq!(config.ttl, None);
        assert_eq!(config.spin_lock_wait_micros, 150_000);
        assert_eq!(config.lock_max_wait_micros, 30_000_000);
        assert!(!config.read_only);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_timing() {
        let config = SessionConfig {
            spin_lock_wait_micros: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSpinWait)));

        let config = SessionConfig {
            spin_lock_wait_micros: 2000,
            lock_max_wait_micros: 1000,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WaitBudgetTooSmall { max: 1000, spin: 2000 })
        ));

        let config = SessionConfig {
            prefix: String::new(),
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPrefix)));
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"prefix": "web", "ttl": 3600}"#).unwrap();
        assert_eq!(config.prefix, "web");
        assert_eq!(config.ttl, Some(3600));
        assert_eq!(config.spin_lock_wait_micros, 150_000);
    }
}
