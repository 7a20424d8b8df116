//! The key-value store trait consumed by the session layer.

use async_trait::async_trait;
use thiserror::Error;

/// Result of an expiry query on a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key exists and expires in this many whole seconds.
    Remaining(u64),
    /// Key exists but has no expiry set.
    NoExpiry,
    /// Key does not exist.
    Missing,
}

/// Store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),
    #[error("Store error: {0}")]
    Internal(String),
}

/// Trait for key-value store backends.
///
/// The session layer arbitrates its lock entirely through
/// `set_if_absent_with_expiry` and `delete_if_value`; both must be atomic
/// with respect to concurrent callers against the same backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Store `value` under `key`, expiring after `ttl_seconds`.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<(), StoreError>;

    /// Store `value` under `key` with an expiry, only if the key is absent.
    ///
    /// Returns `true` if the value was stored, `false` if the key already
    /// existed.
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<bool, StoreError>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Delete `key` only if its current value equals `expected`.
    ///
    /// Returns `true` if the key was deleted, `false` if it was absent or
    /// held a different value.
    async fn delete_if_value(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError>;

    /// Query the remaining time-to-live of `key`.
    async fn time_to_live(&self, key: &str) -> Result<Ttl, StoreError>;
}
