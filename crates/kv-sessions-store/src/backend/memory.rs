//! In-memory key-value store.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use kv_sessions_core::{KeyValueStore, StoreError, Ttl};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// In-memory store implementation.
///
/// Useful for development, tests, and single-process deployments. Expiry is
/// lazy: expired entries are treated as absent when touched. Data is lost on
/// restart, and locks arbitrated through it only exclude tasks within the
/// same process.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn deadline(ttl_seconds: u64) -> Option<Instant> {
    Some(Instant::now() + Duration::from_secs(ttl_seconds))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        Ok(entries
            .get(key)
            .filter(|entry| !entry.expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: None,
            },
        );

        Ok(())
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: deadline(ttl_seconds),
            },
        );

        Ok(())
    }

    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        if entries.get(key).is_some_and(|entry| !entry.expired()) {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: deadline(ttl_seconds),
            },
        );

        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .remove(key);

        Ok(())
    }

    async fn delete_if_value(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        let matches = entries
            .get(key)
            .is_some_and(|entry| !entry.expired() && entry.value == expected);
        if matches {
            entries.remove(key);
        }

        Ok(matches)
    }

    async fn time_to_live(&self, key: &str) -> Result<Ttl, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        let Some(entry) = entries.get(key).filter(|entry| !entry.expired()) else {
            return Ok(Ttl::Missing);
        };

        Ok(match entry.expires_at {
            Some(deadline) => {
                Ttl::Remaining(deadline.saturating_duration_since(Instant::now()).as_secs())
            }
            None => Ttl::NoExpiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = MemoryStore::new();

        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", b"v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap(), b"v");

        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());

        // Deleting an absent key is not an error.
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_reporting() {
        let store = MemoryStore::new();

        assert_eq!(store.time_to_live("k").await.unwrap(), Ttl::Missing);

        store.set("k", b"v").await.unwrap();
        assert_eq!(store.time_to_live("k").await.unwrap(), Ttl::NoExpiry);

        store.set_with_expiry("k", b"v", 60).await.unwrap();
        match store.time_to_live("k").await.unwrap() {
            Ttl::Remaining(secs) => assert!(secs > 0 && secs <= 60),
            other => panic!("expected Remaining, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_conditional_set_respects_existing_key() {
        let store = MemoryStore::new();

        assert!(store.set_if_absent_with_expiry("k", b"a", 60).await.unwrap());
        assert!(!store.set_if_absent_with_expiry("k", b"b", 60).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().unwrap(), b"a");
    }

    #[tokio::test]
    async fn test_conditional_set_reclaims_expired_key() {
        let store = MemoryStore::new();

        // Zero TTL expires immediately.
        assert!(store.set_if_absent_with_expiry("k", b"a", 0).await.unwrap());
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.set_if_absent_with_expiry("k", b"b", 60).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_delete_if_value() {
        let store = MemoryStore::new();
        store.set("k", b"mine").await.unwrap();

        assert!(!store.delete_if_value("k", b"theirs").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().unwrap(), b"mine");

        assert!(store.delete_if_value("k", b"mine").await.unwrap());
        assert!(store.get("k").await.unwrap().is_none());

        assert!(!store.delete_if_value("k", b"mine").await.unwrap());
    }
}
