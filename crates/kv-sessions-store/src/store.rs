//! Lock-guarded session read/write/destroy.

use std::sync::Arc;

use kv_sessions_core::{KeyValueStore, SessionConfig, StoreError};

use crate::lock::{LockError, SessionLock};

/// Session store error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Lock-guarded session persistence over a key-value store.
///
/// One handle serves one session lifecycle: the lock is taken at the first
/// `read` or `write` and held until `close` or `destroy`. Callers must call
/// `close` on every exit path — there is no destructor-based release — or
/// the lock lingers until its safety-net expiry.
///
/// Read-only handles never take the lock and silently suppress writes; they
/// must not be used alongside a read-write handle on the same session.
pub struct SessionStore<S: KeyValueStore> {
    store: Arc<S>,
    config: Arc<SessionConfig>,
    lock: SessionLock<S>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create a session store over `store` with the given configuration.
    #[must_use]
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        let config = Arc::new(config);
        Self {
            lock: SessionLock::new(Arc::clone(&store), Arc::clone(&config)),
            store,
            config,
        }
    }

    /// Whether this handle currently holds the session lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Read session data, acquiring the lock first.
    ///
    /// A session that has never been written reads as the empty payload.
    /// The lock stays held after return; it is released at `close`.
    ///
    /// # Errors
    /// Returns error if lock acquisition or the store read fails.
    pub async fn read(&mut self, session_id: &str) -> Result<Vec<u8>, SessionError> {
        self.lock.acquire(session_id).await?;
        let payload = self
            .store
            .get(&self.config.data_key(session_id))
            .await?
            .unwrap_or_default();
        Ok(payload)
    }

    /// Write session data, acquiring the lock first.
    ///
    /// In read-only mode this is a silent no-op. With a configured TTL the
    /// data key expires on its own; otherwise it persists until destroyed.
    ///
    /// # Errors
    /// Returns error if lock acquisition or the store write fails.
    pub async fn write(&mut self, session_id: &str, payload: &[u8]) -> Result<(), SessionError> {
        if self.config.read_only {
            return Ok(());
        }
        self.lock.acquire(session_id).await?;

        let data_key = self.config.data_key(session_id);
        match self.config.ttl {
            Some(ttl) => self.store.set_with_expiry(&data_key, payload, ttl).await?,
            None => self.store.set(&data_key, payload).await?,
        }
        Ok(())
    }

    /// Destroy the session's data and release any held lock.
    ///
    /// Best-effort: store failures are logged, never surfaced, and deleting
    /// a session that does not exist succeeds.
    pub async fn destroy(&mut self, session_id: &str) {
        let data_key = self.config.data_key(session_id);
        if let Err(e) = self.store.delete(&data_key).await {
            tracing::warn!(key = %data_key, "Failed to delete session data: {e}");
        }
        self.close().await;
    }

    /// Release any held lock. Idempotent, best-effort.
    pub async fn close(&mut self) {
        if let Err(e) = self.lock.release().await {
            tracing::warn!("Failed to release session lock: {e}");
        }
    }
}
