//! Per-session distributed spin lock.
//!
//! The lock is a key in the shared store: present means held, absent means
//! free. Acquisition races between processes are resolved entirely by the
//! store's atomic set-if-absent; this module adds only the bounded poll loop
//! around it and a safety-net expiry so a crashed holder cannot wedge a
//! session forever.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use kv_sessions_core::{KeyValueStore, SessionConfig, StoreError, Ttl};
use uuid::Uuid;

/// Lock error.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error(
        "Lock acquisition timed out after {attempts} attempts \
         ({poll_interval:?} apart, {elapsed:?} elapsed)"
    )]
    Timeout {
        attempts: u64,
        poll_interval: Duration,
        elapsed: Duration,
    },
    #[error("Lock key {key} exists without an expiry")]
    TtlMissing { key: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// State tracked while the lock is held.
struct HeldLock {
    key: String,
    token: String,
}

/// Per-session exclusive lock over a shared key-value store.
///
/// One handle serves one session lifecycle at a time: acquire before the
/// first read, release at close. `acquire` suspends the calling task between
/// polls; it never blocks an OS thread.
pub struct SessionLock<S: KeyValueStore> {
    store: Arc<S>,
    config: Arc<SessionConfig>,
    held: Option<HeldLock>,
}

impl<S: KeyValueStore> SessionLock<S> {
    /// Create a new lock handle.
    #[must_use]
    pub fn new(store: Arc<S>, config: Arc<SessionConfig>) -> Self {
        Self {
            store,
            config,
            held: None,
        }
    }

    /// Whether this handle currently holds a lock.
    ///
    /// Always false in read-only mode.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.held.is_some()
    }

    /// Key of the lock currently held, if any.
    #[must_use]
    pub fn lock_key(&self) -> Option<&str> {
        self.held.as_ref().map(|h| h.key.as_str())
    }

    /// Acquire the lock for `session_id`, polling until it is free or the
    /// wait budget runs out.
    ///
    /// No-op returning `Ok` if the handle already holds a lock or is in
    /// read-only mode. The stored lock value is a fresh per-acquisition
    /// token, so release can verify ownership.
    ///
    /// # Errors
    /// `Timeout` when every poll found the lock taken, `TtlMissing` when the
    /// contending lock key has no expiry (an external invariant violation),
    /// or `Store` on backend failure.
    pub async fn acquire(&mut self, session_id: &str) -> Result<(), LockError> {
        if self.config.read_only || self.held.is_some() {
            return Ok(());
        }

        let key = self.config.lock_key(session_id);
        let spin = self.config.spin_lock_wait_micros;
        let attempts = (self.config.lock_max_wait_micros / spin).max(1);
        // Crash-recovery ceiling: wait budget rounded up to whole seconds,
        // plus one second of margin.
        let lock_ttl = self.config.lock_max_wait_micros / 1_000_000 + 1;
        let token = Uuid::new_v4().to_string();
        let poll_interval = Duration::from_micros(spin);
        let start = Instant::now();

        for attempt in 1..=attempts {
            if self
                .store
                .set_if_absent_with_expiry(&key, token.as_bytes(), lock_ttl)
                .await?
            {
                if attempt > 1 {
                    tracing::debug!(%key, attempt, "Acquired session lock after contention");
                }
                self.held = Some(HeldLock { key, token });
                return Ok(());
            }
            tokio::time::sleep(poll_interval).await;
        }

        // Exhausted. A lock key with no expiry means some acquirer skipped
        // the TTL, which is a systemic bug rather than ordinary contention.
        if self.store.time_to_live(&key).await? == Ttl::NoExpiry {
            return Err(LockError::TtlMissing { key });
        }

        let elapsed = start.elapsed();
        tracing::debug!(%key, attempts, ?elapsed, "Session lock acquisition timed out");
        Err(LockError::Timeout {
            attempts,
            poll_interval,
            elapsed,
        })
    }

    /// Release the held lock, if any. Idempotent.
    ///
    /// The delete is conditional on the stored value still being this
    /// handle's token; if the lock expired and was re-acquired elsewhere,
    /// the other holder's lock is left intact. Local state is reset either
    /// way.
    ///
    /// # Errors
    /// Returns a store error if the conditional delete could not be issued.
    pub async fn release(&mut self) -> Result<(), StoreError> {
        let Some(held) = self.held.take() else {
            return Ok(());
        };

        if !self
            .store
            .delete_if_value(&held.key, held.token.as_bytes())
            .await?
        {
            tracing::warn!(
                key = %held.key,
                "Lock no longer owned at release; leaving current holder's lock in place"
            );
        }
        Ok(())
    }
}
