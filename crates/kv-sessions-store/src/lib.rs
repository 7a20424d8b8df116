//! Lock-guarded session persistence over a key-value store.
//!
//! Provides:
//! - `SessionLock` - Per-session distributed spin lock
//! - `SessionStore` - Lock-guarded session read/write/destroy
//! - Backend implementations (memory)

pub mod backend;
pub mod lock;
pub mod store;

pub use lock::{LockError, SessionLock};
pub use store::{SessionError, SessionStore};
