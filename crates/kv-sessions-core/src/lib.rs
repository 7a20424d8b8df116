//! Core abstractions for locked session persistence.
//!
//! This crate provides the fundamental building blocks:
//! - `KeyValueStore` - The store trait the session layer is written against
//! - `Ttl` - Result of an expiry query
//! - `SessionConfig` - Timing, keyspace, and mode configuration
//! - Error types for the store and configuration layers

pub mod config;
pub mod store;

pub use config::{ConfigError, SessionConfig};
pub use store::{KeyValueStore, StoreError, Ttl};
