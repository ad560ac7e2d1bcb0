//! Key-Value Backend Module
//!
//! The narrow set of Redis-style commands the item store is built on.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value storage the item store persists records into.
///
/// Mirrors the subset of Redis commands the store needs, so the production
/// Redis connection and the in-memory map used by tests are interchangeable.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Checks that the backend is reachable (`PING`).
    async fn ping(&self) -> Result<()>;

    /// Reads the raw value under `key` (`GET`).
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value (`SET`).
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Removes `key`, returning whether it existed (`DEL`).
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Lists every key in the keyspace (`KEYS *`).
    async fn keys(&self) -> Result<Vec<String>>;

    /// Atomically increments the integer under `key`, starting from 0 (`INCR`).
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Drops the whole keyspace (`FLUSHALL`).
    async fn flush_all(&self) -> Result<()>;
}
