//! Redis Backend Module
//!
//! Production key-value backend talking to a Redis server.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{error, info, warn};

use crate::error::{Result, StoreError};
use crate::store::KeyValueBackend;

/// Upper bound on opening a connection and answering the first PING.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// == Redis Backend ==
/// Key-value backend over a multiplexed Redis connection.
///
/// The connection is cheap to clone; every command works on its own clone.
#[derive(Clone)]
pub struct RedisBackend {
    conn: MultiplexedConnection,
    url: String,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").field("url", &self.url).finish()
    }
}

impl RedisBackend {
    /// Opens a connection to `url` and verifies it with PING.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_timeout(url, CONNECT_TIMEOUT).await
    }

    /// Like [`connect`](Self::connect), giving up once `timeout` has passed.
    pub async fn connect_with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        tokio::time::timeout(timeout, Self::open(url))
            .await
            .map_err(|_| {
                StoreError::Backend(format!(
                    "Timed out after {:?} connecting to {}",
                    timeout,
                    redacted(url)
                ))
            })?
    }

    async fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;

        let backend = Self {
            conn,
            url: url.to_string(),
        };
        backend.ping().await?;
        Ok(backend)
    }

    /// Tries each URL in order and returns the first backend that answers.
    pub async fn discover(urls: &[String]) -> Result<Self> {
        for url in urls {
            info!("Testing connection to: {}", redacted(url));
            match Self::connect(url).await {
                Ok(backend) => {
                    info!("Connection established");
                    return Ok(backend);
                }
                Err(e) => warn!("Connection error from {}: {}", redacted(url), e),
            }
        }

        error!("*** FATAL ERROR: Could not connect to the Redis Service");
        Err(StoreError::Backend(
            "Could not connect to the Redis Service".to_string(),
        ))
    }
}

/// Hides the password part of a `redis://:password@host` URL for logging.
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys("*").await?;
        Ok(keys)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        let next: i64 = conn.incr(key, 1).await?;
        Ok(next)
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHALL").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_hides_password() {
        assert_eq!(
            redacted("redis://:s3cret@cache.example.com:6379"),
            "redis://***@cache.example.com:6379"
        );
        assert_eq!(redacted("redis://127.0.0.1:6379"), "redis://127.0.0.1:6379");
    }

    #[tokio::test]
    async fn test_connect_times_out_on_silent_server() {
        // Accepts TCP connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("redis://{}", listener.local_addr().unwrap());

        let started = std::time::Instant::now();
        let result = RedisBackend::connect_with_timeout(&url, Duration::from_millis(200)).await;

        match result {
            Err(StoreError::Backend(msg)) => assert!(msg.contains("Timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[tokio::test]
    async fn test_discover_with_no_candidates_fails() {
        let result = RedisBackend::discover(&[]).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
