//! Item Store Module
//!
//! CRUD for items on top of a key-value backend.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, StoreBackend};
use crate::error::{Result, StoreError};
use crate::store::{Item, KeyValueBackend, MemoryBackend, RedisBackend, INDEX_KEY};

// == Item Store ==
/// Persists items into a key-value backend, one key per item id.
///
/// Ids come from an auto-increment counter kept under [`INDEX_KEY`] in the
/// same keyspace. Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct ItemStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStore").finish_non_exhaustive()
    }
}

impl ItemStore {
    // == Constructor ==
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Creates a store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Opens the backend selected by `config.store_backend`.
    ///
    /// Redis is discovered from `config.redis_urls` and fails when no candidate answers.
    pub async fn open(config: &Config) -> Result<Self> {
        match config.store_backend {
            StoreBackend::Redis => {
                let backend = RedisBackend::discover(&config.redis_urls).await?;
                Ok(Self::new(Arc::new(backend)))
            }
            StoreBackend::Memory => {
                warn!("Using the in-memory backend; items are lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Checks that the backend is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    // == Save ==
    /// Writes the item, assigning the next id first when `item.id == 0`.
    ///
    /// Fails without touching the backend when the name is empty.
    pub async fn save(&self, item: &mut Item) -> Result<()> {
        if item.name.is_empty() {
            return Err(StoreError::Validation(
                "name attribute is not set".to_string(),
            ));
        }

        if item.id == 0 {
            item.id = self.next_index().await?;
        }

        self.backend
            .set(&item.id.to_string(), item.to_record()?)
            .await?;
        debug!("Saved item {}", item.id);
        Ok(())
    }

    // == Delete ==
    pub async fn delete(&self, item: &Item) -> Result<()> {
        self.backend.delete(&item.id.to_string()).await?;
        debug!("Deleted item {}", item.id);
        Ok(())
    }

    // == Find ==
    /// Looks up a single item by id.
    pub async fn find(&self, id: u64) -> Result<Option<Item>> {
        let key = id.to_string();
        match self.backend.get(&key).await? {
            Some(raw) => Ok(Some(Item::from_record(&key, &raw)?)),
            None => Ok(None),
        }
    }

    // == All ==
    /// Returns every stored item in backend iteration order.
    pub async fn all(&self) -> Result<Vec<Item>> {
        self.scan(|_| true).await
    }

    // == Remove All ==
    /// Flushes the entire keyspace, id counter included.
    pub async fn remove_all(&self) -> Result<()> {
        self.backend.flush_all().await?;
        warn!("All items removed");
        Ok(())
    }

    /// Reads every record except the counter and keeps those matching `keep`.
    ///
    /// Records that fail to decode are skipped.
    pub(crate) async fn scan<F>(&self, keep: F) -> Result<Vec<Item>>
    where
        F: Fn(&Item) -> bool + Send,
    {
        let mut results = Vec::new();

        for key in self.backend.keys().await? {
            if key == INDEX_KEY {
                continue;
            }

            // Deleted between KEYS and GET.
            let Some(raw) = self.backend.get(&key).await? else {
                continue;
            };

            match Item::from_record(&key, &raw) {
                Ok(item) if keep(&item) => results.push(item),
                Ok(_) => {}
                Err(e) => warn!("Skipping record: {}", e),
            }
        }

        Ok(results)
    }

    async fn next_index(&self) -> Result<u64> {
        let next = self.backend.incr(INDEX_KEY).await?;
        u64::try_from(next)
            .map_err(|_| StoreError::Backend(format!("Invalid id counter value {}", next)))
    }
}
