//! Destination persistence
//!
//! A destination is created the first time a place name is geocoded and
//! reused unchanged afterwards. Both stores run the existence check and the
//! insert as one atomic step, so concurrent or abandoned requests for a new
//! name create exactly one record.

use crate::config::{StoreBackend, StoreConfig};
use crate::models::{Destination, NewDestination};
use crate::{PlannerError, Result};
use async_trait::async_trait;
use fjall::{KeyspaceCreateOptions, Readable, SingleWriterTxDatabase, SingleWriterTxKeyspace};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info};

#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Return the destination called `name`, creating it from `defaults` if absent.
    ///
    /// The flag is `true` when this call created the record.
    async fn find_or_create(
        &self,
        name: &str,
        defaults: NewDestination,
    ) -> Result<(Destination, bool)>;

    async fn get(&self, name: &str) -> Result<Option<Destination>>;
}

/// Open the store selected by `config.backend`
pub fn from_config(config: &StoreConfig) -> Result<Arc<dyn DestinationStore>> {
    Ok(match config.backend {
        StoreBackend::Fjall => Arc::new(FjallDestinationStore::open(&config.location)?),
        StoreBackend::Memory => Arc::new(MemoryDestinationStore::default()),
    })
}

/// Destinations in an embedded fjall keyspace, values postcard-encoded
pub struct FjallDestinationStore {
    db: SingleWriterTxDatabase,
    store: SingleWriterTxKeyspace,
}

fn decode(bytes: &[u8]) -> Result<Destination> {
    postcard::from_bytes(bytes)
        .map_err(|e| PlannerError::store(format!("Corrupt destination record: {e}")))
}

fn get_from_store(store: &SingleWriterTxKeyspace, key: &[u8]) -> Result<Option<Destination>> {
    let Some(bytes) = store
        .get(key)
        .map_err(|e| PlannerError::store(format!("Failed to read destination: {e}")))?
        .map(|v| v.to_vec())
    else {
        return Ok(None);
    };
    Ok(Some(decode(&bytes)?))
}

/// Read-or-insert in one write transaction; fjall serialises write
/// transactions, so the check and the insert cannot interleave with another
fn find_or_insert(
    db: &SingleWriterTxDatabase,
    store: &SingleWriterTxKeyspace,
    name: String,
    defaults: NewDestination,
) -> Result<(Destination, bool)> {
    let mut tx = db.write_tx();

    let existing = tx
        .get(store, name.as_bytes())
        .map_err(|e| PlannerError::store(format!("Failed to read destination: {e}")))?;
    if let Some(bytes) = existing {
        debug!("Destination found");
        return Ok((decode(&bytes)?, false));
    }

    let destination = defaults.into_destination(name);
    let bytes = postcard::to_stdvec(&destination)
        .map_err(|e| PlannerError::store(format!("Failed to encode destination: {e}")))?;
    tx.insert(store, destination.name.as_bytes().to_vec(), bytes);
    tx.commit()
        .map_err(|e| PlannerError::store(format!("Failed to write destination: {e}")))?;
    debug!("Destination created");
    Ok((destination, true))
}

impl FjallDestinationStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = SingleWriterTxDatabase::builder(path)
            .open()
            .map_err(|e| PlannerError::store(format!("Failed to open {}: {e}", path.display())))?;
        let store = db
            .keyspace("destinations", KeyspaceCreateOptions::default)
            .map_err(|e| PlannerError::store(format!("Failed to open keyspace: {e}")))?;
        info!("Opened destination store at {}", path.display());
        Ok(Self { db, store })
    }
}

#[async_trait]
impl DestinationStore for FjallDestinationStore {
    #[tracing::instrument(name = "find_or_create_destination", level = "debug", skip(self, defaults))]
    async fn find_or_create(
        &self,
        name: &str,
        defaults: NewDestination,
    ) -> Result<(Destination, bool)> {
        let db = self.db.clone();
        let store = self.store.clone();
        let name = name.to_string();
        task::spawn_blocking(move || find_or_insert(&db, &store, name, defaults))
            .await
            .map_err(|e| PlannerError::store(format!("Store task failed: {e}")))?
    }

    #[tracing::instrument(name = "get_destination", level = "debug", skip(self))]
    async fn get(&self, name: &str) -> Result<Option<Destination>> {
        let store = self.store.clone();
        let key = name.as_bytes().to_vec();
        task::spawn_blocking(move || get_from_store(&store, &key))
            .await
            .map_err(|e| PlannerError::store(format!("Store task failed: {e}")))?
    }
}

/// Process-local store, mainly for tests and throwaway runs
#[derive(Default)]
pub struct MemoryDestinationStore {
    destinations: Mutex<HashMap<String, Destination>>,
}

impl MemoryDestinationStore {
    pub async fn len(&self) -> usize {
        self.destinations.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.destinations.lock().await.is_empty()
    }
}

#[async_trait]
impl DestinationStore for MemoryDestinationStore {
    async fn find_or_create(
        &self,
        name: &str,
        defaults: NewDestination,
    ) -> Result<(Destination, bool)> {
        let mut destinations = self.destinations.lock().await;
        if let Some(existing) = destinations.get(name) {
            return Ok((existing.clone(), false));
        }
        let destination = defaults.into_destination(name);
        destinations.insert(name.to_string(), destination.clone());
        Ok((destination, true))
    }

    async fn get(&self, name: &str) -> Result<Option<Destination>> {
        Ok(self.destinations.lock().await.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn defaults(country: &str, latitude: f64, longitude: f64) -> NewDestination {
        NewDestination {
            country: country.to_string(),
            latitude,
            longitude,
        }
    }

    async fn assert_find_or_create_is_idempotent(store: &dyn DestinationStore) {
        let (first, created) = store
            .find_or_create("Paris", defaults("France", 48.8566, 2.3522))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.country, "France");

        // different defaults must not overwrite the stored record
        let (second, created) = store
            .find_or_create("Paris", defaults("Texas", 33.66, -95.55))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second, first);

        assert_eq!(store.get("Paris").await.unwrap(), Some(first));
        assert_eq!(store.get("Lyon").await.unwrap(), None);
    }

    async fn assert_concurrent_creates_once(store: Arc<dyn DestinationStore>) {
        let handles: Vec<_> = (0..16_u32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .find_or_create("Oslo", defaults("Norway", 59.91, 10.75 + f64::from(i)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        let mut longitudes = Vec::new();
        for handle in handles {
            let (destination, was_created) = handle.await.unwrap();
            if was_created {
                created += 1;
            }
            longitudes.push(destination.longitude);
        }

        assert_eq!(created, 1);
        assert!(longitudes.windows(2).all(|pair| pair[0] == pair[1]));
    }

    async fn assert_abandoned_calls_create_once(store: Arc<dyn DestinationStore>) {
        for i in 0..8_u32 {
            let attempt =
                store.find_or_create("Bergen", defaults("Norway", 60.39, 5.32 + f64::from(i)));
            let _ = tokio::time::timeout(Duration::ZERO, attempt).await;
        }

        let (seen, _) = store
            .find_or_create("Bergen", defaults("Elsewhere", 0.0, 0.0))
            .await
            .unwrap();

        // abandoned calls may still be running on the blocking pool
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.get("Bergen").await.unwrap(), Some(seen));
    }

    #[tokio::test]
    async fn test_fjall_find_or_create() {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallDestinationStore::open(temp_dir.path()).unwrap();
        assert_find_or_create_is_idempotent(&store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fjall_concurrent_find_or_create() {
        let temp_dir = TempDir::new().unwrap();
        let store: Arc<dyn DestinationStore> =
            Arc::new(FjallDestinationStore::open(temp_dir.path()).unwrap());
        assert_concurrent_creates_once(store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fjall_abandoned_find_or_create() {
        let temp_dir = TempDir::new().unwrap();
        let store: Arc<dyn DestinationStore> =
            Arc::new(FjallDestinationStore::open(temp_dir.path()).unwrap());
        assert_abandoned_calls_create_once(store).await;
    }

    #[tokio::test]
    async fn test_memory_find_or_create() {
        let store = MemoryDestinationStore::default();
        assert_find_or_create_is_idempotent(&store).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_memory_concurrent_find_or_create() {
        assert_concurrent_creates_once(Arc::new(MemoryDestinationStore::default())).await;
    }

    #[test]
    fn test_from_config_memory() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            location: String::new(),
        };
        assert!(from_config(&config).is_ok());
    }
}
