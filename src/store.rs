use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::models::Listing;
use crate::utils::error::Result;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Published after every successful write.
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub key: String,
    pub listings: Vec<Listing>,
}

/// A single key-value cell holding the whole listing collection.
///
/// Reads and writes are wholesale and last-write-wins; there is no
/// transaction spanning a `get` and a later `set`. Change notifications
/// only reach handles in the same process: a write from another process
/// sharing the SQLite file is not announced.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get(&self) -> Result<Vec<Listing>>;
    async fn set(&self, listings: &[Listing]) -> Result<()>;
    /// Receives the new collection whenever any handle sharing this store
    /// writes the key.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// SQLite-backed store. Clones share the pool and the change channel.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    key: String,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, &config.storage_key).await
    }

    pub async fn with_pool(pool: SqlitePool, key: &str) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            pool,
            key: key.to_string(),
            changes,
        })
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn get(&self) -> Result<Vec<Listing>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        decode_collection(&self.key, &raw)
    }

    async fn set(&self, listings: &[Listing]) -> Result<()> {
        let value = serde_json::to_string(listings)?;
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(&self.key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!("Stored {} listings under '{}'", listings.len(), self.key);
        publish(&self.changes, &self.key, listings);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

/// In-process store, used for tests and ephemeral sessions.
pub struct MemoryStore {
    key: String,
    listings: RwLock<Vec<Listing>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new(key: &str) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            key: key.to_string(),
            listings: RwLock::new(Vec::new()),
            changes,
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn get(&self) -> Result<Vec<Listing>> {
        Ok(self.listings.read().await.clone())
    }

    async fn set(&self, listings: &[Listing]) -> Result<()> {
        *self.listings.write().await = listings.to_vec();
        publish(&self.changes, &self.key, listings);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

fn publish(changes: &broadcast::Sender<StoreChange>, key: &str, listings: &[Listing]) {
    // Sending only fails when nobody is subscribed.
    let _ = changes.send(StoreChange {
        key: key.to_string(),
        listings: listings.to_vec(),
    });
}

/// A stored value that is not a list is treated as an empty collection.
fn decode_collection(key: &str, raw: &str) -> Result<Vec<Listing>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_array() {
        warn!("Stored value under '{}' is not a list; treating it as empty", key);
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value)?)
}
