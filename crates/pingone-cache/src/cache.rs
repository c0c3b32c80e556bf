//! Credential-scoped TTL cache.
//!
//! The cache is cache-aside: [`ResourceCache::get`] never fetches a missing
//! value, callers populate it with [`ResourceCache::set`] after a miss.
//! Staleness is evaluated lazily on read; nothing is evicted.
//!
//! # Document format
//!
//! ```text
//! {
//!   "env1|cid1|EU": { "value": "pop-123", "timestamp": 1700000000000 },
//!   ...
//! }
//! ```
//!
//! Unknown fields inside an entry are kept across writes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{PingOneError, PingOneResult};
use crate::scope::CredentialScope;

pub(crate) mod io;
pub mod keys;
pub mod policy;
pub mod store;

pub use policy::DEFAULT_TTL_MS;
pub use store::{CacheStore, FileStore, MemoryStore};

/// Full persisted mapping from composed key to entry.
pub type CacheDocument = BTreeMap<String, CacheEntry>;

/// One cached value and when it was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque payload. `null` reads as a miss.
    #[serde(default)]
    pub value: serde_json::Value,

    /// Epoch milliseconds at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Fields written by other versions of the tool.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Snapshot of one entry, as reported by [`ResourceCache::entries`].
#[derive(Debug, Clone)]
pub struct EntryStatus {
    pub key: String,
    pub entry: CacheEntry,
    pub fresh: bool,
    /// Milliseconds since the entry was written, if it carries a timestamp.
    pub age_ms: Option<i64>,
}

/// Get/set facade over a [`CacheStore`].
#[derive(Clone)]
pub struct ResourceCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("location", &self.store.location())
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

impl ResourceCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// File-backed cache with the default 24 hour TTL.
    pub fn with_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(
            Arc::new(FileStore::new(path)),
            Duration::from_millis(DEFAULT_TTL_MS),
        )
    }

    /// In-memory cache with the given TTL.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Look up the value cached for `scope`.
    ///
    /// Returns `Ok(None)` when the entry is absent, expired or `null`. A fresh
    /// entry that does not decode as `T` is a persistence error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        scope: &CredentialScope,
    ) -> PingOneResult<Option<T>> {
        let key = scope.cache_key();
        let document = self.store.read().await?;
        let entry = document.get(&key);

        if policy::is_expired(entry, self.ttl_ms, self.clock.now_ms()) {
            debug!(key = %key, "cache miss");
            return Ok(None);
        }

        let Some(entry) = entry.filter(|e| !e.value.is_null()) else {
            debug!(key = %key, "cache entry has no value");
            return Ok(None);
        };

        let value = serde_json::from_value(entry.value.clone()).map_err(|e| {
            PingOneError::persistence(
                self.store.location(),
                format!("cached value for {key} has unexpected shape: {e}"),
            )
        })?;

        debug!(key = %key, "cache hit");
        Ok(Some(value))
    }

    /// Upsert the value for `scope`, stamped with the current time.
    ///
    /// Reads the whole document, replaces one entry, writes the whole
    /// document back. Fields of the previous entry that this version does not
    /// know about are kept.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        scope: &CredentialScope,
        value: &T,
    ) -> PingOneResult<()> {
        let key = scope.cache_key();
        let value = serde_json::to_value(value).map_err(|e| {
            PingOneError::persistence(
                self.store.location(),
                format!("value for {key} is not serializable: {e}"),
            )
        })?;

        let mut document = self.store.read().await?;
        let entry = document.entry(key.clone()).or_default();
        entry.value = value;
        entry.timestamp = Some(self.clock.now_ms());

        self.store.write(&document).await?;
        debug!(key = %key, "cache entry written");
        Ok(())
    }

    /// Every persisted entry with its freshness under this cache's TTL.
    pub async fn entries(&self) -> PingOneResult<Vec<EntryStatus>> {
        let now = self.clock.now_ms();
        let document = self.store.read().await?;

        Ok(document
            .into_iter()
            .map(|(key, entry)| {
                let fresh = !policy::is_expired(Some(&entry), self.ttl_ms, now);
                let age_ms = entry.timestamp.map(|t| now.saturating_sub(t));
                EntryStatus {
                    key,
                    entry,
                    fresh,
                    age_ms,
                }
            })
            .collect())
    }
}
