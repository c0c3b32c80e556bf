//! Whole-document persistence for the cache.
//!
//! Stores read and replace the full [`CacheDocument`]; there is no row-level
//! access and no locking. Two processes writing the same file race and the
//! last writer wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{PingOneError, PingOneResult};

use super::{io, CacheDocument};

/// Durable medium for the cache document.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the full document. A store that was never written reads as empty.
    async fn read(&self) -> PingOneResult<CacheDocument>;

    /// Replace the full document.
    async fn write(&self, document: &CacheDocument) -> PingOneResult<()>;

    /// Where the document lives, for error reporting.
    fn location(&self) -> &Path;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn read(&self) -> PingOneResult<CacheDocument> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "cache document absent, starting empty");
                return Ok(CacheDocument::new());
            }
            Err(e) => {
                return Err(PingOneError::persistence(
                    &self.path,
                    format!("failed to read cache document: {e}"),
                ))
            }
        };

        if content.trim().is_empty() {
            return Ok(CacheDocument::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            PingOneError::persistence(&self.path, format!("malformed cache document: {e}"))
        })
    }

    async fn write(&self, document: &CacheDocument) -> PingOneResult<()> {
        let content = serde_json::to_string_pretty(document).map_err(|e| {
            PingOneError::persistence(&self.path, format!("failed to serialize cache: {e}"))
        })?;
        io::write_atomic(&self.path, &content).await?;
        debug!(path = %self.path.display(), entries = document.len(), "cache document written");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Process-local document. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<CacheDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn read(&self) -> PingOneResult<CacheDocument> {
        Ok(self.document.read().await.clone())
    }

    async fn write(&self, document: &CacheDocument) -> PingOneResult<()> {
        *self.document.write().await = document.clone();
        Ok(())
    }

    fn location(&self) -> &Path {
        Path::new(":memory:")
    }
}
