//! Filesystem helpers for the cache document.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;

use crate::error::{PingOneError, PingOneResult};

pub(crate) fn default_cache_dir() -> PingOneResult<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| PingOneError::config("could not determine cache directory"))?;

    Ok(base.join("pingone"))
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sibling temp path unique to this process and call.
fn temp_path_for(path: &Path) -> PathBuf {
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
}

/// Replace `path` with `content` via a sibling temp file and rename.
///
/// Each call writes its own temp file, so overlapping writers never see
/// each other's partial output. The last rename wins.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> PingOneResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|e| {
            PingOneError::persistence(path, format!("failed to create directory: {e}"))
        })?;
    }

    let temp_path = temp_path_for(path);

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(PingOneError::persistence(
            path,
            format!("failed to write temp file: {e}"),
        ));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(PingOneError::persistence(
            path,
            format!("failed to rename temp file: {e}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("cache.json");

        write_atomic(&path, "{}").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "{}");
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("cache.json")]);
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        write_atomic(&path, "{\"a\":1}").await.unwrap();
        write_atomic(&path, "{\"b\":2}").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "{\"b\":2}");
    }

    #[test]
    fn test_temp_paths_are_unique_siblings() {
        let path = Path::new("/tmp/x/cache.json");
        let a = temp_path_for(path);
        let b = temp_path_for(path);
        assert_ne!(a, b);
        assert_eq!(a.parent(), path.parent());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_writes_all_succeed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let mut handles = Vec::new();
        for i in 0..16 {
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                let body = format!("{{\"writer\":{i}}}");
                write_atomic(&path, &body).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let text = fs::read_to_string(&path).await.unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(doc["writer"].is_u64());
    }
}
