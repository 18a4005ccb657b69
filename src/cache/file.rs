//! File-backed cache store: one file per key.

use super::key::CacheKey;
use super::store::{missing_entry, CacheItem, CacheStore, StoreConfig};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct FileStore {
    config: StoreConfig,
    dir: PathBuf,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let dir = match config.dir.clone() {
            Some(d) => d,
            None => default_cache_dir()?,
        };
        Ok(Self { config, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> Result<PathBuf> {
        let name = self.config.storage_key(key);
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return Err(Error::validation_with_context(
                "cache key is not a valid file name",
                ErrorContext::new().with_details(name).with_source("file_store"),
            ));
        }
        Ok(self.dir.join(name))
    }

    async fn is_fresh(&self, path: &Path) -> bool {
        let Some(ttl) = self.config.ttl() else {
            return true;
        };
        match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => SystemTime::now()
                .duration_since(modified)
                .map(|age| age <= ttl)
                .unwrap_or(true),
            Err(_) => false,
        }
    }

    /// Unique per write: `<name>.<pid>.<n>.tmp`.
    fn tmp_path_for(&self, path: &Path) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(".{}.{}{}", std::process::id(), n, TMP_SUFFIX));
        PathBuf::from(tmp)
    }

    /// Whether a directory entry belongs to this store, including its temp files.
    fn owns(&self, file_name: &str) -> bool {
        let stored = match file_name.strip_suffix(TMP_SUFFIX) {
            Some(rest) => rest.rsplitn(3, '.').nth(2).unwrap_or(rest),
            None => file_name,
        };
        self.config.logical_key(stored).is_some()
    }

    fn io_error(&self, action: &str, path: &Path, e: std::io::Error) -> Error {
        Error::cache_with_context(
            format!("failed to {} cache entry", action),
            ErrorContext::new()
                .with_field_path(path.display().to_string())
                .with_details(e.to_string())
                .with_source("file_store"),
        )
    }
}

/// `$XDG_CACHE_HOME/completion-cache` or the platform equivalent.
pub fn default_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|d| d.join("completion-cache"))
        .ok_or_else(|| {
            Error::configuration_with_context(
                "cannot determine user cache directory",
                ErrorContext::new().with_field_path("cache.dir").with_source("file_store"),
            )
        })
}

#[async_trait]
impl CacheStore for FileStore {
    fn is_disabled(&self) -> bool {
        !self.config.enabled
    }

    async fn exists(&self, key: &CacheKey) -> bool {
        let Ok(path) = self.path_for(key) else {
            return false;
        };
        tokio::fs::try_exists(&path).await.unwrap_or(false) && self.is_fresh(&path).await
    }

    async fn load(&self, key: &CacheKey) -> Result<String> {
        let path = self.path_for(key)?;
        if !self.is_fresh(&path).await {
            return Err(missing_entry(self.name(), key.as_str()));
        }
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                missing_entry(self.name(), key.as_str())
            } else {
                self.io_error("read", &path, e)
            }
        })
    }

    async fn store(&self, key: &CacheKey, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.io_error("create directory for", &self.dir, e))?;
        // Each writer renames its own complete file into place; last rename wins.
        let tmp = self.tmp_path_for(&path);
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error("write", &tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error("commit", &path, e));
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error("remove", &path, e)),
        }
    }

    async fn list(&self) -> Result<Vec<CacheItem>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error("list", &self.dir, e)),
        };
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(TMP_SUFFIX) {
                continue;
            }
            let Some(key) = self.config.logical_key(&name) else {
                continue;
            };
            let meta = entry.metadata().await?;
            if !meta.is_file() || !self.is_fresh(&entry.path()).await {
                continue;
            }
            items.push(CacheItem {
                key: key.to_string(),
                size: meta.len() as usize,
                updated_at: meta.modified().ok(),
            });
        }
        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }

    /// Removes every entry regardless of age, plus leftover temp files.
    async fn clear(&self) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(self.io_error("list", &self.dir, e)),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.owns(&name) || !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(self.io_error("remove", &path, e)),
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
