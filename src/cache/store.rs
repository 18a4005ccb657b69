//! Cache store abstraction and in-process implementations.

use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};

/// Which store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// When false the client skips cache reads; writes still go through.
    pub enabled: bool,
    pub kind: StoreKind,
    /// Directory for the file store. Defaults to the user cache directory.
    pub dir: Option<PathBuf>,
    pub max_entries: usize,
    pub ttl_secs: Option<u64>,
    pub key_prefix: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { enabled: true, kind: StoreKind::File, dir: None, max_entries: 1000, ttl_secs: None, key_prefix: None }
    }
}

impl StoreConfig {
    pub fn new() -> Self { Self::default() }
    pub fn memory() -> Self { Self { kind: StoreKind::Memory, ..Self::default() } }
    pub fn with_enabled(mut self, enabled: bool) -> Self { self.enabled = enabled; self }
    pub fn with_kind(mut self, kind: StoreKind) -> Self { self.kind = kind; self }
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self { self.dir = Some(dir.into()); self }
    pub fn with_max_entries(mut self, n: usize) -> Self { self.max_entries = n; self }
    pub fn with_ttl(mut self, ttl: Duration) -> Self { self.ttl_secs = Some(ttl.as_secs()); self }
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self { self.key_prefix = Some(prefix.into()); self }

    pub fn ttl(&self) -> Option<Duration> { self.ttl_secs.map(Duration::from_secs) }

    /// Name under which `key` is physically stored.
    pub fn storage_key(&self, key: &CacheKey) -> String {
        match self.key_prefix {
            Some(ref p) => format!("{}:{}", p, key.hash),
            None => key.hash.clone(),
        }
    }

    /// Inverse of [`StoreConfig::storage_key`]; `None` for names outside this prefix.
    pub fn logical_key<'a>(&self, stored: &'a str) -> Option<&'a str> {
        match self.key_prefix {
            Some(ref p) => stored.strip_prefix(p.as_str())?.strip_prefix(':'),
            None => Some(stored),
        }
    }
}

/// One entry as reported by [`CacheStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    pub key: String,
    pub size: usize,
    pub updated_at: Option<SystemTime>,
}

/// Key/value text store consulted by the completion client.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Global read switch. A disabled store is never read, but still written.
    fn is_disabled(&self) -> bool;
    async fn exists(&self, key: &CacheKey) -> bool;
    async fn load(&self, key: &CacheKey) -> Result<String>;
    async fn store(&self, key: &CacheKey, value: &str) -> Result<()>;
    async fn remove(&self, key: &CacheKey) -> Result<bool>;
    async fn list(&self) -> Result<Vec<CacheItem>>;
    async fn clear(&self) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Open the store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new(config.clone())),
        StoreKind::File => Arc::new(super::file::FileStore::new(config.clone())?),
        StoreKind::Null => Arc::new(NullStore::new()),
    };
    tracing::debug!(store = store.name(), enabled = config.enabled, "opened cache store");
    Ok(store)
}

pub(crate) fn missing_entry(store: &str, key: &str) -> Error {
    Error::cache_with_context(
        "no cache entry for key",
        ErrorContext::new().with_details(key.to_string()).with_source(store.to_string()),
    )
}

struct MemoryEntry {
    value: String,
    stored_at: Instant,
    updated_at: SystemTime,
}

/// Bounded in-memory LRU store with optional TTL.
pub struct MemoryStore {
    config: StoreConfig,
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { config, entries: Mutex::new(LruCache::new(cap)) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, MemoryEntry>>> {
        self.entries.lock().map_err(|_| {
            Error::cache_with_context("memory store poisoned", ErrorContext::new().with_source("memory_store"))
        })
    }

    fn is_expired(&self, entry: &MemoryEntry) -> bool {
        self.config.ttl().is_some_and(|ttl| entry.stored_at.elapsed() > ttl)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::memory())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn is_disabled(&self) -> bool {
        !self.config.enabled
    }
    async fn exists(&self, key: &CacheKey) -> bool {
        let name = self.config.storage_key(key);
        match self.lock() {
            Ok(entries) => entries.peek(&name).is_some_and(|e| !self.is_expired(e)),
            Err(_) => false,
        }
    }
    async fn load(&self, key: &CacheKey) -> Result<String> {
        let name = self.config.storage_key(key);
        let mut entries = self.lock()?;
        let expired = match entries.get(&name) {
            Some(e) if !self.is_expired(e) => return Ok(e.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&name);
        }
        Err(missing_entry(self.name(), &name))
    }
    async fn store(&self, key: &CacheKey, value: &str) -> Result<()> {
        let name = self.config.storage_key(key);
        let entry = MemoryEntry { value: value.to_string(), stored_at: Instant::now(), updated_at: SystemTime::now() };
        self.lock()?.put(name, entry);
        Ok(())
    }
    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let name = self.config.storage_key(key);
        Ok(self.lock()?.pop(&name).is_some())
    }
    async fn list(&self) -> Result<Vec<CacheItem>> {
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter(|(_, e)| !self.is_expired(e))
            .filter_map(|(name, e)| {
                self.config.logical_key(name).map(|k| CacheItem {
                    key: k.to_string(),
                    size: e.value.len(),
                    updated_at: Some(e.updated_at),
                })
            })
            .collect())
    }
    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Store that keeps nothing and reports itself disabled.
pub struct NullStore;
impl NullStore {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for NullStore {
    fn is_disabled(&self) -> bool {
        true
    }
    async fn exists(&self, _: &CacheKey) -> bool {
        false
    }
    async fn load(&self, key: &CacheKey) -> Result<String> {
        Err(missing_entry(self.name(), key.as_str()))
    }
    async fn store(&self, _: &CacheKey, _: &str) -> Result<()> {
        Ok(())
    }
    async fn remove(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn list(&self) -> Result<Vec<CacheItem>> {
        Ok(Vec::new())
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
