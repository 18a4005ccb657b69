//! Recording collaborators shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use completion_cache::cache::{CacheItem, CacheKey, CacheStore, MemoryStore};
use completion_cache::drivers::CompletionBackend;
use completion_cache::{CancellationToken, Error, ErrorContext, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Backend that replies from a script and remembers every prompt.
#[derive(Debug)]
pub struct ScriptedBackend {
    name: String,
    reply: std::result::Result<String, (u16, String)>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    pub fn replying(text: &str) -> Self {
        Self::new(Ok(text.to_string()))
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self::new(Err((status, message.to_string())))
    }

    fn new(reply: std::result::Result<String, (u16, String)>) -> Self {
        Self {
            name: "myclient".into(),
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_completion(
        &self,
        cancel: &CancellationToken,
        language: &str,
        prompt: &str,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((language.to_string(), prompt.to_string()));
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err((status, message)) => Err(Error::Remote {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Memory store that records writes and can be told to misbehave.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    disabled: bool,
    fail_load: bool,
    fail_store: bool,
    stores: Mutex<Vec<(String, String)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self { disabled: true, ..Self::default() }
    }

    pub fn failing_loads() -> Self {
        Self { fail_load: true, ..Self::default() }
    }

    pub fn failing_stores() -> Self {
        Self { fail_store: true, ..Self::default() }
    }

    pub fn stores(&self) -> Vec<(String, String)> {
        self.stores.lock().unwrap().clone()
    }

    /// Put a raw payload in place without recording it as a client write.
    pub async fn seed(&self, key: &CacheKey, payload: &str) {
        self.inner.store(key, payload).await.unwrap();
    }
}

fn injected(what: &str) -> Error {
    Error::cache_with_context(what, ErrorContext::new().with_source("recording_store"))
}

#[async_trait]
impl CacheStore for RecordingStore {
    fn is_disabled(&self) -> bool {
        self.disabled
    }
    async fn exists(&self, key: &CacheKey) -> bool {
        self.inner.exists(key).await
    }
    async fn load(&self, key: &CacheKey) -> Result<String> {
        if self.fail_load {
            return Err(injected("injected load failure"));
        }
        self.inner.load(key).await
    }
    async fn store(&self, key: &CacheKey, value: &str) -> Result<()> {
        self.stores
            .lock()
            .unwrap()
            .push((key.hash.clone(), value.to_string()));
        if self.fail_store {
            return Err(injected("injected store failure"));
        }
        self.inner.store(key, value).await
    }
    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        self.inner.remove(key).await
    }
    async fn list(&self) -> Result<Vec<CacheItem>> {
        self.inner.list().await
    }
    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}
