use crate::cache::{decode_payload, derive_key, encode_payload, join_fragments, CacheKey, CacheStore};
use crate::client::builder::CompletionClientBuilder;
use crate::client::policy::{CacheLookup, CompletionOutcome, CompletionSource, DecodeFailurePolicy, StoreOutcome};
use crate::drivers::CompletionBackend;
use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Read-through/write-through cache in front of a completion backend.
///
/// Holds no mutable state; share it behind an `Arc` and call it concurrently.
/// Identical concurrent requests may both reach the backend.
pub struct CompletionClient {
    pub(crate) backend: Arc<dyn CompletionBackend>,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) language: String,
    pub(crate) client_name: String,
    pub(crate) decode_failure: DecodeFailurePolicy,
}

impl CompletionClient {
    pub fn builder() -> CompletionClientBuilder {
        CompletionClientBuilder::new()
    }

    /// Client identified by the backend's own name, with the default decode policy.
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        store: Arc<dyn CacheStore>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            client_name: backend.name().to_string(),
            backend,
            store,
            language: language.into(),
            decode_failure: DecodeFailurePolicy::default(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn backend(&self) -> &Arc<dyn CompletionBackend> {
        &self.backend
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn decode_failure_policy(&self) -> DecodeFailurePolicy {
        self.decode_failure
    }

    pub fn cache_key<S: AsRef<str>>(&self, fragments: &[S]) -> CacheKey {
        derive_key(&self.client_name, &self.language, fragments)
    }

    /// Consult the store. Never fails: store faults degrade to [`CacheLookup::Miss`].
    pub async fn lookup(&self, key: &CacheKey) -> CacheLookup {
        if self.store.is_disabled() {
            debug!(store = self.store.name(), "cache reads disabled");
            return CacheLookup::Miss;
        }
        if !self.store.exists(key).await {
            return CacheLookup::Miss;
        }

        let payload = match self.store.load(key).await {
            Ok(p) => p,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to load cached entry, treating as miss");
                return CacheLookup::Miss;
            }
        };
        if payload.is_empty() {
            return CacheLookup::Miss;
        }

        match decode_payload(&payload) {
            Ok(text) => CacheLookup::Hit(text),
            Err(e) => {
                warn!(key = %key, error = %e, "error decoding cached data");
                CacheLookup::DecodeError(e.to_string())
            }
        }
    }

    /// Encode and store `text`. Never fails: store faults are reported in the outcome.
    pub async fn write_through(&self, key: &CacheKey, text: &str) -> StoreOutcome {
        match self.store.store(key, &encode_payload(text)).await {
            Ok(()) => StoreOutcome::Stored,
            Err(e) => {
                warn!(key = %key, error = %e, "error storing value to cache");
                StoreOutcome::StoreFailed(e.to_string())
            }
        }
    }

    /// Return the completion for `fragments`, reusing a cached response when present.
    ///
    /// Backend errors (including cancellation) are returned unchanged and
    /// leave the cache untouched. Cache faults are logged, not returned.
    pub async fn complete<S: AsRef<str> + Sync>(
        &self,
        cancel: &CancellationToken,
        fragments: &[S],
    ) -> Result<String> {
        self.complete_detailed(cancel, fragments).await.map(|o| o.text)
    }

    /// [`CompletionClient::complete`] with the cache decisions made visible.
    #[instrument(skip_all, fields(backend = %self.client_name, language = %self.language))]
    pub async fn complete_detailed<S: AsRef<str> + Sync>(
        &self,
        cancel: &CancellationToken,
        fragments: &[S],
    ) -> Result<CompletionOutcome> {
        let key = self.cache_key(fragments);

        match self.lookup(&key).await {
            CacheLookup::Hit(text) => {
                debug!(key = %key, "cache hit");
                return Ok(CompletionOutcome { text, source: CompletionSource::Cache, key, store: None });
            }
            CacheLookup::DecodeError(_) if self.decode_failure == DecodeFailurePolicy::ReturnEmpty => {
                return Ok(CompletionOutcome {
                    text: String::new(),
                    source: CompletionSource::DecodeFailure,
                    key,
                    store: None,
                });
            }
            CacheLookup::DecodeError(_) => debug!(key = %key, "corrupt entry, falling through to backend"),
            CacheLookup::Miss => debug!(key = %key, "cache miss"),
        }

        let prompt = join_fragments(fragments);
        info!(key = %key, backend = self.backend.name(), "requesting completion");
        let text = match self.backend.get_completion(cancel, &self.language, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "error getting completion");
                return Err(e);
            }
        };

        let store = self.write_through(&key, &text).await;
        Ok(CompletionOutcome { text, source: CompletionSource::Backend, key, store: Some(store) })
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("backend", &self.backend)
            .field("store", &self.store.name())
            .field("language", &self.language)
            .field("client_name", &self.client_name)
            .field("decode_failure", &self.decode_failure)
            .finish()
    }
}
