use crate::cache::CacheKey;
use serde::{Deserialize, Serialize};

/// What to do when a cached payload exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeFailurePolicy {
    /// Return an empty completion with no error and skip the backend.
    ///
    /// Long-standing behavior; callers with their own retry layer rely on it.
    #[default]
    ReturnEmpty,
    /// Treat the corrupt entry as a miss, call the backend and overwrite it.
    FallThrough,
}

/// Result of consulting the cache store for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(String),
    /// No entry, an empty entry, a load failure, or reads disabled.
    Miss,
    DecodeError(String),
}

/// Result of the best-effort write after a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    StoreFailed(String),
}

/// Where the text in a [`CompletionOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Cache,
    Backend,
    /// Empty text produced by [`DecodeFailurePolicy::ReturnEmpty`].
    DecodeFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub text: String,
    pub source: CompletionSource,
    pub key: CacheKey,
    /// Set only when the backend was called.
    pub store: Option<StoreOutcome>,
}

impl CompletionOutcome {
    pub fn is_cache_hit(&self) -> bool {
        self.source == CompletionSource::Cache
    }
}
