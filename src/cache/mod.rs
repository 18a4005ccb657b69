//! Response caching: key derivation, payload encoding and pluggable stores.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`derive_key`] | Deterministic key from client name, language and prompt fragments |
//! | [`encode_payload`] / [`decode_payload`] | Reversible base64 encoding of cached text |
//! | [`CacheStore`] | Trait for key/value text stores with a global read switch |
//! | [`FileStore`] | One file per key, survives process restarts |
//! | [`MemoryStore`] | Bounded in-process LRU with optional TTL |
//! | [`NullStore`] | Always disabled, stores nothing |
//!
//! ## Example
//!
//! ```rust
//! use completion_cache::cache::{derive_key, encode_payload, CacheStore, MemoryStore};
//!
//! # async fn demo() -> completion_cache::Result<()> {
//! let store = MemoryStore::default();
//! let key = derive_key("openai", "english", &["pod", "crashloopbackoff"]);
//! store.store(&key, &encode_payload("Increase memory limits.")).await?;
//! assert!(store.exists(&key).await);
//! # Ok(())
//! # }
//! ```

mod codec;
mod file;
mod key;
mod store;

pub use codec::{decode_payload, encode_payload};
pub use file::{default_cache_dir, FileStore};
pub use key::{derive_key, join_fragments, key_for_encoded_body, CacheKey, FRAGMENT_SEPARATOR};
pub use store::{open_store, CacheItem, CacheStore, MemoryStore, NullStore, StoreConfig, StoreKind};
