//! Cache-backed completion client.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod policy;

pub use builder::CompletionClientBuilder;
pub use self::core::CompletionClient;
pub use policy::{CacheLookup, CompletionOutcome, CompletionSource, DecodeFailurePolicy, StoreOutcome};
