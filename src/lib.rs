//! # completion-cache
//!
//! A caching front-end for remote text-completion backends. Identical
//! requests are answered from a cache instead of a second network call.
//!
//! ## Overview
//!
//! A request is an ordered list of prompt fragments plus a language hint.
//! [`CompletionClient::complete`] derives a deterministic key from the
//! backend name, the language and the base64-encoded joined prompt, reads the
//! [`cache::CacheStore`], and only on a miss calls the
//! [`drivers::CompletionBackend`]. Fresh responses are written back encoded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use completion_cache::cache::StoreConfig;
//! use completion_cache::config::BackendConfig;
//! use completion_cache::drivers::BackendKind;
//! use completion_cache::{CancellationToken, CompletionClient};
//!
//! #[tokio::main]
//! async fn main() -> completion_cache::Result<()> {
//!     let client = CompletionClient::builder()
//!         .backend_kind(BackendKind::OpenAi)
//!         .backend_config(BackendConfig::new().with_model("gpt-4o-mini"))
//!         .store_config(StoreConfig::new())
//!         .language("english")
//!         .build()?;
//!
//!     let answer = client
//!         .complete(&CancellationToken::new(), &["pod", "crashloopbackoff"])
//!         .await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Read-through/write-through completion client and builder |
//! | [`cache`] | Key derivation, payload codec and cache stores |
//! | [`drivers`] | Completion backends (OpenAI-compatible, netd, noop) |
//! | [`config`] | YAML-loadable client, backend and store configuration |
//! | [`transport`] | HTTP transport used by remote backends |

pub mod cache;
pub mod client;
pub mod config;
pub mod drivers;
pub mod transport;

pub use client::{
    CacheLookup, CompletionClient, CompletionClientBuilder, CompletionOutcome, CompletionSource,
    DecodeFailurePolicy, StoreOutcome,
};
pub use tokio_util::sync::CancellationToken;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
