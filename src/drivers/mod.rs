//! Completion backends.
//!
//! Every provider implements [`CompletionBackend`]; the concrete variant is
//! chosen once, at configuration time, through [`BackendKind::build`]. The
//! client only ever holds an `Arc<dyn CompletionBackend>`.

pub mod netd;
pub mod noop;
pub mod openai;
mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::{Error, ErrorContext, Result};

pub use netd::NetdBackend;
pub use noop::NoopBackend;
pub use openai::OpenAiBackend;
pub use prompt::{PromptTemplate, DEFAULT_PROMPT_TEMPLATE};

/// A remote (or local) service that turns a prompt into text.
///
/// Implementations perform exactly one attempt per call: no retry, no
/// backoff. Network I/O must stop when `cancel` fires, returning
/// [`Error::Cancelled`].
#[async_trait]
pub trait CompletionBackend: Send + Sync + std::fmt::Debug {
    /// Stable identifier, used as the client identity in cache keys.
    fn name(&self) -> &str;

    async fn get_completion(
        &self,
        cancel: &CancellationToken,
        language: &str,
        prompt: &str,
    ) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "netd")]
    Netd,
    #[serde(rename = "noop")]
    Noop,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::OpenAi, BackendKind::Netd, BackendKind::Noop];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Netd => "netd",
            BackendKind::Noop => "noop",
        }
    }

    /// Construct the backend, failing with a configuration error when it is unusable.
    pub fn build(&self, config: &BackendConfig) -> Result<Arc<dyn CompletionBackend>> {
        let backend: Arc<dyn CompletionBackend> = match self {
            BackendKind::OpenAi => Arc::new(OpenAiBackend::configure(config)?),
            BackendKind::Netd => Arc::new(NetdBackend::configure(config)?),
            BackendKind::Noop => Arc::new(NoopBackend::configure(config)?),
        };
        tracing::debug!(backend = backend.name(), "configured completion backend");
        Ok(backend)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = BackendKind::ALL.iter().map(|k| k.as_str()).collect();
                Error::configuration_with_context(
                    format!("unknown backend '{}'", s),
                    ErrorContext::new()
                        .with_field_path("backend")
                        .with_details(format!("expected one of: {}", known.join(", "))),
                )
            })
    }
}
