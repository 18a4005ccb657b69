//! Offline backend that echoes the prompt. Needs no credentials.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::{Error, Result};

use super::CompletionBackend;

#[derive(Debug, Default)]
pub struct NoopBackend;

impl NoopBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn configure(_config: &BackendConfig) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait]
impl CompletionBackend for NoopBackend {
    fn name(&self) -> &str {
        "noop"
    }

    async fn get_completion(
        &self,
        cancel: &CancellationToken,
        _language: &str,
        prompt: &str,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(format!("I am a noop response to the prompt {}", prompt))
    }
}
