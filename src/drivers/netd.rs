//! NETD.FUN backend: the OpenAI request shape against a fixed endpoint.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::Result;

use super::{CompletionBackend, OpenAiBackend};

pub const NETD_API_URL: &str = "https://netd.fun/v1";

#[derive(Debug)]
pub struct NetdBackend {
    inner: OpenAiBackend,
}

impl NetdBackend {
    /// The configured `base_url` is ignored; this provider has one endpoint.
    pub fn configure(config: &BackendConfig) -> Result<Self> {
        if let Some(ref url) = config.base_url {
            tracing::debug!(ignored = %url, "netd backend ignores base_url override");
        }
        Ok(Self {
            inner: OpenAiBackend::with_endpoint("netd", config, NETD_API_URL)?,
        })
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }
}

#[async_trait]
impl CompletionBackend for NetdBackend {
    fn name(&self) -> &str {
        "netd"
    }

    async fn get_completion(
        &self,
        cancel: &CancellationToken,
        language: &str,
        prompt: &str,
    ) -> Result<String> {
        self.inner.get_completion(cancel, language, prompt).await
    }
}
