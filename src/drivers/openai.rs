//! OpenAI-compatible chat completions backend.
//!
//! Works against any endpoint that speaks the `/chat/completions` request and
//! response shape; point `base_url` elsewhere to reuse it for compatible
//! providers.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::transport::HttpTransport;
use crate::{Error, Result};

use super::{CompletionBackend, PromptTemplate};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const CHAT_PATH: &str = "/chat/completions";

#[derive(Debug)]
pub struct OpenAiBackend {
    name: String,
    transport: HttpTransport,
    model: String,
    temperature: Option<f32>,
    template: PromptTemplate,
}

impl OpenAiBackend {
    pub fn configure(config: &BackendConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().unwrap_or(OPENAI_API_URL);
        Self::with_endpoint("openai", config, base_url)
    }

    /// Build a backend named `name` that talks to `base_url`, ignoring `config.base_url`.
    pub(crate) fn with_endpoint(name: &str, config: &BackendConfig, base_url: &str) -> Result<Self> {
        let token = config.require_token(name)?;
        let transport = HttpTransport::new(base_url, Some(token))?;
        Ok(Self {
            name: name.to_string(),
            transport,
            model: config
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            template: PromptTemplate::from_config(config.prompt_template.as_deref())?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn build_request(&self, language: &str, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": self.template.render(language, prompt) }
            ],
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    fn parse_response(&self, body: &Value) -> Result<String> {
        let first = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .ok_or_else(|| Error::backend(&self.name, "response contained no choices"))?;

        first
            .pointer("/message/content")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
            .ok_or_else(|| Error::backend(&self.name, "response contained no content"))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_completion(
        &self,
        cancel: &CancellationToken,
        language: &str,
        prompt: &str,
    ) -> Result<String> {
        let body = self.build_request(language, prompt);
        tracing::info!(backend = %self.name, model = %self.model, "requesting completion");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            r = self.transport.post_json(CHAT_PATH, &body) => r?,
        };
        self.parse_response(&response)
    }
}
