//! Client and backend configuration.
//!
//! Configuration is plain data (serde) so it can be loaded from YAML:
//!
//! ```yaml
//! backend: openai
//! language: english
//! backend_config:
//!   model: gpt-4o-mini
//!   base_url: https://api.openai.com/v1
//! cache:
//!   kind: file
//!   enabled: true
//! decode_failure: return_empty
//! ```
//!
//! Secrets are normally not written to the file. When `backend_config.token`
//! is absent the token is looked up in the OS keyring (service
//! `completion-cache`, user = backend name) and then in `<BACKEND>_API_KEY`.

use crate::cache::StoreConfig;
use crate::client::DecodeFailurePolicy;
use crate::drivers::BackendKind;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const KEYRING_SERVICE: &str = "completion-cache";

/// Default language hint passed to backends.
pub const DEFAULT_LANGUAGE: &str = "english";

/// `openai` -> `OPENAI_API_KEY`, `my-proxy` -> `MY_PROXY_API_KEY`.
pub fn token_env_var(backend: &str) -> String {
    format!("{}_API_KEY", backend.to_uppercase().replace('-', "_"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub token: Option<String>,
    pub model: Option<String>,
    /// Alternate OpenAI-compatible endpoint.
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    /// Template with `{language}` and `{prompt}` placeholders.
    pub prompt_template: Option<String>,
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Token for `backend`: explicit config, then keyring, then environment.
    pub fn resolve_token(&self, backend: &str) -> Option<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.trim().is_empty()) {
            return Some(token.clone());
        }

        if let Ok(entry) = Entry::new(KEYRING_SERVICE, backend) {
            if let Ok(token) = entry.get_password() {
                return Some(token);
            }
        }

        env::var(token_env_var(backend)).ok().filter(|t| !t.trim().is_empty())
    }

    /// Like [`BackendConfig::resolve_token`] but a missing token is a configuration error.
    pub fn require_token(&self, backend: &str) -> Result<String> {
        self.resolve_token(backend).ok_or_else(|| {
            Error::configuration_with_context(
                format!("no API token configured for backend '{}'", backend),
                ErrorContext::new()
                    .with_field_path("backend_config.token")
                    .with_details(format!(
                        "set it in the config file, the OS keyring or {}",
                        token_env_var(backend)
                    ))
                    .with_source("backend_config"),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendKind,
    pub language: String,
    pub backend_config: BackendConfig,
    pub cache: StoreConfig,
    pub decode_failure: DecodeFailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            backend_config: BackendConfig::default(),
            cache: StoreConfig::default(),
            decode_failure: DecodeFailurePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                "cannot read config file",
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(e.to_string())
                    .with_source("client_config"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }
        match Self::default_path() {
            Some(p) if p.is_file() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }

    /// `$XDG_CONFIG_HOME/completion-cache/config.yaml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("completion-cache").join("config.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(Error::validation_with_context(
                "language must not be empty",
                ErrorContext::new().with_field_path("language").with_source("client_config"),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(Error::validation_with_context(
                "max_entries must be at least 1",
                ErrorContext::new().with_field_path("cache.max_entries").with_source("client_config"),
            ));
        }
        Ok(())
    }
}
