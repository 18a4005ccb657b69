use crate::cache::{open_store, CacheStore, StoreConfig};
use crate::client::core::CompletionClient;
use crate::client::policy::DecodeFailurePolicy;
use crate::config::{BackendConfig, ClientConfig, DEFAULT_LANGUAGE};
use crate::drivers::{BackendKind, CompletionBackend};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;

/// Builder for [`CompletionClient`].
///
/// Either inject ready-made collaborators (`backend`, `store`) or let the
/// builder construct them from `backend_kind` + `backend_config` and
/// `store_config`. Injected collaborators win.
pub struct CompletionClientBuilder {
    backend: Option<Arc<dyn CompletionBackend>>,
    backend_kind: Option<BackendKind>,
    backend_config: BackendConfig,
    store: Option<Arc<dyn CacheStore>>,
    store_config: Option<StoreConfig>,
    language: String,
    client_name: Option<String>,
    decode_failure: DecodeFailurePolicy,
}

impl CompletionClientBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            backend_kind: None,
            backend_config: BackendConfig::default(),
            store: None,
            store_config: None,
            language: DEFAULT_LANGUAGE.to_string(),
            client_name: None,
            decode_failure: DecodeFailurePolicy::default(),
        }
    }

    /// Seed every setting from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new()
            .backend_kind(config.backend)
            .backend_config(config.backend_config.clone())
            .store_config(config.cache.clone())
            .language(config.language.clone())
            .decode_failure(config.decode_failure)
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn backend_kind(mut self, kind: BackendKind) -> Self {
        self.backend_kind = Some(kind);
        self
    }

    pub fn backend_config(mut self, config: BackendConfig) -> Self {
        self.backend_config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = Some(config);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Override the identity used in cache keys. Defaults to the backend name.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failure = policy;
        self
    }

    pub fn build(self) -> Result<CompletionClient> {
        if self.language.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "language must not be empty",
                ErrorContext::new().with_field_path("language").with_source("client_builder"),
            ));
        }

        let backend = match (self.backend, self.backend_kind) {
            (Some(b), _) => b,
            (None, Some(kind)) => kind.build(&self.backend_config)?,
            (None, None) => {
                return Err(Error::configuration_with_context(
                    "no completion backend configured",
                    ErrorContext::new().with_field_path("backend").with_source("client_builder"),
                ))
            }
        };

        let store = match (self.store, self.store_config) {
            (Some(s), _) => s,
            (None, Some(cfg)) => open_store(&cfg)?,
            (None, None) => {
                return Err(Error::configuration_with_context(
                    "no cache store configured",
                    ErrorContext::new().with_field_path("cache").with_source("client_builder"),
                ))
            }
        };

        let client_name = self.client_name.unwrap_or_else(|| backend.name().to_string());
        tracing::debug!(
            backend = backend.name(),
            store = store.name(),
            client = %client_name,
            language = %self.language,
            "built completion client"
        );

        Ok(CompletionClient {
            backend,
            store,
            language: self.language,
            client_name,
            decode_failure: self.decode_failure,
        })
    }
}

impl Default for CompletionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, StoreKind};
    use crate::drivers::NoopBackend;

    #[test]
    fn requires_backend_and_store() {
        let err = CompletionClientBuilder::new()
            .store(Arc::new(MemoryStore::default()))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());

        let err = CompletionClientBuilder::new()
            .backend(Arc::new(NoopBackend::new()))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn builds_from_config() {
        let mut cfg = ClientConfig::default();
        cfg.backend = BackendKind::Noop;
        cfg.language = "spanish".into();
        cfg.cache.kind = StoreKind::Memory;
        cfg.decode_failure = DecodeFailurePolicy::FallThrough;

        let client = CompletionClientBuilder::from_config(&cfg).build().unwrap();
        assert_eq!(client.client_name(), "noop");
        assert_eq!(client.language(), "spanish");
        assert_eq!(client.store().name(), "memory");
        assert_eq!(client.decode_failure_policy(), DecodeFailurePolicy::FallThrough);
    }

    #[test]
    fn client_name_override_changes_keys() {
        let build = |name: Option<&str>| {
            let mut b = CompletionClientBuilder::new()
                .backend(Arc::new(NoopBackend::new()))
                .store(Arc::new(MemoryStore::default()));
            if let Some(n) = name {
                b = b.client_name(n);
            }
            b.build().unwrap()
        };
        let default = build(None);
        let renamed = build(Some("myclient"));
        assert_eq!(renamed.client_name(), "myclient");
        assert_ne!(default.cache_key(&["x"]), renamed.cache_key(&["x"]));
    }

    #[test]
    fn rejects_blank_language() {
        let err = CompletionClientBuilder::new()
            .backend(Arc::new(NoopBackend::new()))
            .store(Arc::new(MemoryStore::default()))
            .language(" ")
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
