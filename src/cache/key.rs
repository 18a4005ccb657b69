//! Cache key derivation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Separator used to join prompt fragments into a single request body.
pub const FRAGMENT_SEPARATOR: &str = " ";

/// Identity of a cached completion. Two keys are equal exactly when their hashes are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
    pub fn as_str(&self) -> &str { &self.hash }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.hash) }
}

impl From<&str> for CacheKey { fn from(s: &str) -> Self { Self::new(s) } }
impl From<String> for CacheKey { fn from(s: String) -> Self { Self::new(s) } }

/// Join prompt fragments into the request body sent to the backend.
pub fn join_fragments<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}

/// Derive the cache key for a request.
///
/// The joined body is base64-encoded before it is combined with the client
/// name and language, so separators or newlines inside fragments cannot bleed
/// into the other fields.
pub fn derive_key<S: AsRef<str>>(client_name: &str, language: &str, fragments: &[S]) -> CacheKey {
    let body = join_fragments(fragments);
    key_for_encoded_body(client_name, language, &STANDARD.encode(body.as_bytes()))
}

/// Derive the cache key from an already base64-encoded request body.
pub fn key_for_encoded_body(client_name: &str, language: &str, encoded_body: &str) -> CacheKey {
    let mut parts: BTreeMap<&str, &str> = BTreeMap::new();
    parts.insert("client", client_name);
    parts.insert("language", language);
    parts.insert("body", encoded_body);
    let canonical = serde_json::to_string(&parts).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
    tracing::debug!(client = client_name, language, key = %hash, "derived cache key");
    CacheKey::new(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_give_same_key() {
        let a = derive_key("openai", "english", &["pod", "crashloopbackoff"]);
        let b = derive_key("openai", "english", &["pod", "crashloopbackoff"]);
        assert_eq!(a, b);
        assert_eq!(a.hash.len(), 64);
        assert!(a.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn key_matches_encoded_body_form() {
        let from_fragments = derive_key("myclient", "english", &["pod", "crashloopbackoff"]);
        let encoded = STANDARD.encode("pod crashloopbackoff");
        assert_eq!(from_fragments, key_for_encoded_body("myclient", "english", &encoded));
    }

    #[test]
    fn each_component_changes_the_key() {
        let base = derive_key("openai", "english", &["pod failed"]);
        assert_ne!(base, derive_key("netd", "english", &["pod failed"]));
        assert_ne!(base, derive_key("openai", "german", &["pod failed"]));
        assert_ne!(base, derive_key("openai", "english", &["pod failing"]));
    }

    #[test]
    fn fields_cannot_be_shifted_across_separators() {
        // A naive "client-language-body" join would collide here.
        let a = key_for_encoded_body("a-b", "c", "ZA==");
        let b = key_for_encoded_body("a", "b-c", "ZA==");
        assert_ne!(a, b);
    }

    #[test]
    fn fragment_boundaries_follow_the_space_join() {
        // Fragments are joined with one space, so these bodies are identical.
        assert_eq!(
            derive_key("openai", "english", &["a b", "c"]),
            derive_key("openai", "english", &["a", "b c"])
        );
        assert_ne!(
            derive_key("openai", "english", &["ab", "c"]),
            derive_key("openai", "english", &["a", "bc"])
        );
    }

    #[test]
    fn empty_and_unicode_fragments_are_well_defined() {
        let empty: [&str; 0] = [];
        let k = derive_key("openai", "english", &empty);
        assert_eq!(k, derive_key("openai", "english", &[""]));
        let uni = derive_key("openai", "日本語", &["ノード\nが\t落ちた"]);
        assert_ne!(k, uni);
    }

    #[test]
    fn key_equality_is_by_hash() {
        let derived = derive_key("myclient", "english", &["pod"]);
        assert_eq!(CacheKey::new(derived.hash.clone()), derived);
        assert_eq!(CacheKey::from(derived.as_str()), derived);
    }
}
