//! Reversible text encoding for cached payloads.

use crate::{Error, ErrorContext, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode completion text for storage.
pub fn encode_payload(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a stored payload back into completion text.
pub fn decode_payload(payload: &str) -> Result<String> {
    let bytes = STANDARD.decode(payload.trim_end())?;
    String::from_utf8(bytes).map_err(|e| {
        Error::cache_with_context(
            "cached payload is not valid UTF-8",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("payload_codec"),
        )
    })
}
