//! URL import request validation.
//!
//! Metadata extraction is not implemented; the HTTP layer validates the body
//! with [`validate_import_url`] and then answers 501.

use serde::Deserialize;
use url::Url;

use crate::errors::{ResourceError, Result};

/// Body of `POST /resources/import-url`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    /// Page to import.
    pub url: String,
}

/// Accept only absolute `http`/`https` URLs with a host.
pub fn validate_import_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ResourceError::validation("url is required"));
    }
    let parsed =
        Url::parse(trimmed).map_err(|e| ResourceError::validation(format!("invalid url: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ResourceError::validation(format!(
                "invalid url scheme: {other} (only http/https allowed)"
            )));
        }
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ResourceError::validation("invalid url: no host"));
    }
    Ok(parsed)
}
