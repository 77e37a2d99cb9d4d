//! Concrete movie-data provider implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`MovieProvider`](super::MovieProvider) trait.

pub mod omdb;
pub mod tmdb;

pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use super::provider::ProviderError;

/// Build an HTTP client with `timeout`, falling back to the default client.
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        })
}

/// Treat a missing or blank key as "not configured".
pub(crate) fn normalize_key(key: Option<&str>) -> String {
    key.map(str::trim).unwrap_or_default().to_string()
}

/// Send `request` and decode a JSON body, classifying every failure.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let resp = request.send().await.map_err(ProviderError::from_reqwest)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::from_status(status));
    }

    let body = resp.text().await.map_err(ProviderError::from_reqwest)?;
    serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

/// Drop blank strings and OMDb's `"N/A"` placeholder.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}
