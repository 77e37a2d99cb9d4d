//! Trait definition and types for movie-data providers.
//!
//! This module defines the [`MovieProvider`] trait that every movie-data
//! backend (TMDB, OMDb) implements, the normalized [`ProviderRecord`] they all
//! return, and the [`ProviderError`] taxonomy used to report failures without
//! unwinding past the provider boundary.

use async_trait::async_trait;
use serde::Serialize;

use super::query::Query;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Normalized result of a single provider lookup.
///
/// Only `title` is required. `None` means the provider did not report the
/// field, which is distinct from an empty value such as `Some(String::new())`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRecord {
    /// Display title.
    pub title: String,
    /// Release year.
    pub year: Option<u16>,
    /// Release date as reported by the provider (`YYYY-MM-DD` for TMDB).
    pub release_date: Option<String>,
    /// Audience rating on a 0 - 10 scale.
    pub rating: Option<f64>,
    /// IMDb identifier (`tt0000000`).
    pub imdb_id: Option<String>,
    /// TMDB numeric identifier.
    pub tmdb_id: Option<u64>,
    /// Plot summary.
    pub plot: Option<String>,
    /// Fully-qualified poster URL.
    pub poster_url: Option<String>,
    /// Director credit.
    pub director: Option<String>,
    /// Leading cast, in billing order.
    pub cast: Option<Vec<String>>,
    /// Runtime in minutes.
    pub runtime_minutes: Option<u32>,
    /// Genre labels.
    pub genres: Option<Vec<String>>,
    /// Name of the provider that produced this record.
    pub source: &'static str,
}

impl ProviderRecord {
    /// Create a record carrying only a title.
    pub fn new(title: impl Into<String>, source: &'static str) -> Self {
        Self {
            title: title.into(),
            year: None,
            release_date: None,
            rating: None,
            imdb_id: None,
            tmdb_id: None,
            plot: None,
            poster_url: None,
            director: None,
            cast: None,
            runtime_minutes: None,
            genres: None,
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a provider lookup produced no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// No credential is configured; no request was made.
    #[error("provider is not configured")]
    NotConfigured,

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The provider throttled the request.
    #[error("rate limited by provider")]
    RateLimited,

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {0}")]
    Status(u16),

    /// The request could not be delivered (DNS, connection refused, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The call succeeded but matched no title.
    #[error("no results")]
    NoResults,
}

impl ProviderError {
    /// Short tag used in logs.
    pub fn cause(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured => "not_configured",
            ProviderError::Timeout => "timeout",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::Status(_) | ProviderError::Transport(_) => "transport_failure",
            ProviderError::MalformedResponse(_) => "malformed_response",
            ProviderError::NoResults => "no_results",
        }
    }

    /// Whether a single retry is worthwhile. Only timeouts qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout)
    }

    /// Classify a `reqwest` failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_status(status)
        } else {
            ProviderError::Transport(err.to_string())
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ProviderError::RateLimited
        } else {
            ProviderError::Status(status.as_u16())
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait that all movie-data providers must implement.
///
/// `fetch` never panics or propagates transport errors as anything but a
/// [`ProviderError`], so callers can inspect every outcome uniformly.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when an API key is present.
    fn is_configured(&self) -> bool;

    /// Look up a single movie for `query`.
    ///
    /// Issues at most one HTTP request. Returns
    /// [`ProviderError::NotConfigured`] without any request when
    /// [`is_configured`](Self::is_configured) is `false`.
    async fn fetch(&self, query: &Query) -> Result<ProviderRecord, ProviderError>;
}
