//! OMDb (Open Movie Database) metadata provider.
//!
//! OMDb answers every request with HTTP 200 and reports failures in the body
//! (`"Response": "False"` plus an `Error` message), so classification happens
//! after decoding.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{build_client, get_json, normalize_key, present};
use crate::config::OmdbConfig;
use crate::metadata::provider::{MovieProvider, ProviderError, ProviderRecord};
use crate::metadata::query::{extract_year, Query, QueryTerm};

pub const OMDB_BASE_URL: &str = "https://www.omdbapi.com/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    error: Option<String>,
    title: Option<String>,
    year: Option<String>,
    released: Option<String>,
    runtime: Option<String>,
    genre: Option<String>,
    director: Option<String>,
    actors: Option<String>,
    plot: Option<String>,
    poster: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
}

/// OMDb metadata provider.
pub struct OmdbProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OmdbProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            api_key: normalize_key(Some(&api_key)),
            base_url: OMDB_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &OmdbConfig, timeout: Duration) -> Self {
        let mut provider =
            Self::new(normalize_key(config.api_key.as_deref())).with_base_url(&config.base_url);
        provider.client = build_client(timeout);
        provider
    }

    /// Point the provider at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn params<'a>(&'a self, query: &'a Query, year: &'a Option<String>) -> Vec<(&'a str, &'a str)> {
        let mut params = vec![("apikey", self.api_key.as_str())];
        match query.term() {
            QueryTerm::Title(title) => {
                params.push(("t", title.as_str()));
                if let Some(y) = year {
                    params.push(("y", y.as_str()));
                }
                params.push(("plot", "short"));
            }
            QueryTerm::ImdbId(id) => params.push(("i", id.as_str())),
        }
        params
    }
}

/// Map OMDb's in-body error text to a provider error.
fn classify_error(message: &str) -> ProviderError {
    match message.trim() {
        "Movie not found!" | "Incorrect IMDb ID." => ProviderError::NoResults,
        "Request limit reached!" => ProviderError::RateLimited,
        "Invalid API key!" | "No API key provided." => ProviderError::Status(401),
        other => ProviderError::MalformedResponse(other.to_string()),
    }
}

/// Parse `"148 min"` into minutes.
fn parse_runtime(runtime: &str) -> Option<u32> {
    runtime.split_whitespace().next()?.parse().ok()
}

/// Split OMDb's comma-separated lists.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn to_record(body: OmdbResponse) -> Result<ProviderRecord, ProviderError> {
    if !body.response.eq_ignore_ascii_case("true") {
        let message = body.error.unwrap_or_default();
        return Err(classify_error(&message));
    }

    let title = present(body.title)
        .ok_or_else(|| ProviderError::MalformedResponse("response has no Title".into()))?;

    let mut record = ProviderRecord::new(title, "omdb");
    record.year = present(body.year).as_deref().and_then(extract_year);
    record.release_date = present(body.released);
    record.rating = present(body.imdb_rating).and_then(|r| r.parse::<f64>().ok());
    record.imdb_id = present(body.imdb_id);
    record.plot = present(body.plot);
    record.poster_url = present(body.poster);
    record.director = present(body.director);
    record.cast = present(body.actors).map(|a| split_list(&a));
    record.runtime_minutes = present(body.runtime).as_deref().and_then(parse_runtime);
    record.genres = present(body.genre).map(|g| split_list(&g));
    Ok(record)
}

#[async_trait]
impl MovieProvider for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self, query: &Query) -> Result<ProviderRecord, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured);
        }

        let year = query.year().map(|y| y.to_string());
        debug!(query = %query, "OMDb request");

        let body: OmdbResponse =
            get_json(self.client.get(&self.base_url).query(&self.params(query, &year))).await?;
        to_record(body)
    }
}
