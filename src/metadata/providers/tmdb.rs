//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MovieProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Title search with confidence scoring based on title similarity and year
//!   proximity; the best hit becomes the record.
//! - IMDb id lookup through `/find/{id}`.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tracing::debug;

use super::{build_client, get_json, normalize_key, present};
use crate::config::TmdbConfig;
use crate::metadata::provider::{MovieProvider, ProviderError, ProviderRecord};
use crate::metadata::query::{Query, QueryTerm};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    movie_results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use cinebot::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into());
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a provider against the public TMDB API.
    ///
    /// The `language` parameter should be a tag such as `"en-US"`. An empty
    /// `api_key` leaves the provider unconfigured.
    pub fn new(api_key: String, language: String) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(4).unwrap());

        Self {
            client: build_client(DEFAULT_TIMEOUT),
            api_key: normalize_key(Some(&api_key)),
            language,
            base_url: TMDB_BASE_URL.to_string(),
            image_base_url: TMDB_IMAGE_BASE.to_string(),
            rate_limiter: RateLimiter::direct(quota),
        }
    }

    pub fn from_config(config: &TmdbConfig, timeout: Duration) -> Self {
        let mut provider = Self::new(
            normalize_key(config.api_key.as_deref()),
            config.language.clone(),
        )
        .with_base_url(&config.base_url);
        provider.client = build_client(timeout);
        provider.image_base_url = config.image_base_url.clone();
        provider
    }

    /// Point the provider at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{path}", self.base_url);
        let mut params: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        params.extend_from_slice(extra_params);

        debug!(path = path, "TMDB request");
        get_json(self.client.get(&url).query(&params)).await
    }

    /// Compute confidence score for a search result based on title similarity
    /// and year proximity.
    fn confidence(
        query_title: &str,
        result_title: &str,
        query_year: Option<u16>,
        result_year: Option<u16>,
    ) -> f64 {
        let base = if query_title == result_title {
            0.5
        } else if query_title.eq_ignore_ascii_case(result_title) {
            0.4
        } else if result_title
            .to_ascii_lowercase()
            .contains(&query_title.to_ascii_lowercase())
        {
            0.2
        } else {
            0.1
        };

        let year_bonus = match (query_year, result_year) {
            (Some(q), Some(r)) if q == r => 0.3,
            (Some(q), Some(r)) if q.abs_diff(r) <= 1 => 0.15,
            _ => 0.0,
        };

        base + year_bonus
    }

    fn to_record(&self, r: TmdbMovieResult) -> Option<ProviderRecord> {
        let title = present(r.title).or_else(|| present(r.original_title))?;
        let mut record = ProviderRecord::new(title, "tmdb");
        record.year = parse_year(&r.release_date);
        record.release_date = present(r.release_date);
        record.rating = rating(r.vote_average, r.vote_count);
        record.tmdb_id = Some(r.id);
        record.plot = present(r.overview);
        record.poster_url = present(r.poster_path).map(|p| format!("{}{p}", self.image_base_url));
        Some(record)
    }

    async fn search(&self, title: &str, year: Option<u16>) -> Result<ProviderRecord, ProviderError> {
        let mut params = vec![("query", title), ("include_adult", "false"), ("page", "1")];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push(("year", y.as_str()));
        }

        let body: TmdbSearchResponse = self.get("/search/movie", &params).await?;

        // First hit wins ties, so TMDB's own relevance order breaks them.
        let mut best: Option<(f64, ProviderRecord)> = None;
        for record in body.results.into_iter().filter_map(|r| self.to_record(r)) {
            let score = Self::confidence(title, &record.title, year, record.year);
            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, record));
            }
        }

        best.map(|(_, r)| r).ok_or(ProviderError::NoResults)
    }

    async fn find_by_imdb_id(&self, imdb_id: &str) -> Result<ProviderRecord, ProviderError> {
        let body: TmdbFindResponse = self
            .get(&format!("/find/{imdb_id}"), &[("external_source", "imdb_id")])
            .await?;

        let mut record = body
            .movie_results
            .into_iter()
            .find_map(|r| self.to_record(r))
            .ok_or(ProviderError::NoResults)?;
        record.imdb_id = Some(imdb_id.to_string());
        Ok(record)
    }
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

/// TMDB reports unrated titles as `0.0` with no votes.
fn rating(vote_average: Option<f64>, vote_count: Option<u64>) -> Option<f64> {
    match (vote_average, vote_count) {
        (Some(avg), Some(count)) if avg > 0.0 && count > 0 => Some(avg),
        (Some(avg), None) if avg > 0.0 => Some(avg),
        _ => None,
    }
}

#[async_trait]
impl MovieProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self, query: &Query) -> Result<ProviderRecord, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured);
        }

        match query.term() {
            QueryTerm::Title(title) => self.search(title, query.year()).await,
            QueryTerm::ImdbId(id) => self.find_by_imdb_id(id).await,
        }
    }
}
