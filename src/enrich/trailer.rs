//! YouTube trailer finder.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::AuxError;
use crate::config::YoutubeConfig;
use crate::metadata::providers::build_client;

pub const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

const TRAILER_KEYWORDS: [&str; 4] = ["trailer", "official trailer", "movie trailer", "teaser"];

const OFFICIAL_CHANNELS: [&str; 9] = [
    "sony pictures",
    "warner bros",
    "disney",
    "universal",
    "paramount",
    "fox",
    "lionsgate",
    "marvel",
    "dc",
];

const PENALTY_KEYWORDS: [&str; 8] = [
    "reaction",
    "review",
    "analysis",
    "breakdown",
    "fan made",
    "unofficial",
    "mashup",
    "parody",
];

/// Minimum score for a video to count as a trailer.
const MIN_SCORE: f64 = 0.3;
const MAX_TRAILERS: usize = 3;

/// A ranked trailer video.
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub url: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
}

pub struct TrailerFinder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TrailerFinder {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key: api_key.map(|k| k.trim().to_string()).unwrap_or_default(),
            base_url: YOUTUBE_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &YoutubeConfig, timeout: Duration) -> Self {
        Self::new(config.api_key.clone(), timeout).with_base_url(&config.base_url)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Search YouTube once and return up to three ranked trailers.
    pub async fn find(&self, title: &str, year: Option<u16>) -> Result<Vec<Trailer>, AuxError> {
        if !self.is_configured() {
            return Err(AuxError::NotConfigured);
        }

        let q = match year {
            Some(y) => format!("{} {y} official trailer", title.trim()),
            None => format!("{} official trailer", title.trim()),
        };
        debug!(query = %q, "YouTube search");

        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", q.as_str()),
                ("type", "video"),
                ("maxResults", "10"),
                ("order", "relevance"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuxError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AuxError::Status(resp.status().as_u16()));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| AuxError::Request(e.to_string()))?;

        Ok(rank(body.items, title, year))
    }
}

fn rank(items: Vec<SearchItem>, movie_title: &str, year: Option<u16>) -> Vec<Trailer> {
    let movie_title = movie_title.trim().to_lowercase();
    let year = year.map(|y| y.to_string());

    let mut trailers: Vec<Trailer> = items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let score = score_video(&item.snippet, &movie_title, year.as_deref());
            Some(Trailer {
                url: format!("https://www.youtube.com/watch?v={video_id}"),
                video_id,
                title: item.snippet.title,
                channel: item.snippet.channel_title,
                score,
            })
        })
        .filter(|t| t.score > MIN_SCORE)
        .collect();

    // Stable sort keeps YouTube's relevance order among equal scores.
    trailers.sort_by(|a, b| b.score.total_cmp(&a.score));
    trailers.truncate(MAX_TRAILERS);
    trailers
}

/// Relevance of one search hit. `movie_title` must already be lowercase.
fn score_video(snippet: &Snippet, movie_title: &str, year: Option<&str>) -> f64 {
    let title = snippet.title.to_lowercase();
    let description = snippet.description.to_lowercase();
    let channel = snippet.channel_title.to_lowercase();

    let mut score = 0.0;
    if title.contains(movie_title) {
        score += 0.5;
    }
    if TRAILER_KEYWORDS.iter().any(|k| title.contains(k)) {
        score += 0.3;
    }
    if OFFICIAL_CHANNELS.iter().any(|c| channel.contains(c)) {
        score += 0.2;
    }
    if year.is_some_and(|y| title.contains(y)) {
        score += 0.2;
    }
    if PENALTY_KEYWORDS
        .iter()
        .any(|k| title.contains(k) || description.contains(k))
    {
        score -= 0.3;
    }
    if title.contains("official") {
        score += 0.2;
    }

    f64::max(score, 0.0)
}
