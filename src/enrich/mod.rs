//! Lookups that decorate a reply but never decide its outcome.
//!
//! - [`trailer`] -- YouTube trailer search and ranking.
//! - [`recognition`] -- Candidate titles from posters and video keyframes
//!   via Google Vision text detection.
//! - [`frames`] -- ffmpeg keyframe extraction for videos.

pub mod frames;
pub mod recognition;
pub mod trailer;

pub use recognition::{Candidate, MediaKind, MediaPayload, MediaRecognizer};
pub use trailer::{Trailer, TrailerFinder};

/// Errors from the trailer search.
#[derive(Debug, thiserror::Error)]
pub enum AuxError {
    #[error("YouTube API key not configured")]
    NotConfigured,

    #[error("YouTube request failed: {0}")]
    Request(String),

    #[error("YouTube returned HTTP {0}")]
    Status(u16),
}

/// Errors from media recognition.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("Google Vision API key not configured")]
    NotConfigured,

    #[error("no movie title found in the media")]
    NoCandidate,

    #[error("unsupported media: {0}")]
    Unsupported(String),

    #[error("recognition request failed: {0}")]
    Request(String),
}

/// Enrichment gathered after a successful lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxResults {
    pub trailers: Vec<Trailer>,
}

impl AuxResults {
    pub fn with_trailers(trailers: Vec<Trailer>) -> Self {
        Self { trailers }
    }
}
