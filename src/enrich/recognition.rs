//! Candidate movie titles from posters and video stills.
//!
//! Text is read by Google Vision `TEXT_DETECTION`; this module only decides
//! which detected strings look like titles and how confident to be.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::frames::FrameExtractor;
use super::RecognitionError;
use crate::config::VisionConfig;
use crate::metadata::providers::build_client;

pub const VISION_BASE_URL: &str = "https://vision.googleapis.com/v1";

/// Text fragments that mark packaging, ratings or links rather than a title.
const SKIP_PATTERNS: [&str; 18] = [
    "rating",
    "pg-13",
    "minutes",
    "hours",
    "dvd",
    "blu-ray",
    "digital",
    "download",
    "streaming",
    "trailer",
    "teaser",
    "poster",
    "coming soon",
    "www.",
    "http",
    ".com",
    ".net",
    ".org",
];

/// Short tokens that only count as whole words ("min" but not "Terminator").
const SKIP_WORDS: [&str; 3] = ["min", "hrs", "rated"];

const DEFAULT_ANNOTATION_CONFIDENCE: f64 = 0.5;
const IMAGE_CANDIDATES: usize = 5;
const VIDEO_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// An uploaded file to recognize.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub kind: MediaKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaPayload {
    pub fn image(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind: MediaKind::Image,
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn video(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind: MediaKind::Video,
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercase extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// A possible title with confidence in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResult {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    #[serde(default)]
    message: String,
}

pub struct MediaRecognizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    ffmpeg_path: Option<PathBuf>,
    max_frames: u32,
}

impl MediaRecognizer {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key: api_key.map(|k| k.trim().to_string()).unwrap_or_default(),
            base_url: VISION_BASE_URL.to_string(),
            ffmpeg_path: None,
            max_frames: 5,
        }
    }

    pub fn from_config(config: &VisionConfig, timeout: Duration) -> Self {
        let mut recognizer =
            Self::new(config.api_key.clone(), timeout).with_base_url(&config.base_url);
        recognizer.ffmpeg_path = config.ffmpeg_path.clone();
        recognizer.max_frames = config.max_frames;
        recognizer
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Best candidate title for `media`.
    pub async fn recognize(&self, media: &MediaPayload) -> Result<String, RecognitionError> {
        self.candidates(media)
            .await?
            .into_iter()
            .next()
            .map(|c| c.title)
            .ok_or(RecognitionError::NoCandidate)
    }

    /// Ranked candidates for `media`, best first. May be empty.
    pub async fn candidates(
        &self,
        media: &MediaPayload,
    ) -> Result<Vec<Candidate>, RecognitionError> {
        if !self.is_configured() {
            return Err(RecognitionError::NotConfigured);
        }

        match media.kind {
            MediaKind::Image => self.image_candidates(&media.bytes).await,
            MediaKind::Video => {
                let extension = media.extension().unwrap_or_else(|| "mp4".to_string());
                self.video_candidates(&media.bytes, &extension).await
            }
        }
    }

    async fn image_candidates(&self, bytes: &[u8]) -> Result<Vec<Candidate>, RecognitionError> {
        let texts = self.annotate(bytes).await?;
        let likelihood = poster_likelihood(bytes);
        debug!(texts = texts.len(), likelihood, "Vision text detection");
        Ok(rank_texts(texts, likelihood))
    }

    async fn video_candidates(
        &self,
        bytes: &[u8],
        extension: &str,
    ) -> Result<Vec<Candidate>, RecognitionError> {
        let extractor = FrameExtractor::locate(self.ffmpeg_path.as_deref(), self.max_frames)?;
        let frames = extractor.extract(bytes, extension).await?;
        debug!(frames = frames.len(), "Extracted keyframes");

        let results =
            futures::future::join_all(frames.iter().map(|f| self.image_candidates(f))).await;

        let mut per_frame = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(candidates) => per_frame.push(candidates),
                Err(e) => warn!(frame = i, error = %e, "Skipping frame"),
            }
        }

        Ok(combine_frames(per_frame))
    }

    /// Detected text strings with their confidence.
    async fn annotate(&self, bytes: &[u8]) -> Result<Vec<(String, f64)>, RecognitionError> {
        let payload = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(bytes) },
                "features": [{ "type": "TEXT_DETECTION", "maxResults": 10 }]
            }]
        });

        let resp = self
            .client
            .post(format!("{}/images:annotate", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| RecognitionError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RecognitionError::Request(format!(
                "Google Vision returned HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body: AnnotateResponse = resp
            .json()
            .await
            .map_err(|e| RecognitionError::Request(e.to_string()))?;

        let Some(result) = body.responses.into_iter().next() else {
            return Ok(Vec::new());
        };
        if let Some(status) = result.error {
            return Err(RecognitionError::Request(status.message));
        }

        Ok(result
            .text_annotations
            .into_iter()
            .flat_map(|a| {
                let confidence = a.confidence.unwrap_or(DEFAULT_ANNOTATION_CONFIDENCE);
                a.description
                    .lines()
                    .map(|line| (line.trim().to_string(), confidence))
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

/// Whether `text` could plausibly be a movie title.
pub fn is_potential_title(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if !(2..=100).contains(&len) {
        return false;
    }

    let lower = text.to_lowercase();
    if SKIP_PATTERNS.iter().any(|p| lower.contains(p)) {
        return false;
    }
    if lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|w| SKIP_WORDS.contains(&w))
    {
        return false;
    }

    let alpha = text.chars().filter(|c| c.is_alphabetic()).count();
    alpha * 2 >= len
}

/// 0.5 for portrait images (height / width > 1.2), else 0.3. Undecodable
/// images get the neutral 0.5.
fn poster_likelihood(bytes: &[u8]) -> f64 {
    match image::load_from_memory(bytes) {
        Ok(img) if img.width() > 0 => {
            if f64::from(img.height()) / f64::from(img.width()) > 1.2 {
                0.5
            } else {
                0.3
            }
        }
        Ok(_) => 0.3,
        Err(e) => {
            debug!(error = %e, "Could not decode image dimensions");
            0.5
        }
    }
}

/// Filter detected text to title-like strings, boost by poster likelihood,
/// de-duplicate ignoring case and keep the best few.
fn rank_texts(texts: Vec<(String, f64)>, likelihood: f64) -> Vec<Candidate> {
    let mut best: Vec<Candidate> = Vec::new();
    for (text, confidence) in texts {
        if !is_potential_title(&text) {
            continue;
        }
        let confidence = (confidence * (1.0 + likelihood)).min(1.0);
        match best
            .iter_mut()
            .find(|c| c.title.to_lowercase() == text.to_lowercase())
        {
            Some(existing) => existing.confidence = existing.confidence.max(confidence),
            None => best.push(Candidate {
                title: text,
                confidence,
            }),
        }
    }

    best.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    best.truncate(IMAGE_CANDIDATES);
    best
}

/// Merge per-frame candidates. A title seen again gains `0.3 x` that frame's
/// confidence, capped at 1.
fn combine_frames(frames: Vec<Vec<Candidate>>) -> Vec<Candidate> {
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashMap<String, (Candidate, u32)> = HashMap::new();

    for candidate in frames.into_iter().flatten() {
        let key = candidate.title.to_lowercase();
        match seen.get_mut(&key) {
            Some((existing, count)) => {
                existing.confidence = (existing.confidence + candidate.confidence * 0.3).min(1.0);
                *count += 1;
            }
            None => {
                order.push(key.clone());
                seen.insert(key, (candidate, 1));
            }
        }
    }

    let mut combined: Vec<(Candidate, u32)> =
        order.iter().filter_map(|k| seen.remove(k)).collect();
    combined.sort_by(|(a, ac), (b, bc)| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| bc.cmp(ac))
    });
    combined
        .into_iter()
        .take(VIDEO_CANDIDATES)
        .map(|(c, _)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn candidate(title: &str, confidence: f64) -> Candidate {
        Candidate {
            title: title.into(),
            confidence,
        }
    }

    #[test]
    fn title_filter() {
        assert!(is_potential_title("Inception"));
        assert!(is_potential_title("The Dark Knight"));
        assert!(!is_potential_title("I"));
        assert!(!is_potential_title("Rated PG-13"));
        assert!(!is_potential_title("www.inceptionmovie.com"));
        assert!(!is_potential_title("Coming Soon"));
        assert!(!is_potential_title("2010 12 07"));
        assert!(!is_potential_title(&"a".repeat(101)));
    }

    #[test]
    fn short_skip_tokens_match_whole_words() {
        assert!(is_potential_title("The Terminator"));
        assert!(is_potential_title("Minority Report"));
        assert!(is_potential_title("Criminal"));
        assert!(!is_potential_title("Runtime 148 min."));
        assert!(!is_potential_title("2 HRS"));
        assert!(!is_potential_title("Rated R"));
    }

    #[test]
    fn portrait_images_look_like_posters() {
        assert_eq!(poster_likelihood(&png(2, 4)), 0.5);
        assert_eq!(poster_likelihood(&png(4, 2)), 0.3);
        assert_eq!(poster_likelihood(b"not an image"), 0.5);
    }

    #[test]
    fn rank_boosts_and_dedupes() {
        let texts = vec![
            ("INCEPTION".to_string(), 0.6),
            ("Inception".to_string(), 0.4),
            ("July 16".to_string(), 0.9),
            ("Leonardo DiCaprio".to_string(), 0.5),
            ("Rated PG-13".to_string(), 0.99),
        ];
        let ranked = rank_texts(texts, 0.5);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0], candidate("July 16", 1.0));
        assert_eq!(ranked[1].title, "INCEPTION");
        assert!((ranked[1].confidence - 0.9).abs() < 1e-9);
        assert!((ranked[2].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn repeated_frames_gain_confidence() {
        let frames = vec![
            vec![candidate("Heat", 0.5), candidate("Pacino", 0.6)],
            vec![candidate("HEAT", 0.5)],
            vec![candidate("heat", 0.5), candidate("De Niro", 0.2)],
            vec![candidate("Extra", 0.1)],
        ];
        let combined = combine_frames(frames);

        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0].title, "Heat");
        assert!((combined[0].confidence - 0.8).abs() < 1e-9);
        assert_eq!(combined[1].title, "Pacino");
        assert_eq!(combined[2].title, "De Niro");
    }

    #[test]
    fn payload_extension() {
        let media = MediaPayload::video("Clip.MP4", Vec::new());
        assert_eq!(media.extension().as_deref(), Some("mp4"));
        assert_eq!(MediaPayload::image("photo", Vec::new()).extension(), None);
    }

    #[tokio::test]
    async fn unconfigured_recognizer() {
        let recognizer = MediaRecognizer::new(None, Duration::from_secs(1));
        let result = recognizer
            .recognize(&MediaPayload::image("poster.png", png(2, 3)))
            .await;
        assert!(matches!(result, Err(RecognitionError::NotConfigured)));
    }

    #[tokio::test]
    async fn recognizes_poster_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images:annotate"))
            .and(query_param("key", "vision-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responses": [{
                    "textAnnotations": [
                        { "description": "ARRIVAL\nNOVEMBER 11\nwww.arrivalmovie.com" },
                        { "description": "ARRIVAL" }
                    ]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let recognizer = MediaRecognizer::new(Some("vision-key".into()), Duration::from_secs(5))
            .with_base_url(&server.uri());
        let media = MediaPayload::image("poster.png", png(2, 3));

        let candidates = recognizer.candidates(&media).await.unwrap();
        assert_eq!(candidates[0].title, "ARRIVAL");
        assert!((candidates[0].confidence - 0.75).abs() < 1e-9);
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn no_text_is_no_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [{}] })))
            .mount(&server)
            .await;

        let recognizer = MediaRecognizer::new(Some("vision-key".into()), Duration::from_secs(5))
            .with_base_url(&server.uri());
        let result = recognizer
            .recognize(&MediaPayload::image("blank.png", png(3, 3)))
            .await;
        assert!(matches!(result, Err(RecognitionError::NoCandidate)));
    }

    #[tokio::test]
    async fn vision_error_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let recognizer = MediaRecognizer::new(Some("vision-key".into()), Duration::from_secs(5))
            .with_base_url(&server.uri());
        let result = recognizer
            .recognize(&MediaPayload::image("poster.png", png(2, 3)))
            .await;
        assert!(matches!(result, Err(RecognitionError::Request(_))));
    }
}
