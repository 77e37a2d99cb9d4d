use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub omdb: OmdbConfig,

    #[serde(default)]
    pub youtube: YoutubeConfig,

    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

impl Config {
    /// Configured flag per external service, in display order.
    pub fn api_status(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("TMDB", has_key(&self.tmdb.api_key)),
            ("OMDB", has_key(&self.omdb.api_key)),
            ("YOUTUBE", has_key(&self.youtube.api_key)),
            ("GOOGLE_VISION", has_key(&self.vision.api_key)),
        ]
    }
}

pub(crate) fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// API key (`TMDB_API_KEY` overrides)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,

    /// Prefix for poster paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OmdbConfig {
    /// API key (`OMDB_API_KEY` overrides)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_omdb_base_url")]
    pub base_url: String,
}

fn default_omdb_base_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_omdb_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YoutubeConfig {
    /// API key (`YOUTUBE_API_KEY` overrides)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VisionConfig {
    /// API key (`GOOGLE_VISION_API_KEY` overrides)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_vision_base_url")]
    pub base_url: String,

    /// Explicit ffmpeg binary; searched on PATH when unset
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Keyframes sampled per video
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
}

fn default_vision_base_url() -> String {
    "https://vision.googleapis.com/v1".to_string()
}
fn default_max_frames() -> u32 {
    5
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_vision_base_url(),
            ffmpeg_path: None,
            max_frames: default_max_frames(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout for every outbound call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries after a timed-out provider call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_request_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    1
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Upload size limit in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Image extensions, lowercase without the dot
    #[serde(default = "default_image_formats")]
    pub image_formats: Vec<String>,

    #[serde(default = "default_video_formats")]
    pub video_formats: Vec<String>,
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024
}
fn default_image_formats() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "bmp"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_video_formats() -> Vec<String> {
    ["mp4", "avi", "mov", "mkv", "webm"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            image_formats: default_image_formats(),
            video_formats: default_video_formats(),
        }
    }
}
