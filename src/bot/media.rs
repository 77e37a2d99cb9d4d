//! Upload pre-filter: size and extension checks before recognition.

use crate::config::MediaConfig;
use crate::enrich::MediaKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("File is too large ({}). Maximum size is {}.", format_bytes(*.size), format_bytes(*.max))]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported file format '.{0}'")]
    UnsupportedFormat(String),

    #[error("File has no extension, so its format is unknown")]
    MissingExtension,
}

/// Check an upload against the media limits.
///
/// `expected` restricts the accepted kind (photo and video uploads); `None`
/// routes a document to whichever kind its extension names.
pub fn validate(
    file_name: &str,
    size: u64,
    expected: Option<MediaKind>,
    config: &MediaConfig,
) -> Result<MediaKind, MediaError> {
    if size > config.max_file_size {
        return Err(MediaError::TooLarge {
            size,
            max: config.max_file_size,
        });
    }

    let Some(ext) = extension(file_name) else {
        return match expected {
            Some(kind) => Ok(kind),
            None => Err(MediaError::MissingExtension),
        };
    };

    let is_image = config.image_formats.iter().any(|f| f.eq_ignore_ascii_case(&ext));
    let is_video = config.video_formats.iter().any(|f| f.eq_ignore_ascii_case(&ext));

    match (expected, is_image, is_video) {
        (None | Some(MediaKind::Image), true, _) => Ok(MediaKind::Image),
        (None | Some(MediaKind::Video), _, true) => Ok(MediaKind::Video),
        _ => Err(MediaError::UnsupportedFormat(ext)),
    }
}

fn extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
