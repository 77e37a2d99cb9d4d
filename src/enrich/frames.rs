//! Keyframe extraction from uploaded videos with ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::RecognitionError;

const FFMPEG_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs ffmpeg to pull I-frames out of a video as PNG stills.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    ffmpeg_path: PathBuf,
    max_frames: u32,
    timeout: Duration,
}

impl FrameExtractor {
    pub fn new(ffmpeg_path: PathBuf, max_frames: u32) -> Self {
        Self {
            ffmpeg_path,
            max_frames,
            timeout: FFMPEG_TIMEOUT,
        }
    }

    /// Use `explicit` when given, otherwise find ffmpeg on `PATH`.
    pub fn locate(explicit: Option<&Path>, max_frames: u32) -> Result<Self, RecognitionError> {
        let path = match explicit {
            Some(p) if p.is_file() => p.to_path_buf(),
            Some(p) => {
                return Err(RecognitionError::Unsupported(format!(
                    "ffmpeg not found at {}",
                    p.display()
                )))
            }
            None => which::which("ffmpeg").map_err(|_| {
                RecognitionError::Unsupported("ffmpeg is not installed".to_string())
            })?,
        };
        Ok(Self::new(path, max_frames))
    }

    /// Extract up to `max_frames` keyframes, returned as PNG bytes in
    /// playback order.
    pub async fn extract(
        &self,
        video: &[u8],
        extension: &str,
    ) -> Result<Vec<Vec<u8>>, RecognitionError> {
        if self.max_frames == 0 {
            return Ok(Vec::new());
        }

        let dir = tempfile::tempdir().map_err(io_error)?;
        let input = dir.path().join(format!("input.{extension}"));
        tokio::fs::write(&input, video).await.map_err(io_error)?;

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-v")
            .arg("error")
            .arg("-i")
            .arg(&input)
            .arg("-vf")
            .arg("select='eq(pict_type,I)'")
            .arg("-vsync")
            .arg("vfr")
            .arg("-frames:v")
            .arg(self.max_frames.to_string())
            .arg(dir.path().join("frame_%03d.png"))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(ffmpeg = %self.ffmpeg_path.display(), "Extracting keyframes");
        let child = cmd.spawn().map_err(|e| {
            RecognitionError::Unsupported(format!("failed to spawn ffmpeg: {e}"))
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                RecognitionError::Request(format!("ffmpeg timed out after {:?}", self.timeout))
            })?
            .map_err(io_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Unsupported(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        read_frames(dir.path()).await
    }
}

/// Read `frame_*.png` files from `dir`, sorted by name.
async fn read_frames(dir: &Path) -> Result<Vec<Vec<u8>>, RecognitionError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("frame_") && name.ends_with(".png") {
            names.push(name);
        }
    }
    names.sort();

    let mut frames = Vec::with_capacity(names.len());
    for name in names {
        frames.push(tokio::fs::read(dir.join(name)).await.map_err(io_error)?);
    }
    Ok(frames)
}

fn io_error(e: std::io::Error) -> RecognitionError {
    RecognitionError::Request(format!("frame extraction I/O error: {e}"))
}
