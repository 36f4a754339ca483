//! First-frame extraction: ffmpeg decodes, `image` encodes.
//!
//! The video bytes are staged in a temporary file for the decoder (containers
//! such as MP4 need random access). The file is removed when the staging guard
//! drops, on every return path.

use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use flatframe_core::{FrameExtractor, Snapshot, StudioError, VideoFile};

use crate::mime_detect::extension_for_mime;
use crate::probe::{probe_frame_size, FrameSize};

/// Content type of every snapshot.
pub const SNAPSHOT_CONTENT_TYPE: &str = "image/jpeg";

/// JPEG quality, out of 100.
pub const JPEG_QUALITY: u8 = 90;

/// Extracts the first frame with the `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegFrameExtractor {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    async fn extract(&self, video: &VideoFile) -> Result<Snapshot> {
        if video.data.is_empty() {
            bail!("video file is empty");
        }

        let staged = stage_video(video).await?;
        let size = probe_frame_size(&self.ffprobe, staged.path()).await?;
        let frame = self.decode_first_frame(staged.path()).await?;
        drop(staged);

        debug!(
            file = %video.name,
            width = size.width,
            height = size.height,
            frame_bytes = frame.len(),
            "Decoded first frame"
        );

        let image_bytes = tokio::task::spawn_blocking(move || encode_snapshot(&frame, size))
            .await
            .context("snapshot encoder task failed")??;

        Ok(Snapshot {
            image_bytes: Bytes::from(image_bytes),
            content_type: SNAPSHOT_CONTENT_TYPE.to_string(),
        })
    }

    /// Seek to zero and emit exactly one frame as PNG on stdout.
    async fn decode_first_frame(&self, path: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-ss", "0", "-i"])
            .arg(path)
            .args([
                "-frames:v", "1", "-an", "-sn", "-dn", "-f", "image2pipe", "-vcodec", "png", "-",
            ])
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("could not start {}", self.ffmpeg))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg could not decode the first frame: {}", stderr.trim());
        }
        if output.stdout.is_empty() {
            bail!("ffmpeg produced no frame");
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_first_frame(&self, video: &VideoFile) -> Result<Snapshot, StudioError> {
        self.extract(video).await.map_err(StudioError::decode)
    }
}

/// Copy the video into a temporary file named with a matching extension.
async fn stage_video(video: &VideoFile) -> Result<NamedTempFile> {
    let data = video.data.clone();
    let suffix = format!(".{}", extension_for_mime(&video.content_type).unwrap_or("bin"));

    tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix("flatframe-")
            .suffix(&suffix)
            .tempfile()
            .context("could not create temporary file")?;
        staged
            .write_all(&data)
            .context("could not write temporary file")?;
        staged.flush()?;
        Ok(staged)
    })
    .await
    .context("staging task failed")?
}

/// Re-encode a decoded frame as JPEG at the video's native pixel size.
pub fn encode_snapshot(frame: &[u8], size: FrameSize) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(frame).context("decoded frame is not a readable image")?;
    let decoded = if decoded.width() != size.width || decoded.height() != size.height {
        decoded.resize_exact(size.width, size.height, FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = decoded.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .context("JPEG encoding failed")?;
    Ok(out.into_inner())
}
