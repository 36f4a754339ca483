//! `flatframe probe`: run only the frame extractor and save the snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use flatframe_config::StudioConfig;
use flatframe_core::FrameExtractor;
use flatframe_media::{extension_for_mime, FfmpegFrameExtractor};

use crate::run_cmd::read_video;
use crate::terminal_output::{note, render_summary, Tone};

pub async fn run(config: &StudioConfig, video: &Path, output: Option<PathBuf>) -> Result<()> {
    let file = read_video(video).await?;
    let extractor = FfmpegFrameExtractor::new(&config.ffmpeg_path, &config.ffprobe_path);
    let snapshot = extractor.extract_first_frame(&file).await?;

    let target = output
        .unwrap_or_else(|| config.output_dir.join(snapshot_name(video, &snapshot.content_type)));
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&target, &snapshot.image_bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;

    note(Tone::Success, &format!("Wrote {}", target.display()));
    print!(
        "{}",
        render_summary(&[
            ("Video", file.name.clone()),
            ("Snapshot", snapshot.content_type.clone()),
            ("Bytes", snapshot.image_bytes.len().to_string()),
        ])
    );
    Ok(())
}

/// `clip.mp4` + `image/jpeg` -> `clip_first_frame.jpg`
fn snapshot_name(video: &Path, content_type: &str) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let ext = extension_for_mime(content_type).unwrap_or("jpg");
    format!("{stem}_first_frame.{ext}")
}
