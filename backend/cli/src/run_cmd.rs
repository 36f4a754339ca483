//! `flatframe run`: select, generate, wait, save.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

use flatframe_config::StudioConfig;
use flatframe_core::state::LOADING_MESSAGE_PERIOD_SECS;
use flatframe_core::{Status, VideoFile, DOWNLOAD_FILE_NAME};
use flatframe_media::{detect_mime_type, is_video, HandleRegistry};

use crate::terminal_output::{note, note_status, render_summary, Tone};

/// Read a video from disk, refusing anything whose extension is not a video type.
pub async fn read_video(path: &Path) -> Result<VideoFile> {
    let content_type = detect_mime_type(path);
    if !is_video(content_type) {
        bail!("{} is not a video file ({content_type})", path.display());
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());

    Ok(VideoFile::new(name, content_type, data))
}

pub async fn run(config: &StudioConfig, video: &Path, output: Option<PathBuf>) -> Result<()> {
    let file = read_video(video).await?;
    let (name, size) = (file.name.clone(), file.human_size());

    let handles = Arc::new(HandleRegistry::default());
    let studio = crate::build_studio(config, handles)?;

    studio.select_file(file).await;
    note_status(Status::FileSelected, &format!("{name} ({size})"));

    if studio.generate().await.is_none() {
        bail!("generation could not start");
    }
    note_status(Status::Generating, "submitted; this can take a few minutes");

    let period = Duration::from_secs(LOADING_MESSAGE_PERIOD_SECS as u64);
    let mut ticker = tokio::time::interval(period);
    let mut last_message = None;
    let mut interrupted = false;

    let settled = loop {
        tokio::select! {
            view = studio.wait_until_settled() => break view,
            _ = ticker.tick() => {
                let message = studio.view().await.progress_message;
                if message.is_some() && message != last_message {
                    if let Some(text) = &message {
                        note(Tone::Info, text);
                    }
                    last_message = message;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                note(Tone::Warn, "Interrupted, cancelling the job");
                studio.shutdown();
            }
        }
    };
    debug!(status = %settled.status, "Attempt settled");

    let result = match settled.status {
        Status::Completed => studio.result_video().await,
        _ => None,
    };
    let Some(result) = result else {
        let message = settled
            .error
            .unwrap_or_else(|| format!("generation ended in state {}", settled.status));
        note_status(settled.status, &message);
        note(Tone::Error, &message);
        studio.reset().await;
        bail!(message);
    };

    let dir = output.unwrap_or_else(|| config.output_dir.clone());
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let target = dir.join(DOWNLOAD_FILE_NAME);
    tokio::fs::write(&target, &result.bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    studio.reset().await;

    note_status(Status::Completed, "video ready");
    note(Tone::Success, &format!("Saved {}", target.display()));
    print!(
        "{}",
        render_summary(&[
            ("File", name),
            ("Size", size),
            ("Result", flatframe_core::format_file_size(result.bytes.len() as u64)),
            ("Saved to", target.display().to_string()),
        ])
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_video_with_detected_type() {
        let dir = std::env::temp_dir().join(format!("flatframe-run-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("clip.mp4");
        tokio::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).await.unwrap();

        let file = read_video(&path).await.unwrap();
        assert_eq!(file.name, "clip.mp4");
        assert_eq!(file.content_type, "video/mp4");
        assert_eq!(file.human_size(), "2.00 MB");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn refuses_non_video_input() {
        let err = read_video(Path::new("notes.txt")).await.unwrap_err();
        assert!(err.to_string().contains("not a video file"));
    }
}
