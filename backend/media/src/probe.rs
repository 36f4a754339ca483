//! Native frame size of a video via `ffprobe`.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

#[derive(Deserialize)]
struct FfprobeOutput {
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    side_data_list: Option<Vec<SideData>>,
    tags: Option<StreamTags>,
}

#[derive(Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

#[derive(Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

impl StreamInfo {
    /// Display rotation in degrees. The display matrix wins over the legacy tag.
    fn rotation(&self) -> i64 {
        let from_side_data = self
            .side_data_list
            .iter()
            .flatten()
            .find_map(|d| d.rotation);
        let from_tag = self
            .tags
            .as_ref()
            .and_then(|t| t.rotate.as_deref())
            .and_then(|r| r.trim().parse::<f64>().ok());
        from_side_data
            .or(from_tag)
            .map(|deg| deg.round() as i64)
            .unwrap_or(0)
    }
}

/// Displayed pixel dimensions of the first video stream, after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Run `ffprobe` against `path` and return the native frame size.
pub async fn probe_frame_size(ffprobe: &str, path: &Path) -> Result<FrameSize> {
    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("could not start {ffprobe}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe could not read the file: {}", stderr.trim());
    }

    parse_frame_size(&String::from_utf8_lossy(&output.stdout))
}

/// Pick the first video stream out of ffprobe's JSON.
///
/// ffmpeg autorotates on decode, so a stream rotated by a quarter turn reports
/// its coded size with width and height swapped.
pub fn parse_frame_size(json: &str) -> Result<FrameSize> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("could not parse ffprobe output")?;

    let stream = probe
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| anyhow!("no video stream found"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => (width, height),
        _ => bail!("video stream has no usable dimensions"),
    };

    if stream.rotation().rem_euclid(180) == 90 {
        Ok(FrameSize {
            width: height,
            height: width,
        })
    } else {
        Ok(FrameSize { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_video_stream_after_audio() {
        let json = r#"{"streams":[
            {"codec_type":"audio"},
            {"codec_type":"video","width":1280,"height":720}
        ]}"#;
        let size = parse_frame_size(json).unwrap();
        assert_eq!(size, FrameSize { width: 1280, height: 720 });
    }

    #[test]
    fn display_matrix_rotation_swaps_dimensions() {
        let json = r#"{"streams":[{"codec_type":"video","width":1920,"height":1080,
            "side_data_list":[{"side_data_type":"Display Matrix","rotation":-90}]}]}"#;
        let size = parse_frame_size(json).unwrap();
        assert_eq!(size, FrameSize { width: 1080, height: 1920 });
    }

    #[test]
    fn legacy_rotate_tag_swaps_dimensions() {
        let json = r#"{"streams":[{"codec_type":"video","width":1920,"height":1080,
            "tags":{"rotate":"270"}}]}"#;
        let size = parse_frame_size(json).unwrap();
        assert_eq!(size, FrameSize { width: 1080, height: 1920 });
    }

    #[test]
    fn half_turn_keeps_dimensions() {
        let json = r#"{"streams":[{"codec_type":"video","width":1920,"height":1080,
            "side_data_list":[{"rotation":180}]}]}"#;
        let size = parse_frame_size(json).unwrap();
        assert_eq!(size, FrameSize { width: 1920, height: 1080 });
    }

    #[test]
    fn audio_only_is_rejected() {
        let json = r#"{"streams":[{"codec_type":"audio"}]}"#;
        let err = parse_frame_size(json).unwrap_err();
        assert!(err.to_string().contains("no video stream"));
    }

    #[test]
    fn zero_dimensions_rejected() {
        let json = r#"{"streams":[{"codec_type":"video","width":0,"height":0}]}"#;
        assert!(parse_frame_size(json).is_err());
    }

    #[test]
    fn empty_probe_output_rejected() {
        assert!(parse_frame_size("{}").is_err());
        assert!(parse_frame_size("not json").is_err());
    }
}
