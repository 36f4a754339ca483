use bytes::Bytes;
use uuid::Uuid;

/// A video chosen by the user, held fully in memory.
#[derive(Debug, Clone)]
pub struct VideoFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl VideoFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn human_size(&self) -> String {
        format_file_size(self.size())
    }
}

/// Render a byte count as mebibytes with two decimals, e.g. `"2.00 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Still image taken from the first frame of a video.
///
/// `image_bytes` is the raw encoded image, never a data URI.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub image_bytes: Bytes,
    pub content_type: String,
}

/// The generated video as fetched from the remote service.
#[derive(Debug, Clone)]
pub struct VideoPayload {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Revocable reference that lets the view layer preview a piece of media.
///
/// Deliberately not `Clone`: revoking consumes the handle, so a handle can be
/// released at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct DisplayHandle {
    id: Uuid,
    url: String,
}

impl DisplayHandle {
    pub fn new(id: Uuid, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_mebibytes_formats_as_two_mb() {
        let file = VideoFile::new("clip.mp4", "video/mp4", vec![0u8; 2 * 1024 * 1024]);
        assert_eq!(file.size(), 2_097_152);
        assert_eq!(file.human_size(), "2.00 MB");
    }

    #[test]
    fn small_sizes_round_to_two_decimals() {
        assert_eq!(format_file_size(0), "0.00 MB");
        assert_eq!(format_file_size(1_572_864), "1.50 MB");
        assert_eq!(format_file_size(10_000), "0.01 MB");
    }
}
