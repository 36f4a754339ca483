//! MIME type detection for the file-input boundary.
//!
//! Only extensions are consulted; the decoder is the real judge of whether a
//! file is playable.

use std::path::Path;

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        // Video
        "mp4" | "m4v"  => "video/mp4",
        "webm"         => "video/webm",
        "mkv"          => "video/x-matroska",
        "mov"          => "video/quicktime",
        "avi"          => "video/x-msvideo",
        "ogv"          => "video/ogg",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp"          => "video/3gpp",

        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "webp"         => "image/webp",

        _              => "application/octet-stream",
    }
}

/// Preferred file extension for a MIME type, used when staging bytes on disk.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    match essence.as_str() {
        "video/mp4"        => Some("mp4"),
        "video/webm"       => Some("webm"),
        "video/x-matroska" => Some("mkv"),
        "video/quicktime"  => Some("mov"),
        "video/x-msvideo"  => Some("avi"),
        "video/ogg"        => Some("ogv"),
        "video/mpeg"       => Some("mpeg"),
        "video/3gpp"       => Some("3gp"),
        "image/jpeg"       => Some("jpg"),
        "image/png"        => Some("png"),
        _                  => None,
    }
}

/// Whether a MIME type is for video.
pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn video_extensions() {
        assert_eq!(detect_mime_type(&PathBuf::from("clip.MP4")), "video/mp4");
        assert_eq!(detect_mime_type(&PathBuf::from("clip.mov")), "video/quicktime");
        assert!(is_video(detect_mime_type(&PathBuf::from("clip.webm"))));
    }

    #[test]
    fn unknown_extension_fallback() {
        let mime = detect_mime_type(&PathBuf::from("notes.xyz"));
        assert_eq!(mime, "application/octet-stream");
        assert!(!is_video(mime));
    }

    #[test]
    fn extension_ignores_parameters() {
        assert_eq!(extension_for_mime("video/mp4; codecs=avc1"), Some("mp4"));
        assert_eq!(extension_for_mime("application/x-unknown"), None);
        assert_eq!(extension_for_mime("image/jpeg"), Some("jpg"));
    }
}
