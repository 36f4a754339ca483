//! Media plumbing: first-frame extraction, display handles, and the HTTP
//! router that serves them.

pub mod extractor;
pub mod handles;
pub mod media_server;
pub mod mime_detect;
pub mod probe;

pub use extractor::{encode_snapshot, FfmpegFrameExtractor, JPEG_QUALITY, SNAPSHOT_CONTENT_TYPE};
pub use handles::{HandleRegistry, StoredMedia};
pub use media_server::media_router;
pub use mime_detect::{detect_mime_type, extension_for_mime, is_video};
pub use probe::{parse_frame_size, probe_frame_size, FrameSize};
