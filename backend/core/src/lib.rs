pub mod error;
pub mod state;
pub mod traits;
pub mod types;

pub use error::StudioError;
pub use state::{AppState, FileSummary, StateView, Status, LOADING_MESSAGES};
pub use traits::{DisplayHandles, FrameExtractor, VideoGenerator};
pub use types::{format_file_size, DisplayHandle, Snapshot, VideoFile, VideoPayload};

/// File name offered for the generated video, whatever its actual encoding.
pub const DOWNLOAD_FILE_NAME: &str = "vector_animation.mp4";
