use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::StudioError;
use crate::types::{DisplayHandle, Snapshot, VideoFile, VideoPayload};

/// Produces the still image that seeds a generation job.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Decode the first frame of `video` and encode it as a compressed image.
    ///
    /// Fails with [`StudioError::Decode`]; no retries.
    async fn extract_first_frame(&self, video: &VideoFile) -> Result<Snapshot, StudioError>;
}

/// Remote job service that turns a snapshot into a stylized video.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Generator name (e.g., "veo").
    fn name(&self) -> &str;

    /// Submit the snapshot, wait for the job to finish, and fetch the result.
    ///
    /// May take minutes. Returns early with [`StudioError::Generation`] once
    /// `cancel` fires.
    async fn generate_styled_video(
        &self,
        snapshot: &Snapshot,
        cancel: &CancellationToken,
    ) -> Result<VideoPayload, StudioError>;
}

/// Create/revoke pair for preview handles.
pub trait DisplayHandles: Send + Sync {
    /// Register `data` for preview and return the handle that refers to it.
    fn create(&self, data: Bytes, content_type: &str) -> DisplayHandle;

    /// Media behind a live handle; `None` once revoked.
    fn resolve(&self, handle: &DisplayHandle) -> Option<VideoPayload>;

    /// Release the media behind `handle`.
    fn revoke(&self, handle: DisplayHandle);
}
