//! Synchronous state machine.
//!
//! Every transition either applies completely or leaves the state untouched.
//! Handles are revoked only when the variant that owns them is left behind.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use flatframe_core::{
    AppState, DisplayHandles, StateView, Status, StudioError, VideoFile, VideoPayload,
};

/// Result of one extraction + generation attempt.
pub type GenerationOutcome = Result<VideoPayload, StudioError>;

/// Issued when entering `Generating`; the attempt number ties the outcome back
/// to the attempt that produced it.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub attempt: u64,
    pub file: VideoFile,
}

pub struct Session {
    state: AppState,
    handles: Arc<dyn DisplayHandles>,
    attempts: u64,
}

impl Session {
    pub fn new(handles: Arc<dyn DisplayHandles>) -> Self {
        Self {
            state: AppState::Idle,
            handles,
            attempts: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn view(&self) -> StateView {
        self.state.view()
    }

    /// Media of the generated video while in `Completed`.
    pub fn result_video(&self) -> Option<VideoPayload> {
        self.state
            .result_handle()
            .and_then(|handle| self.handles.resolve(handle))
    }

    /// `Idle | FileSelected -> FileSelected`. A superseded preview is revoked.
    pub fn select_file(&mut self, file: VideoFile) -> bool {
        if !matches!(self.state, AppState::Idle | AppState::FileSelected { .. }) {
            warn!(status = %self.status(), "File selection ignored");
            return false;
        }

        info!(
            file = %file.name,
            size = %file.human_size(),
            content_type = %file.content_type,
            "File selected"
        );
        let original = self.handles.create(file.data.clone(), &file.content_type);
        let selected = AppState::FileSelected { file, original };
        let previous = std::mem::replace(&mut self.state, selected);
        if let AppState::FileSelected { original: stale, .. } = previous {
            self.handles.revoke(stale);
        }
        true
    }

    /// `FileSelected -> Generating`. `None` in any other state, so at most one
    /// attempt is ever in flight.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        match std::mem::take(&mut self.state) {
            AppState::FileSelected { file, original } => {
                self.attempts += 1;
                let attempt = self.attempts;
                info!(attempt, file = %file.name, "Generation started");
                let ticket = GenerationTicket {
                    attempt,
                    file: file.clone(),
                };
                self.state = AppState::Generating {
                    file,
                    original,
                    attempt,
                    started_at: Utc::now(),
                };
                Some(ticket)
            }
            other => {
                debug!(status = %other.status(), "Generate ignored");
                self.state = other;
                None
            }
        }
    }

    /// `Generating -> Completed | Failed`. Outcomes of any attempt other than
    /// the current one are dropped without registering a handle.
    pub fn finish_generation(&mut self, attempt: u64, outcome: GenerationOutcome) -> bool {
        match std::mem::take(&mut self.state) {
            AppState::Generating {
                file,
                original,
                attempt: current,
                ..
            } if current == attempt => {
                self.state = match outcome {
                    Ok(payload) => {
                        info!(attempt, bytes = payload.bytes.len(), "Generation completed");
                        let result = self.handles.create(payload.bytes, &payload.content_type);
                        AppState::Completed {
                            file,
                            original,
                            result,
                        }
                    }
                    Err(err) => {
                        warn!(attempt, error = %err, "Generation failed");
                        AppState::Failed {
                            file,
                            original,
                            message: err.to_string(),
                        }
                    }
                };
                true
            }
            other => {
                debug!(attempt, status = %other.status(), "Stale generation outcome discarded");
                self.state = other;
                false
            }
        }
    }

    /// `Completed | Failed | FileSelected -> Idle`, revoking every handle the
    /// left variant owned. No-op from `Idle`; refused while `Generating`.
    pub fn reset(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            AppState::Idle => false,
            generating @ AppState::Generating { .. } => {
                warn!("Reset refused while generating");
                self.state = generating;
                false
            }
            released => {
                info!(from = %released.status(), "Reset to idle");
                self.release(released);
                true
            }
        }
    }

    fn release(&self, state: AppState) {
        match state {
            AppState::Idle => {}
            AppState::FileSelected { original, .. }
            | AppState::Generating { original, .. }
            | AppState::Failed { original, .. } => self.handles.revoke(original),
            AppState::Completed {
                original, result, ..
            } => {
                self.handles.revoke(result);
                self.handles.revoke(original);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.release(state);
    }
}
