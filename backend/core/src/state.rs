//! Application state: exactly one variant is active at a time.
//!
//! Variants own the display handles they introduce. Moving from one variant to
//! the next moves the handles along; leaving a variant for `Idle` is the only
//! place they are revoked (see `flatframe-studio`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{DisplayHandle, VideoFile};

/// Status lines shown while a job is running, rotated every
/// [`LOADING_MESSAGE_PERIOD_SECS`] seconds.
pub const LOADING_MESSAGES: [&str; 7] = [
    "Warming up the animation engine...",
    "Analyzing the first frame...",
    "This can take a few minutes...",
    "Sketching vector outlines...",
    "Applying pastel color palette...",
    "Rendering smooth motion...",
    "Almost there, adding final touches...",
];

pub const LOADING_MESSAGE_PERIOD_SECS: i64 = 4;

#[derive(Debug, Default)]
pub enum AppState {
    #[default]
    Idle,
    FileSelected {
        file: VideoFile,
        original: DisplayHandle,
    },
    Generating {
        file: VideoFile,
        original: DisplayHandle,
        attempt: u64,
        started_at: DateTime<Utc>,
    },
    Completed {
        file: VideoFile,
        original: DisplayHandle,
        result: DisplayHandle,
    },
    Failed {
        file: VideoFile,
        original: DisplayHandle,
        message: String,
    },
}

/// Discriminant of [`AppState`], as reported to the view.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    FileSelected,
    Generating,
    Completed,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::FileSelected => "file_selected",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl AppState {
    pub fn status(&self) -> Status {
        match self {
            Self::Idle => Status::Idle,
            Self::FileSelected { .. } => Status::FileSelected,
            Self::Generating { .. } => Status::Generating,
            Self::Completed { .. } => Status::Completed,
            Self::Failed { .. } => Status::Failed,
        }
    }

    pub fn file(&self) -> Option<&VideoFile> {
        match self {
            Self::Idle => None,
            Self::FileSelected { file, .. }
            | Self::Generating { file, .. }
            | Self::Completed { file, .. }
            | Self::Failed { file, .. } => Some(file),
        }
    }

    pub fn original_handle(&self) -> Option<&DisplayHandle> {
        match self {
            Self::Idle => None,
            Self::FileSelected { original, .. }
            | Self::Generating { original, .. }
            | Self::Completed { original, .. }
            | Self::Failed { original, .. } => Some(original),
        }
    }

    pub fn result_handle(&self) -> Option<&DisplayHandle> {
        match self {
            Self::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Serializable projection for the presentation layer, evaluated at `now`.
    pub fn view_at(&self, now: DateTime<Utc>) -> StateView {
        let (started_at, progress_message) = match self {
            Self::Generating { started_at, .. } => {
                let elapsed = (now - *started_at).num_seconds().max(0);
                let index =
                    (elapsed / LOADING_MESSAGE_PERIOD_SECS) as usize % LOADING_MESSAGES.len();
                (Some(*started_at), Some(LOADING_MESSAGES[index].to_string()))
            }
            _ => (None, None),
        };

        StateView {
            status: self.status(),
            file: self.file().map(FileSummary::from),
            original_url: self.original_handle().map(|h| h.url().to_string()),
            result_url: self.result_handle().map(|h| h.url().to_string()),
            error: match self {
                Self::Failed { message, .. } => Some(message.clone()),
                _ => None,
            },
            started_at,
            progress_message,
        }
    }

    pub fn view(&self) -> StateView {
        self.view_at(Utc::now())
    }
}

/// What the view needs to render the current state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StateView {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_message: Option<String>,
}

impl Default for StateView {
    fn default() -> Self {
        AppState::Idle.view()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileSummary {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub size_label: String,
}

impl From<&VideoFile> for FileSummary {
    fn from(file: &VideoFile) -> Self {
        Self {
            name: file.name.clone(),
            content_type: file.content_type.clone(),
            size_bytes: file.size(),
            size_label: file.human_size(),
        }
    }
}
