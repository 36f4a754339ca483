//! flatframe runtime configuration schema.
//!
//! Field names are camelCase in YAML; every field has a default except the
//! credential, which must come from the file or the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "veo-2.0-generate-001";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_MAX_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioConfig {
    /// Generation API credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,

    /// Seconds between job status queries
    pub poll_interval_secs: u64,
    /// Interval multiplier per poll; 1.0 keeps the interval fixed
    pub poll_backoff_factor: f64,
    pub max_poll_interval_secs: u64,
    /// Unset means poll until the job reports done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_timeout_secs: Option<u64>,

    pub ffmpeg_path: String,
    pub ffprobe_path: String,

    pub bind_address: String,
    pub port: u16,
    pub output_dir: PathBuf,

    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_backoff_factor: 1.0,
            max_poll_interval_secs: DEFAULT_MAX_POLL_INTERVAL_SECS,
            max_poll_attempts: None,
            poll_timeout_secs: None,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            output_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl StudioConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_secs(self.max_poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}
