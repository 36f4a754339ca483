//! Config validation with field paths in every message.

use crate::schema::StudioConfig;
use thiserror::Error;

/// Longest wait between status checks that the poller accepts.
pub const MAX_POLL_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// A config validation problem with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &StudioConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credential(config, &mut report);
    validate_endpoint(config, &mut report);
    validate_polling(config, &mut report);
    if config.port == 0 {
        report.error("port", "must be a fixed port between 1 and 65535");
    }
    report
}

fn validate_credential(config: &StudioConfig, report: &mut ValidationReport) {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {}
        _ => report.error(
            "apiKey",
            "API key not set; export GEMINI_API_KEY (or API_KEY)",
        ),
    }
}

fn validate_endpoint(config: &StudioConfig, report: &mut ValidationReport) {
    if !config.api_base_url.starts_with("http://") && !config.api_base_url.starts_with("https://") {
        report.error("apiBaseUrl", "must be an http(s) URL");
    }
    if config.model.trim().is_empty() {
        report.error("model", "model identifier is empty");
    }
}

fn validate_polling(config: &StudioConfig, report: &mut ValidationReport) {
    if config.poll_interval_secs == 0 {
        report.error("pollIntervalSecs", "must be at least 1 second");
    }
    if config.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
        report.error(
            "pollIntervalSecs",
            format!("must be at most {MAX_POLL_INTERVAL_SECS} seconds"),
        );
    }
    if config.max_poll_interval_secs > MAX_POLL_INTERVAL_SECS {
        report.error(
            "maxPollIntervalSecs",
            format!("must be at most {MAX_POLL_INTERVAL_SECS} seconds"),
        );
    }
    if !config.poll_backoff_factor.is_finite() || config.poll_backoff_factor < 1.0 {
        report.error("pollBackoffFactor", "must be a finite number >= 1.0");
    }
    if config.max_poll_interval_secs < config.poll_interval_secs {
        report.warn(
            "maxPollIntervalSecs",
            "smaller than pollIntervalSecs; backoff has no room to grow",
        );
    }
    if config.max_poll_attempts.is_none() && config.poll_timeout_secs.is_none() {
        report.warn(
            "maxPollAttempts",
            "no attempt limit or timeout; a stuck job is polled forever",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> StudioConfig {
        StudioConfig {
            api_key: Some("key".into()),
            max_poll_attempts: Some(60),
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let report = validate(&valid());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_key_is_an_error() {
        let report = validate(&StudioConfig {
            api_key: None,
            ..valid()
        });
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "apiKey");
    }

    #[test]
    fn blank_key_is_an_error() {
        let report = validate(&StudioConfig {
            api_key: Some("   ".into()),
            ..valid()
        });
        assert!(!report.is_valid());
    }

    #[test]
    fn zero_interval_and_shrinking_backoff_rejected() {
        let report = validate(&StudioConfig {
            poll_interval_secs: 0,
            poll_backoff_factor: 0.5,
            ..valid()
        });
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"pollIntervalSecs"));
        assert!(paths.contains(&"pollBackoffFactor"));
    }

    #[test]
    fn oversized_intervals_rejected() {
        let report = validate(&StudioConfig {
            poll_interval_secs: u64::MAX,
            max_poll_interval_secs: u64::MAX,
            poll_backoff_factor: f64::INFINITY,
            ..valid()
        });
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"pollIntervalSecs"));
        assert!(paths.contains(&"maxPollIntervalSecs"));
        assert!(paths.contains(&"pollBackoffFactor"));
    }

    #[test]
    fn day_long_interval_accepted() {
        let report = validate(&StudioConfig {
            poll_interval_secs: MAX_POLL_INTERVAL_SECS,
            max_poll_interval_secs: MAX_POLL_INTERVAL_SECS,
            ..valid()
        });
        assert!(report.is_valid());
    }

    #[test]
    fn port_zero_rejected() {
        let report = validate(&StudioConfig { port: 0, ..valid() });
        assert_eq!(report.errors[0].path, "port");
    }

    #[test]
    fn unbounded_polling_only_warns() {
        let report = validate(&StudioConfig {
            api_key: Some("key".into()),
            ..Default::default()
        });
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.path == "maxPollAttempts"));
    }
}
