//! `flatframe-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults
//! - Optional YAML file with `${ENV_VAR}` substitution
//! - Environment overrides (credential, endpoints, polling, paths)
//! - Validation that fails fast on a missing credential
//! - Redaction for safe logging

pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides, process_env, resolve_env_vars_with, MissingEnvVarError, API_KEY_VARS,
};
pub use io::{config_dir, config_file_path, load_config_value, parse_config_yaml};
pub use redact::{mask_secret, redact, redact_url};
pub use schema::StudioConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use flatframe_core::StudioError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Load the runtime config from the process environment.
///
/// File lookup: explicit `path` > `FLATFRAME_CONFIG` > `<config dir>/config.yaml`.
/// A missing file is fine; a missing credential is not.
pub async fn load(path: Option<&Path>) -> Result<StudioConfig, StudioError> {
    let env = process_env();
    let file_value = read_file(path, &env).await?;
    load_with(file_value, &env)
}

/// Like [`load`], without validation. For commands that never reach the
/// generation service.
pub async fn load_unvalidated(path: Option<&Path>) -> Result<StudioConfig, StudioError> {
    let env = process_env();
    let file_value = read_file(path, &env).await?;
    build(file_value, &env)
}

async fn read_file(
    path: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<Option<Value>, StudioError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| env.get("FLATFRAME_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| config_file_path(&config_dir()));

    load_config_value(&path)
        .await
        .map_err(|e| StudioError::Config(format!("{e:#}")))
}

/// Build and validate a config from an optional file tree and an env map.
pub fn load_with(
    file_value: Option<Value>,
    env: &HashMap<String, String>,
) -> Result<StudioConfig, StudioError> {
    let config = build(file_value, env)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, detail = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, detail = %error.message, "Config error");
        }
        return Err(StudioError::Config(first.to_string()));
    }

    Ok(config)
}

fn build(
    file_value: Option<Value>,
    env: &HashMap<String, String>,
) -> Result<StudioConfig, StudioError> {
    let config = match file_value {
        Some(value) => {
            let value = resolve_env_vars_with(&value, env)
                .map_err(|e| StudioError::Config(format!("{e:#}")))?;
            serde_json::from_value(value)
                .map_err(|e| StudioError::Config(format!("invalid config file: {e}")))?
        }
        None => StudioConfig::default(),
    };

    Ok(apply_env_overrides(config, env))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn missing_credential_fails_fast() {
        let err = load_with(None, &HashMap::new()).unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("apiKey"));
    }

    #[test]
    fn credential_from_env_is_enough() {
        let config = load_with(None, &env(&[("API_KEY", "k-123")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.model, schema::DEFAULT_MODEL);
        assert_eq!(config.poll_interval_secs, 10);
    }

    #[test]
    fn file_values_are_substituted_then_overridden() {
        let file = parse_config_yaml(
            "apiKey: ${MY_KEY}\nmodel: veo-custom\npollIntervalSecs: 7\n",
        )
        .unwrap();
        let config = load_with(
            Some(file),
            &env(&[("MY_KEY", "from-file"), ("FLATFRAME_MODEL", "veo-env")]),
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.model, "veo-env");
        assert_eq!(config.poll_interval_secs, 7);
    }

    #[test]
    fn build_skips_credential_check() {
        let config = build(None, &env(&[("FLATFRAME_FFMPEG", "/opt/ffmpeg")])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.ffmpeg_path, "/opt/ffmpeg");
    }

    #[test]
    fn unresolved_file_reference_is_config_error() {
        let file = parse_config_yaml("apiKey: ${NOPE}\n").unwrap();
        let err = load_with(Some(file), &HashMap::new()).unwrap_err();
        assert!(matches!(err, StudioError::Config(ref m) if m.contains("NOPE")));
    }
}
