//! Environment handling: `${VAR}` substitution in config files and direct
//! environment overrides.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${VAR}` escapes to a literal `${VAR}`.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::schema::StudioConfig;

/// Matches `${VAR}` and the escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Credential variables, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in a config value tree using `env`.
///
/// Only string leaves are processed. Fails if any referenced variable is unset
/// or empty.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply `FLATFRAME_*` and credential variables on top of a loaded config.
///
/// Unparseable numeric values are ignored and the file/default value kept.
pub fn apply_env_overrides(mut config: StudioConfig, env: &HashMap<String, String>) -> StudioConfig {
    let get = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

    if let Some(key) = API_KEY_VARS.iter().find_map(|name| get(*name)) {
        config.api_key = Some(key);
    }
    if let Some(url) = get("FLATFRAME_API_BASE_URL") {
        config.api_base_url = url;
    }
    if let Some(model) = get("FLATFRAME_MODEL") {
        config.model = model;
    }
    if let Some(secs) = get("FLATFRAME_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.poll_interval_secs = secs;
    }
    if let Some(max) = get("FLATFRAME_MAX_POLL_ATTEMPTS").and_then(|v| v.parse().ok()) {
        config.max_poll_attempts = Some(max);
    }
    if let Some(secs) = get("FLATFRAME_POLL_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.poll_timeout_secs = Some(secs);
    }
    if let Some(path) = get("FLATFRAME_FFMPEG") {
        config.ffmpeg_path = path;
    }
    if let Some(path) = get("FLATFRAME_FFPROBE") {
        config.ffprobe_path = path;
    }
    if let Some(bind) = get("FLATFRAME_BIND") {
        config.bind_address = bind;
    }
    if let Some(port) = get("FLATFRAME_PORT").and_then(|v| v.parse().ok()) {
        config.port = port;
    }
    if let Some(dir) = get("FLATFRAME_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(level) = get("RUST_LOG") {
        config.log_level = level;
    }
    if let Some(dir) = get("FLATFRAME_LOG_DIR") {
        config.log_dir = PathBuf::from(dir);
    }
    config
}
