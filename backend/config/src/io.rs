//! Config file discovery and loading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the flatframe config directory.
/// Priority: `FLATFRAME_CONFIG_DIR` env > `<platform config dir>/flatframe`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FLATFRAME_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|dir| dir.join("flatframe"))
        .unwrap_or_else(|| PathBuf::from(".flatframe"))
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read a YAML config file into an untyped tree, ready for `${VAR}` substitution.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub async fn load_config_value(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value = parse_config_yaml(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(Some(value))
}

/// Parse YAML text; an empty document counts as an empty mapping.
pub fn parse_config_yaml(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let value: Value = serde_yaml::from_str(raw)?;
    Ok(match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let value = parse_config_yaml("model: veo-test\npollIntervalSecs: 5\n").unwrap();
        assert_eq!(value["model"], "veo-test");
        assert_eq!(value["pollIntervalSecs"], 5);
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        let value = parse_config_yaml("").unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_yields_none() {
        let path = std::env::temp_dir().join("flatframe-does-not-exist").join("config.yaml");
        assert!(load_config_value(&path).await.unwrap().is_none());
    }
}
