//! Redaction: keep the credential out of logs and diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Keys whose string values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "apikey",
    "key",
    "token",
    "accessToken",
    "access_token",
    "secret",
    "password",
];

/// Credential query parameters, e.g. `?alt=media&key=...`.
static KEY_PARAM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([?&](?:key|api_key|apikey|access_token)=)[^&#]*").unwrap());

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Mask a secret, keeping the first 4 characters as a hint.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 4 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

/// Redact a config JSON value, replacing sensitive fields with a masked hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            Value::String(mask_secret(s))
        }
        Value::String(s) => Value::String(redact_url(s)),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

/// Mask credential query parameters in a URL.
pub fn redact_url(url: &str) -> String {
    KEY_PARAM_PATTERN.replace_all(url, "${1}***").into_owned()
}
