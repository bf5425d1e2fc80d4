use serde_json::Value;

use crate::model::error::ModelError;

/// Extracts generated text from a `/api/generate` body.
///
/// Accepts, in order: a string `response` field, a `message` field (string
/// or chat-style `{ "content": ... }`), a string `content` field. Any other
/// JSON is returned as its serialized form rather than rejected. Only a body
/// that is not JSON at all is an error.
pub fn parse_generate_body(body: &str) -> Result<String, ModelError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ModelError::Malformed(format!("{} in body: {}", e, truncate(body, 150)))
    })?;
    Ok(extract_text(&value))
}

pub fn extract_text(value: &Value) -> String {
    if let Some(text) = value.get("response").and_then(Value::as_str) {
        return text.to_string();
    }
    match value.get("message") {
        Some(Value::String(text)) => return text.clone(),
        Some(message) => {
            if let Some(text) = message.get("content").and_then(Value::as_str) {
                return text.to_string();
            }
        }
        None => {}
    }
    if let Some(text) = value.get("content").and_then(Value::as_str) {
        return text.to_string();
    }
    value.to_string()
}

/// Message from an error body: its `error` field when it has one, otherwise
/// the raw body (or the status text for an empty body).
pub fn error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("error") {
            Some(Value::String(msg)) => msg.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        Err(_) if body.trim().is_empty() => fallback.to_string(),
        Err(_) => truncate(body, 200).to_string(),
    }
}

/// Model names from a `/api/tags` body.
pub fn parse_model_names(body: &str) -> Result<Vec<String>, ModelError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ModelError::Malformed(format!("model list: {}", e)))?;
    let models = value
        .get("models")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::Malformed("model list has no 'models' array".to_string()))?;
    Ok(models
        .iter()
        .filter_map(|m| m.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Version string from a `/api/version` body.
pub fn parse_version(body: &str) -> Result<String, ModelError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ModelError::Malformed(format!("version: {}", e)))?;
    value
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ModelError::Malformed("version body has no 'version' field".to_string()))
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
