//! Gateway failure payloads and message extraction.

use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure reported by a platform gateway call.
///
/// Gateways report errors in more than one shape: `{body: {message}}` from
/// REST-style responses, `{message}` from thrown client errors, or arbitrary
/// JSON with embedded `"message"` fields. The payload is kept intact so error
/// continuations receive the original structure; [`GatewayError::message`]
/// extracts a human-readable summary for toasts and logs.
#[derive(Debug, Clone, Error)]
#[error("{}", self.message())]
pub struct GatewayError {
    payload: Value,
}

impl GatewayError {
    /// Builds an error from a plain message string.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            payload: json!({ "message": message.into() }),
        }
    }

    /// Wraps a structured error payload as received from the platform.
    pub fn from_payload(payload: Value) -> Self {
        Self { payload }
    }

    /// The original payload, handed to error continuations as context.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Human-readable message extracted from the payload.
    pub fn message(&self) -> String {
        extract_error_message(&self.payload)
    }
}

/// Extracts a display message from a gateway error payload.
///
/// Tries `{body: {message}}`, then `{message}`, then a bare string payload.
/// As a last resort the serialized payload is scanned for `"message":"..."`
/// fragments and every hit is concatenated, one per line.
pub fn extract_error_message(payload: &Value) -> String {
    if let Some(msg) = payload.pointer("/body/message").and_then(Value::as_str) {
        return msg.to_string();
    }
    if let Some(msg) = payload.get("message").and_then(Value::as_str) {
        return msg.to_string();
    }
    if let Some(msg) = payload.as_str() {
        return msg.to_string();
    }
    let serialized = payload.to_string();
    let re = Regex::new(r#""message"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    let parts: Vec<String> = re
        .captures_iter(&serialized)
        .map(|cap| cap[1].to_string())
        .collect();
    if parts.is_empty() {
        serialized
    } else {
        parts.join("\n")
    }
}
