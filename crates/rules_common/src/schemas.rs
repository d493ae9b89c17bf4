//! Wire schemas: the HTTP API payloads and the Ollama API payloads.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Ollama API
// ============================================================================

/// Ollama message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

impl OllamaMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Ollama chat request (`POST /api/chat`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    #[serde(default)]
    pub stream: bool,
}

/// Ollama chat response. `message` is optional so a reply without it can be
/// reported as a malformed response rather than a decoding failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub message: Option<OllamaMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

/// Ollama model listing (`GET /api/tags`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaTagsResponse {
    pub models: Vec<OllamaModelEntry>,
}

/// One locally available model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModelEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

// ============================================================================
// HTTP API
// ============================================================================

/// `POST /evaluate` body. Both field names are accepted; values are kept as
/// raw JSON so non-string input can be rejected with a clear message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
}

impl EvaluateRequest {
    /// Pick the text to analyze: `text` wins unless it is falsy
    /// (null, false, 0 or ""), in which case `input` is used.
    pub fn text_to_analyze(&self) -> Result<&str, ValidationError> {
        let chosen = self
            .text
            .as_ref()
            .filter(|v| is_truthy(v))
            .or(self.input.as_ref())
            .filter(|v| is_truthy(v))
            .ok_or(ValidationError::MissingText)?;

        let text = chosen.as_str().ok_or(ValidationError::MissingText)?;
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(text)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Successful evaluation. `analysis` and `result` carry the same text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub success: bool,
    pub input: String,
    pub analysis: String,
    pub result: String,
    pub timestamp: String,
}

impl EvaluateResponse {
    pub fn new(input: &str, result: String, timestamp: String) -> Self {
        Self {
            success: true,
            input: input.to_string(),
            analysis: result.clone(),
            result,
            timestamp,
        }
    }
}

/// 400 body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 500 body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    pub details: String,
    pub kind: String,
}

impl FailureResponse {
    pub fn internal(details: String, kind: &str) -> Self {
        Self {
            success: false,
            error: "Internal server error".to_string(),
            details,
            kind: kind.to_string(),
        }
    }
}

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

/// `GET /` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
    pub example: UsageExample,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageExample {
    pub url: String,
    pub body: Value,
}

impl ServiceInfo {
    pub fn describe(service: &str, version: &str) -> Self {
        let endpoints = [
            ("POST /evaluate", "Evaluates input using rules and local AI"),
            ("GET /health", "Service health check"),
            ("GET /", "API information"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            service: service.to_string(),
            version: version.to_string(),
            endpoints,
            example: UsageExample {
                url: "POST /evaluate".to_string(),
                body: serde_json::json!({
                    "text": "John has email john@test.com and the number 1500"
                }),
            },
        }
    }
}
