//! Error types for the rules engine.

use thiserror::Error;

/// Failures raised by the engine's internal stages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Error loading rules: {0}")]
    RuleLoad(String),

    #[error("Model '{model}' not found in Ollama (install it with `ollama pull {model}`)")]
    ModelUnavailable { model: String },

    #[error("{0}")]
    BackendUnavailable(String),

    #[error("Error communicating with Ollama: unexpected response: {0}")]
    BackendResponse(String),
}

impl EngineError {
    /// Stable tag for logs and HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::RuleLoad(_) => "rule_load",
            EngineError::ModelUnavailable { .. } => "model_unavailable",
            EngineError::BackendUnavailable(_) => "backend_unavailable",
            EngineError::BackendResponse(_) => "backend_response",
        }
    }
}

/// The single error an evaluation surfaces to its caller.
///
/// Wraps whichever stage failed; the message keeps the stage's text and
/// `kind()` keeps its tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error applying rules: {source}")]
pub struct EvaluationError {
    #[from]
    source: EngineError,
}

impl EvaluationError {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }

    pub fn engine_error(&self) -> &EngineError {
        &self.source
    }
}

/// Request payload problems, detected before the engine is involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"text\" or \"input\" field is required and must be a string")]
    MissingText,

    #[error("Input cannot be empty")]
    EmptyText,

    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    #[error("Request body exceeds the {0}-byte limit")]
    BodyTooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_error_keeps_stage_message() {
        let err = EvaluationError::from(EngineError::RuleLoad("No such file".to_string()));
        assert_eq!(
            err.to_string(),
            "Error applying rules: Error loading rules: No such file"
        );
        assert_eq!(err.kind(), "rule_load");
    }

    #[test]
    fn test_model_unavailable_is_actionable() {
        let err = EngineError::ModelUnavailable {
            model: "llama3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("llama3"));
        assert!(msg.contains("ollama pull llama3"));
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn test_backend_response_names_the_backend() {
        let err = EngineError::BackendResponse("HTTP 500 Internal Server Error: boom".to_string());
        assert_eq!(
            err.to_string(),
            "Error communicating with Ollama: unexpected response: HTTP 500 Internal Server Error: boom"
        );
    }

    #[test]
    fn test_body_too_large_names_limit() {
        assert_eq!(
            ValidationError::BodyTooLarge(1_048_576).to_string(),
            "Request body exceeds the 1048576-byte limit"
        );
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            EngineError::RuleLoad(String::new()).kind(),
            EngineError::ModelUnavailable {
                model: String::new(),
            }
            .kind(),
            EngineError::BackendUnavailable(String::new()).kind(),
            EngineError::BackendResponse(String::new()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
