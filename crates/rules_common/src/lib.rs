//! Shared types for the local rules engine: configuration, wire schemas and errors.

pub mod config;
pub mod error;
pub mod schemas;

pub use config::{Config, OllamaConfig, RulesConfig, ServerConfig};
pub use error::{EngineError, EvaluationError, ValidationError};
pub use schemas::{
    ErrorResponse, EvaluateRequest, EvaluateResponse, FailureResponse, HealthResponse,
    OllamaChatRequest, OllamaChatResponse, OllamaMessage, OllamaModelEntry, OllamaTagsResponse,
    ServiceInfo,
};

/// Human-readable service name reported by the HTTP surface.
pub const SERVICE_NAME: &str = "Local Rules Engine";

/// Crate version, shared by the daemon for health and info responses.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
