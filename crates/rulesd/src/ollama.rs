//! Model gateway - talks to the local Ollama API.
//!
//! Two operations: list the installed models to confirm the configured one
//! is present, and run a single non-streaming chat completion. Both are
//! bounded by a timeout; neither retries. The listing also backs a one-off
//! startup check that only warns.

use crate::prompt::Prompt;
use async_trait::async_trait;
use rules_common::{
    EngineError, OllamaChatRequest, OllamaChatResponse, OllamaConfig, OllamaMessage,
    OllamaTagsResponse,
};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Connection establishment limit, separate from the per-call budget
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Backend operations the engine depends on
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Configured model name
    fn model_name(&self) -> &str;

    /// True when any installed model's name contains the configured name.
    /// Errors only when the listing itself cannot be obtained.
    async fn verify_model(&self) -> Result<bool, EngineError>;

    /// Send the prompt as the sole user message and return the reply text
    async fn chat(&self, prompt: &Prompt) -> Result<String, EngineError>;
}

/// Result of the non-fatal model check run when the daemon starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Installed,
    /// Backend answered but lacks the model; carries what it does have
    Missing(Vec<String>),
    /// Listing failed; carries the error message
    Unreachable(String),
}

/// Ollama HTTP client
pub struct OllamaGateway {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    list_timeout: Duration,
    chat_timeout: Duration,
}

impl OllamaGateway {
    pub fn new(config: &OllamaConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            list_timeout: Duration::from_secs(config.list_timeout_secs),
            chat_timeout: Duration::from_secs(config.chat_timeout_secs),
        }
    }

    /// Override both call budgets
    pub fn with_timeouts(mut self, list: Duration, chat: Duration) -> Self {
        self.list_timeout = list;
        self.chat_timeout = chat;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Names of all models the backend currently has installed
    pub async fn available_models(&self) -> Result<Vec<String>, EngineError> {
        let url = format!("{}/api/tags", self.endpoint);

        let exchange = async {
            let response = self.http_client.get(&url).send().await?.error_for_status()?;
            Ok::<_, reqwest::Error>(response.json::<OllamaTagsResponse>().await?)
        };

        let tags = bounded(self.list_timeout, exchange)
            .await
            .map_err(|e| EngineError::BackendUnavailable(format!("Error verifying models: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check the backend once at startup and warn if evaluations would fail.
    /// Never fails: the backend may come up or get the model later, and
    /// every request re-verifies anyway.
    pub async fn startup_check(&self) -> ModelStatus {
        match self.available_models().await {
            Ok(models) if has_model(&models, &self.model) => {
                info!("Model {} available at {}", self.model, self.endpoint);
                ModelStatus::Installed
            }
            Ok(models) => {
                warn!(
                    "Model {} is not installed at {}; run `ollama pull {}`. Available: [{}]",
                    self.model,
                    self.endpoint,
                    self.model,
                    models.join(", ")
                );
                ModelStatus::Missing(models)
            }
            Err(e) => {
                warn!("Ollama not reachable at {}: {}", self.endpoint, e);
                ModelStatus::Unreachable(e.to_string())
            }
        }
    }
}

/// Substring match, so "llama3" accepts "llama3:latest"
fn has_model(models: &[String], model: &str) -> bool {
    models.iter().any(|name| name.contains(model))
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn verify_model(&self) -> Result<bool, EngineError> {
        let models = self.available_models().await?;

        if has_model(&models, &self.model) {
            debug!("Model {} is available", self.model);
            return Ok(true);
        }

        warn!(
            "Model {} not found. Available models: [{}]",
            self.model,
            models.join(", ")
        );
        Ok(false)
    }

    async fn chat(&self, prompt: &Prompt) -> Result<String, EngineError> {
        let url = format!("{}/api/chat", self.endpoint);
        let body = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage::user(prompt.as_str())],
            stream: false,
        };

        debug!("Chat request to {} ({} chars)", self.model, prompt.as_str().len());
        let start = Instant::now();

        let exchange = async {
            let response = self.http_client.post(&url).json(&body).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = bounded(self.chat_timeout, exchange).await.map_err(|e| {
            EngineError::BackendUnavailable(format!("Error communicating with Ollama: {}", e))
        })?;

        if !status.is_success() {
            return Err(EngineError::BackendResponse(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&bytes).trim()
            )));
        }

        let parsed: OllamaChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::BackendResponse(format!("invalid chat response: {}", e)))?;

        let content = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| EngineError::BackendResponse("missing message.content".to_string()))?;

        info!(
            "Model {} answered in {}ms ({} chars)",
            self.model,
            start.elapsed().as_millis(),
            content.len()
        );
        Ok(content)
    }
}

/// Failure of a bounded backend call
#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, reqwest::Error>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(CallError::from),
        Err(_) => Err(CallError::Timeout(limit)),
    }
}
