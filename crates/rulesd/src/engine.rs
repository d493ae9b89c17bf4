//! Rules engine - runs one evaluation end to end.
//!
//! Flow (strictly sequential, stops at the first failure):
//! 1. Confirm the configured model is installed
//! 2. Load the rule set
//! 3. Compose the prompt
//! 4. Ask the model
//!
//! Every failure leaves as an `EvaluationError` carrying the stage's message.

use crate::ollama::{ModelGateway, OllamaGateway};
use crate::prompt::{compose, Prompt};
use crate::rules::{FileRuleRepository, RuleSource};
use rules_common::{Config, EngineError, EvaluationError};
use std::sync::Arc;
use tracing::{debug, info};

/// Built once at startup and shared by all requests. Holds no per-request
/// state, so concurrent evaluations do not interact.
#[derive(Clone)]
pub struct RulesEngine {
    gateway: Arc<dyn ModelGateway>,
    rules: Arc<dyn RuleSource>,
}

impl RulesEngine {
    pub fn new(gateway: Arc<dyn ModelGateway>, rules: Arc<dyn RuleSource>) -> Self {
        Self { gateway, rules }
    }

    /// Engine backed by Ollama and the configured rule file
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(OllamaGateway::new(&config.ollama)),
            Arc::new(FileRuleRepository::new(&config.rules.path)),
        )
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    /// Steps 1-3: verify the model, load rules, compose the prompt
    pub async fn prepare(&self, input: &str) -> Result<Prompt, EvaluationError> {
        if !self.gateway.verify_model().await? {
            return Err(EngineError::ModelUnavailable {
                model: self.gateway.model_name().to_string(),
            }
            .into());
        }

        let rules = self.rules.load_rules().await?;
        let prompt = compose(&rules, input);
        debug!("Composed prompt ({} chars)", prompt.as_str().len());
        Ok(prompt)
    }

    /// Evaluate the input against the current rule set
    pub async fn evaluate(&self, input: &str) -> Result<String, EvaluationError> {
        let prompt = self.prepare(input).await?;

        info!("Sending to model {}...", self.gateway.model_name());
        let reply = self.gateway.chat(&prompt).await?;
        Ok(reply)
    }
}
