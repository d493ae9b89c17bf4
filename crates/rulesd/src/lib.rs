//! Local rules engine daemon - exposes modules for testing.

pub mod engine;
pub mod ollama;
pub mod prompt;
pub mod routes;
pub mod rules;
pub mod server;

pub use engine::RulesEngine;
pub use ollama::{ModelGateway, ModelStatus, OllamaGateway};
pub use prompt::{compose, Prompt};
pub use rules::{FileRuleRepository, RuleSet, RuleSource};
pub use server::AppState;
