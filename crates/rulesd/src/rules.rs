//! Rule repository - loads the rule set from its text file.
//!
//! The file is read again on every call, so edits take effect on the next
//! request without a restart.

use async_trait::async_trait;
use rules_common::EngineError;
use std::path::PathBuf;
use tracing::debug;

/// Opaque rule text handed to the model as instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet(String);

impl RuleSet {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source of the current rule set
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn load_rules(&self) -> Result<RuleSet, EngineError>;
}

/// Rule set stored in a plain text file
#[derive(Debug, Clone)]
pub struct FileRuleRepository {
    path: PathBuf,
}

impl FileRuleRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RuleSource for FileRuleRepository {
    async fn load_rules(&self) -> Result<RuleSet, EngineError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| EngineError::RuleLoad(format!("{}: {}", self.path.display(), e)))?;
        debug!("Loaded {} bytes of rules from {}", text.len(), self.path.display());
        Ok(RuleSet(text))
    }
}
