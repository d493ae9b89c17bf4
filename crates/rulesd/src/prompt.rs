//! Prompt composition.
//!
//! Layout: the full rule text, an input marker, the input in double quotes,
//! then the closing instruction. Quotes inside the input are not escaped and
//! nothing is truncated; length limits are the backend's concern.

use crate::rules::RuleSet;

pub const INPUT_MARKER: &str = "ANALYZE THE FOLLOWING INPUT:";
pub const CLOSING_INSTRUCTION: &str = "Apply the rules above and provide your analysis:";

/// The single instruction string sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Merge rules and input into one prompt
pub fn compose(rules: &RuleSet, input: &str) -> Prompt {
    Prompt(format!(
        "{}\n\n{}\n\"{}\"\n\n{}",
        rules.as_str(),
        INPUT_MARKER,
        input,
        CLOSING_INSTRUCTION
    ))
}
