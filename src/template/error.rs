//! Template syntax errors.

use thiserror::Error;

/// Malformed template string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template `{input}` at offset {offset}: {reason}")]
pub struct TemplateSyntaxError {
    /// The full string that failed to parse.
    pub input: String,
    /// Byte offset of the offending character.
    pub offset: usize,
    /// Human-readable reason.
    pub reason: String,
}

impl TemplateSyntaxError {
    pub fn new(input: &str, offset: usize, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            offset,
            reason: reason.into(),
        }
    }
}
