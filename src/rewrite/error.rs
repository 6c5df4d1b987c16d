//! Rewrite and rule-loading errors.

use thiserror::Error;

use crate::rewrite::context::DirectionParseError;
use crate::template::TemplateSyntaxError;

/// Failure while evaluating one rule. Aborts that rule only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// A rewrite target references a capture that no match bound.
    #[error("capture `{0}` is referenced but was never bound")]
    UnboundCapture(String),

    /// A function reference names a function that is not registered.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    /// The collaborator behind a function could not satisfy the lookup.
    #[error("function `{function}` could not resolve `{arg}`: {reason}")]
    FunctionResolution {
        function: String,
        arg: String,
        reason: String,
    },

    /// Resolving a function required resolving itself with the same argument.
    #[error("function `{function}` recursively requires itself for `{arg}`")]
    Cycle { function: String, arg: String },

    /// A function produced text that had to be parsed and was malformed.
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),
}

impl RewriteError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteError::UnboundCapture(_) => "unbound_capture",
            RewriteError::UnknownFunction(_) => "unknown_function",
            RewriteError::FunctionResolution { .. } => "function_resolution",
            RewriteError::Cycle { .. } => "cycle",
            RewriteError::Syntax(_) => "syntax",
        }
    }
}

/// Failure to rewrite a raw URL. Only the input itself can make this fail;
/// per-rule errors are logged and the next rule is tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteUrlError {
    #[error("cannot rewrite malformed URL: {0}")]
    Parse(#[from] TemplateSyntaxError),
}

/// Failure while compiling a rule definition. Fatal to the whole rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule #{0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate rule name `{0}`")]
    DuplicateRule(String),

    #[error("rule `{rule}`: {source}")]
    Syntax {
        rule: String,
        source: TemplateSyntaxError,
    },

    #[error("rule `{rule}`: {source}")]
    InvalidDirection {
        rule: String,
        source: DirectionParseError,
    },

    #[error("rule `{rule}` has no directions")]
    NoDirections { rule: String },

    #[error("rule `{rule}`: capture `{name}` is bound more than once in one pattern")]
    DuplicateCapture { rule: String, name: String },

    #[error("rule `{rule}`: function `{function}` cannot appear in a match pattern")]
    FunctionInPattern { rule: String, function: String },

    #[error("rule `{rule}`: unknown function `{function}`")]
    UnknownFunction { rule: String, function: String },

    #[error("rule `{rule}`: capture `{name}` is referenced but never bound")]
    UnboundCapture { rule: String, name: String },

    #[error("rule `{rule}` has an empty flow")]
    EmptyFlow { rule: String },

    #[error("rule `{rule}` sets both `flow` and `rewrite`")]
    AmbiguousFlow { rule: String },
}

impl RuleError {
    /// Name of the offending rule, when it has one.
    pub fn rule(&self) -> Option<&str> {
        match self {
            RuleError::EmptyName(_) => None,
            RuleError::DuplicateRule(rule)
            | RuleError::Syntax { rule, .. }
            | RuleError::InvalidDirection { rule, .. }
            | RuleError::NoDirections { rule }
            | RuleError::DuplicateCapture { rule, .. }
            | RuleError::FunctionInPattern { rule, .. }
            | RuleError::UnknownFunction { rule, .. }
            | RuleError::UnboundCapture { rule, .. }
            | RuleError::EmptyFlow { rule }
            | RuleError::AmbiguousFlow { rule } => Some(rule),
        }
    }
}
