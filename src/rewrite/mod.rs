//! Rewrite engine subsystem.
//!
//! # Data Flow
//! ```text
//! raw URL
//!     → template::parse
//!     → RewriteEngine::evaluate (loads current RuleSet snapshot)
//!         for each rule applying to the direction, in order:
//!             fresh RewriteContext
//!             → matcher::matches(input, rule.pattern)
//!             → Step::evaluate (match / rewrite / all / any)
//!                 → Rewriter → FunctionRegistry::resolve
//!             first success commits; errors are logged and skipped
//!     → template::format
//! ```
//!
//! # Design Decisions
//! - Templates are never mutated; every rewrite produces a new one
//! - Contexts are per rule evaluation and never shared across threads
//! - Rule sets, rules and the function registry are immutable and read without locks
//! - The only shared mutable state is the rule set pointer, swapped via `arc-swap`

pub mod context;
pub mod engine;
pub mod error;
pub mod flow;
pub mod matcher;
pub mod rewriter;
pub mod rule;

pub use context::{Direction, DirectionParseError, RewriteContext, UnboundCapturePolicy};
pub use engine::{apply, RewriteEngine, RewriteOptions, RewriteOutcome};
pub use error::{RewriteError, RewriteUrlError, RuleError};
pub use flow::Step;
pub use matcher::matches;
pub use rewriter::Rewriter;
pub use rule::{Rule, RuleSet};
