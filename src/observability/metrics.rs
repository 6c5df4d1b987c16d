//! Rewrite metrics.
//!
//! # Metrics
//! - `rewrite_evaluations_total` (counter): evaluations by direction, outcome
//! - `rewrite_rule_errors_total` (counter): aborted rules by rule, error kind
//! - `rewrite_function_calls_total` (counter): resolutions by function, outcome
//! - `rewrite_ruleset_reloads_total` (counter): rule set reloads by outcome
//!
//! # Design Decisions
//! - Label values come from closed sets (rule names are fixed by configuration)
//! - Nothing is recorded unless the process installs a recorder

use metrics::counter;

use crate::rewrite::context::Direction;

/// Metric names as constants for consistency.
pub mod names {
    pub const EVALUATIONS_TOTAL: &str = "rewrite_evaluations_total";
    pub const RULE_ERRORS_TOTAL: &str = "rewrite_rule_errors_total";
    pub const FUNCTION_CALLS_TOTAL: &str = "rewrite_function_calls_total";
    pub const RULESET_RELOADS_TOTAL: &str = "rewrite_ruleset_reloads_total";
}

/// Record one evaluation. `outcome` is `rewritten` or `unchanged`.
pub fn record_evaluation(direction: Direction, outcome: &'static str) {
    counter!(
        names::EVALUATIONS_TOTAL,
        "direction" => direction.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a rule aborted by a rewrite error.
pub fn record_rule_error(rule: &str, kind: &'static str) {
    counter!(
        names::RULE_ERRORS_TOTAL,
        "rule" => rule.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record a function resolution. `outcome` is `resolved`, `cached`, `failed` or `cycle`.
pub fn record_function_call(function: &str, outcome: &'static str) {
    counter!(
        names::FUNCTION_CALLS_TOTAL,
        "function" => function.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a rule set reload. `outcome` is `success` or `failed`.
pub fn record_reload(outcome: &'static str) {
    counter!(names::RULESET_RELOADS_TOTAL, "outcome" => outcome).increment(1);
}
