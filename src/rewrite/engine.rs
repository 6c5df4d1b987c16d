//! Rule evaluation and the shared rewrite engine.
//!
//! # Responsibilities
//! - Evaluate rules in declaration order, first success wins
//! - Give every rule a fresh context so failed rules leave nothing behind
//! - Swap rule sets atomically while evaluations are in flight
//!
//! # Design Decisions
//! - `apply` is a pure function of its inputs; `RewriteEngine` only adds the
//!   atomically swappable rule set and default options
//! - A rule that errors is logged and counted, then the next rule is tried
//! - No rule matching is not an error: the input comes back unchanged

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use uuid::Uuid;

use crate::config::schema::{RewriteConfig, RuleConfig};
use crate::functions::{Deadline, FunctionRegistry};
use crate::observability::metrics;
use crate::rewrite::context::{Direction, RewriteContext, UnboundCapturePolicy};
use crate::rewrite::error::{RewriteUrlError, RuleError};
use crate::rewrite::matcher;
use crate::rewrite::rewriter::Rewriter;
use crate::rewrite::rule::RuleSet;
use crate::template::{self, Template};

/// Evaluation settings shared by every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    pub unbound_capture: UnboundCapturePolicy,
    /// Budget for function resolution per evaluation. `None` is unbounded.
    pub function_timeout: Option<Duration>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            unbound_capture: UnboundCapturePolicy::Fail,
            function_timeout: Some(Duration::from_millis(250)),
        }
    }
}

impl From<&RewriteConfig> for RewriteOptions {
    fn from(config: &RewriteConfig) -> Self {
        Self {
            unbound_capture: config.unbound_capture,
            function_timeout: Some(Duration::from_millis(config.function_timeout_ms)),
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutcome {
    pub template: Template,
    /// Rule whose flow succeeded, if any.
    pub rule: Option<String>,
}

impl RewriteOutcome {
    pub fn is_rewritten(&self) -> bool {
        self.rule.is_some()
    }
}

/// Evaluate `rules` against `input`.
pub fn apply(
    rules: &RuleSet,
    functions: &FunctionRegistry,
    direction: Direction,
    input: &Template,
    policy: UnboundCapturePolicy,
    deadline: &Deadline,
) -> RewriteOutcome {
    let evaluation_id = Uuid::new_v4();
    let span = tracing::debug_span!("rewrite", evaluation_id = %evaluation_id, direction = %direction);
    let _guard = span.enter();
    let rewriter = Rewriter::new(functions);

    for rule in rules.iter().filter(|rule| rule.applies_to(direction)) {
        let mut ctx = RewriteContext::new(direction)
            .with_policy(policy)
            .with_deadline(deadline.clone())
            .with_evaluation_id(evaluation_id);
        if !matcher::matches(input, rule.pattern(), &mut ctx) {
            continue;
        }

        let mut current = input.clone();
        match rule.flow().evaluate(&mut current, &mut ctx, rewriter) {
            Ok(true) => {
                tracing::debug!(
                    rule = %rule.name(),
                    input = %input,
                    output = %current,
                    functions = ctx.cached_functions(),
                    "Rule committed"
                );
                metrics::record_evaluation(direction, "rewritten");
                return RewriteOutcome {
                    template: current,
                    rule: Some(rule.name().to_string()),
                };
            }
            Ok(false) => {
                tracing::trace!(rule = %rule.name(), "Rule flow did not succeed");
            }
            Err(error) => {
                tracing::warn!(
                    rule = %rule.name(),
                    direction = %direction,
                    error = %error,
                    "Rule aborted, trying next rule"
                );
                metrics::record_rule_error(rule.name(), error.kind());
            }
        }
    }

    metrics::record_evaluation(direction, "unchanged");
    RewriteOutcome {
        template: input.clone(),
        rule: None,
    }
}

/// Shared engine: the current rule set plus the function registry.
///
/// Evaluations load the rule set once and keep that snapshot to the end, so a
/// concurrent `reload` never affects an evaluation already in progress.
#[derive(Debug)]
pub struct RewriteEngine {
    rules: ArcSwap<RuleSet>,
    functions: Arc<FunctionRegistry>,
    options: RewriteOptions,
}

impl RewriteEngine {
    pub fn new(rules: RuleSet, functions: Arc<FunctionRegistry>, options: RewriteOptions) -> Self {
        Self {
            rules: ArcSwap::from_pointee(rules),
            functions,
            options,
        }
    }

    /// Compile rule definitions and build an engine around them.
    pub fn compile(
        configs: &[RuleConfig],
        functions: Arc<FunctionRegistry>,
        options: RewriteOptions,
    ) -> Result<Self, RuleError> {
        let rules = RuleSet::compile(configs, &functions, options.unbound_capture)?;
        Ok(Self::new(rules, functions, options))
    }

    /// Snapshot of the current rule set.
    pub fn rules(&self) -> Arc<RuleSet> {
        self.rules.load_full()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Replace the rule set. Returns the previous one.
    pub fn reload(&self, rules: RuleSet) -> Arc<RuleSet> {
        let count = rules.len();
        let previous = self.rules.swap(Arc::new(rules));
        metrics::record_reload("success");
        tracing::info!(rules = count, previous = previous.len(), "Rule set reloaded");
        previous
    }

    /// Compile rule definitions against this engine's functions and policy
    /// without swapping them in.
    pub fn prepare(&self, configs: &[RuleConfig]) -> Result<RuleSet, RuleError> {
        RuleSet::compile(configs, &self.functions, self.options.unbound_capture).inspect_err(|error| {
            metrics::record_reload("failed");
            tracing::error!(error = %error, "Rule set reload failed, keeping current rules");
        })
    }

    /// Compile and swap in new rule definitions. On error the current set stays.
    pub fn reload_from(&self, configs: &[RuleConfig]) -> Result<Arc<RuleSet>, RuleError> {
        self.prepare(configs).map(|rules| self.reload(rules))
    }

    /// Deadline for one evaluation under the configured timeout.
    pub fn deadline(&self) -> Deadline {
        self.options
            .function_timeout
            .map(Deadline::after)
            .unwrap_or_default()
    }

    pub fn evaluate(&self, direction: Direction, input: &Template) -> RewriteOutcome {
        self.evaluate_within(direction, input, &self.deadline())
    }

    /// Evaluate under a caller-supplied deadline, e.g. one tied to the request.
    pub fn evaluate_within(&self, direction: Direction, input: &Template, deadline: &Deadline) -> RewriteOutcome {
        let rules = self.rules.load();
        apply(
            &rules,
            &self.functions,
            direction,
            input,
            self.options.unbound_capture,
            deadline,
        )
    }

    /// Rewrite an already-parsed template, e.g. a URL found in a header.
    pub fn rewrite_template(&self, input: &Template, direction: Direction) -> Template {
        self.evaluate(direction, input).template
    }

    /// Rewrite a raw URL.
    ///
    /// Only a malformed input is an error. When no rule applies the input is
    /// returned exactly as given, not re-formatted.
    pub fn rewrite_url(&self, raw: &str, direction: Direction) -> Result<String, RewriteUrlError> {
        let input = template::parse_url(raw)?;
        let outcome = self.evaluate(direction, &input);
        Ok(match outcome.rule {
            Some(_) => template::format(&outcome.template),
            None => raw.to_string(),
        })
    }
}
