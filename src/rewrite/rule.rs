//! Rules and rule sets.
//!
//! # Responsibilities
//! - Compile rule definitions into patterns and flow trees
//! - Reject configuration errors before any traffic is evaluated
//!
//! # Design Decisions
//! - A `RuleSet` is immutable; reload builds a new one and swaps it in
//! - Checks that can be made statically are made at load time: functions in
//!   patterns, duplicate captures, unknown functions, and (under the `fail`
//!   policy) references to captures no pattern in the rule can bind

use std::collections::HashSet;

use crate::config::schema::{FlowConfig, RuleConfig};
use crate::functions::FunctionRegistry;
use crate::rewrite::context::{Direction, UnboundCapturePolicy};
use crate::rewrite::error::RuleError;
use crate::rewrite::flow::Step;
use crate::rewrite::rewriter::QUERY_REST_BINDING;
use crate::template::{parse, Span, Template, Value, GLOB_BINDING};

/// A named pattern plus the flow run when it matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    directions: Vec<Direction>,
    pattern: Template,
    flow: Step,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        directions: impl IntoIterator<Item = Direction>,
        pattern: Template,
        flow: Step,
    ) -> Self {
        let mut unique = Vec::new();
        for direction in directions {
            if !unique.contains(&direction) {
                unique.push(direction);
            }
        }
        Self {
            name: name.into(),
            directions: unique,
            pattern,
            flow,
        }
    }

    /// Parse a rule definition. `index` identifies unnamed rules in errors.
    pub fn from_config(config: &RuleConfig, index: usize) -> Result<Self, RuleError> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(RuleError::EmptyName(index));
        }

        let directions = config
            .directions
            .iter()
            .map(|d| d.parse::<Direction>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| RuleError::InvalidDirection {
                rule: name.to_string(),
                source,
            })?;
        if directions.is_empty() {
            return Err(RuleError::NoDirections { rule: name.to_string() });
        }

        let pattern = compile_template(name, &config.pattern)?;
        let flow = match (&config.flow, &config.rewrite) {
            (Some(flow), None) => compile_flow(name, flow)?,
            (None, Some(target)) => Step::Rewrite(compile_template(name, target)?),
            (None, None) => return Err(RuleError::EmptyFlow { rule: name.to_string() }),
            (Some(_), Some(_)) => return Err(RuleError::AmbiguousFlow { rule: name.to_string() }),
        };

        Ok(Self::new(name, directions, pattern, flow))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn pattern(&self) -> &Template {
        &self.pattern
    }

    pub fn flow(&self) -> &Step {
        &self.flow
    }

    pub fn applies_to(&self, direction: Direction) -> bool {
        self.directions.contains(&direction)
    }

    /// Static checks against the registry the rule will run with.
    fn check(&self, functions: &FunctionRegistry, policy: UnboundCapturePolicy) -> Result<(), RuleError> {
        let rule = || self.name.clone();

        let mut patterns = vec![&self.pattern];
        let mut targets = Vec::new();
        self.flow.visit(&mut |step| match step {
            Step::Match(pattern) => patterns.push(pattern),
            Step::Rewrite(target) => targets.push(target),
            Step::All(_) | Step::Any(_) => {}
        });

        let mut bound = HashSet::new();
        for pattern in &patterns {
            let mut seen = HashSet::new();
            for value in pattern.values() {
                match value {
                    Value::Function(function) => {
                        return Err(RuleError::FunctionInPattern {
                            rule: rule(),
                            function: function.name.clone(),
                        });
                    }
                    Value::Capture { name, .. } => {
                        if !seen.insert(name.as_str()) {
                            return Err(RuleError::DuplicateCapture {
                                rule: rule(),
                                name: name.clone(),
                            });
                        }
                        bound.insert(name.clone());
                    }
                    _ => {}
                }
            }
            if pattern.has_path_glob() {
                bound.insert(GLOB_BINDING.to_string());
            }
            if pattern.query().has_rest() {
                bound.insert(QUERY_REST_BINDING.to_string());
            }
        }

        for target in &targets {
            let mut references = Vec::new();
            for value in target.values() {
                collect_references(value, functions, &mut references).map_err(|function| {
                    RuleError::UnknownFunction {
                        rule: rule(),
                        function,
                    }
                })?;
            }
            if target.query().has_rest() {
                references.push(QUERY_REST_BINDING.to_string());
            }
            if policy == UnboundCapturePolicy::Fail {
                if let Some(name) = references.into_iter().find(|name| !bound.contains(name)) {
                    return Err(RuleError::UnboundCapture { rule: rule(), name });
                }
            }
        }
        Ok(())
    }
}

/// Capture names a target value reads. Fails with the name of an unregistered function.
fn collect_references(
    value: &Value,
    functions: &FunctionRegistry,
    out: &mut Vec<String>,
) -> Result<(), String> {
    match value {
        Value::Literal(_) => {}
        Value::Wildcard(Span::One) => out.push("*".to_string()),
        Value::Wildcard(Span::Many) => out.push(GLOB_BINDING.to_string()),
        Value::Capture { name, .. } => out.push(name.clone()),
        Value::Function(function) => {
            if !functions.contains(&function.name) {
                return Err(function.name.clone());
            }
            for piece in &function.arg {
                collect_references(piece, functions, out)?;
            }
        }
    }
    Ok(())
}

fn compile_template(rule: &str, raw: &str) -> Result<Template, RuleError> {
    parse(raw).map_err(|source| RuleError::Syntax {
        rule: rule.to_string(),
        source,
    })
}

fn compile_flow(rule: &str, flow: &FlowConfig) -> Result<Step, RuleError> {
    let children = |nodes: &[FlowConfig]| -> Result<Vec<Step>, RuleError> {
        if nodes.is_empty() {
            return Err(RuleError::EmptyFlow { rule: rule.to_string() });
        }
        nodes.iter().map(|node| compile_flow(rule, node)).collect()
    };
    Ok(match flow {
        FlowConfig::Match(raw) => Step::Match(compile_template(rule, raw)?),
        FlowConfig::Rewrite(raw) => Step::Rewrite(compile_template(rule, raw)?),
        FlowConfig::All(nodes) => Step::All(children(nodes)?),
        FlowConfig::Any(nodes) => Step::Any(children(nodes)?),
    })
}

/// Ordered, validated rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate `rules` against the registry they will run with.
    pub fn new(
        rules: Vec<Rule>,
        functions: &FunctionRegistry,
        policy: UnboundCapturePolicy,
    ) -> Result<Self, RuleError> {
        let mut names = HashSet::new();
        for rule in &rules {
            if !names.insert(rule.name()) {
                return Err(RuleError::DuplicateRule(rule.name().to_string()));
            }
            rule.check(functions, policy)?;
        }
        Ok(Self { rules })
    }

    /// Parse and validate rule definitions. The first error aborts the load.
    pub fn compile(
        configs: &[RuleConfig],
        functions: &FunctionRegistry,
        policy: UnboundCapturePolicy,
    ) -> Result<Self, RuleError> {
        let rules = configs
            .iter()
            .enumerate()
            .map(|(index, config)| Rule::from_config(config, index))
            .collect::<Result<Vec<_>, _>>()?;
        let set = Self::new(rules, functions, policy)?;
        tracing::debug!(rules = set.len(), "Rule set compiled");
        Ok(set)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}
