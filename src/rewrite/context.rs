//! Per-evaluation rewrite state.
//!
//! # Responsibilities
//! - Carry the traffic direction and unbound-capture policy
//! - Hold capture bindings produced by successful matches
//! - Memoize function results and track in-flight calls for cycle detection
//! - Carry the deadline that bounds collaborator lookups
//!
//! # Design Decisions
//! - Created fresh for every rule evaluation and dropped afterwards
//! - Never shared between evaluations, so no interior mutability
//! - Bindings are write-once: a bound name is never overwritten

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::functions::Deadline;

/// Whether a rule applies to inbound or outbound traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized direction name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction `{0}` (expected request or response)")]
pub struct DirectionParseError(pub String);

impl FromStr for Direction {
    type Err = DirectionParseError;

    /// Case-insensitive; `in`/`inbound` and `out`/`outbound` are accepted aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "request" | "in" | "inbound" => Ok(Direction::Request),
            "response" | "out" | "outbound" => Ok(Direction::Response),
            _ => Err(DirectionParseError(s.to_string())),
        }
    }
}

/// What to do when a rewrite target references a capture that was never bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnboundCapturePolicy {
    /// Abort the rule with `UnboundCapture`.
    #[default]
    Fail,
    /// Substitute nothing.
    Empty,
}

/// Capture name → bound values (one for `{x}`, any number for `{x}**`).
pub type Bindings = HashMap<String, Vec<String>>;

/// Query parameters captured by a `{**}` query token, in candidate order.
pub type QueryPairs = Vec<(String, Vec<String>)>;

/// Memoization key for one function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub function: String,
    pub arg: String,
}

/// Saved bindings, restored when an `any` branch fails.
#[derive(Debug, Clone)]
pub struct BindingSnapshot {
    bindings: Bindings,
    query_rest: Option<QueryPairs>,
}

/// Mutable state for one rule evaluation.
#[derive(Debug)]
pub struct RewriteContext {
    direction: Direction,
    policy: UnboundCapturePolicy,
    deadline: Deadline,
    evaluation_id: Uuid,
    bindings: Bindings,
    query_rest: Option<QueryPairs>,
    function_cache: HashMap<FunctionKey, String>,
    in_flight: HashSet<FunctionKey>,
}

impl RewriteContext {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            policy: UnboundCapturePolicy::default(),
            deadline: Deadline::none(),
            evaluation_id: Uuid::new_v4(),
            bindings: Bindings::new(),
            query_rest: None,
            function_cache: HashMap::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn with_policy(mut self, policy: UnboundCapturePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_evaluation_id(mut self, id: Uuid) -> Self {
        self.evaluation_id = id;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn policy(&self) -> UnboundCapturePolicy {
        self.policy
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    pub fn evaluation_id(&self) -> Uuid {
        self.evaluation_id
    }

    pub fn binding(&self, name: &str) -> Option<&[String]> {
        self.bindings.get(name).map(Vec::as_slice)
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Bind `name` unless it is already bound. Returns whether the binding was stored.
    pub fn bind(&mut self, name: impl Into<String>, values: Vec<String>) -> bool {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, values);
        true
    }

    pub fn query_rest(&self) -> Option<&QueryPairs> {
        self.query_rest.as_ref()
    }

    /// Store the query remainder unless one is already stored.
    pub fn bind_query_rest(&mut self, pairs: QueryPairs) {
        if self.query_rest.is_none() {
            self.query_rest = Some(pairs);
        }
    }

    pub fn snapshot(&self) -> BindingSnapshot {
        BindingSnapshot {
            bindings: self.bindings.clone(),
            query_rest: self.query_rest.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: BindingSnapshot) {
        self.bindings = snapshot.bindings;
        self.query_rest = snapshot.query_rest;
    }

    /// Number of memoized function results.
    pub fn cached_functions(&self) -> usize {
        self.function_cache.len()
    }

    pub(crate) fn cached(&self, key: &FunctionKey) -> Option<&String> {
        self.function_cache.get(key)
    }

    /// Mark a call as in flight. Returns false if it already is (a cycle).
    pub(crate) fn begin_call(&mut self, key: FunctionKey) -> bool {
        self.in_flight.insert(key)
    }

    pub(crate) fn end_call(&mut self, key: &FunctionKey) {
        self.in_flight.remove(key);
    }

    pub(crate) fn store(&mut self, key: FunctionKey, value: String) {
        self.function_cache.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("REQUEST".parse::<Direction>().unwrap(), Direction::Request);
        assert_eq!("Response".parse::<Direction>().unwrap(), Direction::Response);
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::Request);
        assert_eq!("outbound".parse::<Direction>().unwrap(), Direction::Response);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_bindings_are_write_once() {
        let mut ctx = RewriteContext::new(Direction::Request);
        assert!(ctx.bind("x", vec!["a".into()]));
        assert!(!ctx.bind("x", vec!["b".into()]));
        assert_eq!(ctx.binding("x"), Some(&["a".to_string()][..]));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut ctx = RewriteContext::new(Direction::Response);
        ctx.bind("x", vec!["a".into()]);
        let snapshot = ctx.snapshot();
        ctx.bind("y", vec!["b".into()]);
        ctx.bind_query_rest(vec![("q".into(), vec!["1".into()])]);
        ctx.restore(snapshot);
        assert!(ctx.binding("y").is_none());
        assert!(ctx.query_rest().is_none());
        assert!(ctx.binding("x").is_some());
    }

    #[test]
    fn test_in_flight_tracking() {
        let mut ctx = RewriteContext::new(Direction::Request);
        let key = FunctionKey { function: "var".into(), arg: "a".into() };
        assert!(ctx.begin_call(key.clone()));
        assert!(!ctx.begin_call(key.clone()));
        ctx.end_call(&key);
        assert!(ctx.begin_call(key));
    }
}
