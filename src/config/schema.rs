//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::rewrite::context::UnboundCapturePolicy;

/// Root configuration for the rewrite gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Rewrite engine settings.
    pub rewrite: RewriteConfig,

    /// Logical service name → canonical URL.
    pub services: BTreeMap<String, String>,

    /// Internal host → external host.
    pub hostmap: BTreeMap<String, String>,

    /// Values exposed through `{$var:name}`.
    pub variables: BTreeMap<String, String>,

    /// Rewrite rules, evaluated in declaration order.
    pub rules: Vec<RuleConfig>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Rewrite engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Behaviour for references to captures that were never bound.
    pub unbound_capture: UnboundCapturePolicy,

    /// Budget for function resolution in one evaluation, in milliseconds.
    pub function_timeout_ms: u64,

    /// Service functions that fail instead of returning their argument.
    pub strict_functions: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            unbound_capture: UnboundCapturePolicy::Fail,
            function_timeout_ms: 250,
            strict_functions: Vec::new(),
        }
    }
}

impl RewriteConfig {
    pub fn strict_set(&self) -> HashSet<String> {
        self.strict_functions
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .collect()
    }
}

/// One rewrite rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuleConfig {
    /// Unique rule name.
    pub name: String,

    /// `request` and/or `response` (case-insensitive).
    #[serde(default)]
    pub directions: Vec<String>,

    /// Template the input must match before the flow runs.
    pub pattern: String,

    /// Flow tree. Mutually exclusive with `rewrite`.
    #[serde(default)]
    pub flow: Option<FlowConfig>,

    /// Shorthand for `flow = { rewrite = "..." }`.
    #[serde(default)]
    pub rewrite: Option<String>,
}

/// One node of a rule's flow tree. Exactly one key per table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FlowConfig {
    Match(String),
    Rewrite(String),
    All(Vec<FlowConfig>),
    Any(Vec<FlowConfig>),
}
