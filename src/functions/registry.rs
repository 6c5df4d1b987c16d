//! Function registry and resolver.
//!
//! # Responsibilities
//! - Map function names to implementations, built once at startup
//! - Resolve `{$name:arg}` references with per-context memoization
//! - Detect resolution cycles within one context
//!
//! # Design Decisions
//! - Names are case-insensitive (stored lowercase)
//! - Read-only after `build()`: shared by `Arc` without locks
//! - Only successful results are memoized; errors are re-raised each time

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::functions::Deadline;
use crate::observability::metrics;
use crate::rewrite::context::{Direction, FunctionKey, RewriteContext};
use crate::rewrite::error::RewriteError;
use crate::rewrite::rewriter::Rewriter;
use crate::template::Value;

/// A resolver capability registered under a function name.
///
/// Implementations are shared across concurrent evaluations and must be
/// stateless or internally synchronized.
pub trait RewriteFunction: Send + Sync + fmt::Debug {
    /// Resolve `arg` (already expanded) to the function's value.
    fn resolve(&self, arg: &str, call: &mut FunctionCall<'_>) -> Result<String, RewriteError>;
}

/// What a function sees while it resolves.
pub struct FunctionCall<'a> {
    name: &'a str,
    registry: &'a FunctionRegistry,
    ctx: &'a mut RewriteContext,
}

impl<'a> FunctionCall<'a> {
    /// Registered (lowercase) name of the function being resolved.
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn direction(&self) -> Direction {
        self.ctx.direction()
    }

    pub fn deadline(&self) -> &Deadline {
        self.ctx.deadline()
    }

    /// Resolve another function within the same context.
    pub fn resolve(&mut self, function: &str, arg: &str) -> Result<String, RewriteError> {
        self.registry.resolve(function, arg, self.ctx)
    }

    /// Expand argument pieces (captures, nested functions) within the same context.
    pub fn expand(&mut self, pieces: &[Value]) -> Result<String, RewriteError> {
        Rewriter::new(self.registry).expand_text(pieces, self.ctx)
    }

    /// Build a `FunctionResolution` error for this call.
    pub fn unavailable(&self, arg: &str, reason: impl fmt::Display) -> RewriteError {
        RewriteError::FunctionResolution {
            function: self.name.to_string(),
            arg: arg.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A function name was registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("function `{0}` is registered more than once")]
pub struct DuplicateFunctionError(pub String);

/// Immutable name → function mapping.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn RewriteFunction>>,
}

impl FunctionRegistry {
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resolve `name(arg)` in `ctx`.
    ///
    /// The first successful resolution of a `(name, arg)` pair is cached in the
    /// context; later references return the cached value without calling the
    /// function again.
    pub fn resolve(&self, name: &str, arg: &str, ctx: &mut RewriteContext) -> Result<String, RewriteError> {
        let key = FunctionKey {
            function: name.to_ascii_lowercase(),
            arg: arg.to_string(),
        };
        let function = self
            .functions
            .get(&key.function)
            .ok_or_else(|| RewriteError::UnknownFunction(name.to_string()))?;

        if let Some(value) = ctx.cached(&key) {
            metrics::record_function_call(&key.function, "cached");
            return Ok(value.clone());
        }
        if !ctx.begin_call(key.clone()) {
            metrics::record_function_call(&key.function, "cycle");
            return Err(RewriteError::Cycle {
                function: key.function,
                arg: key.arg,
            });
        }

        let result = function.resolve(
            arg,
            &mut FunctionCall {
                name: &key.function,
                registry: self,
                ctx: &mut *ctx,
            },
        );
        ctx.end_call(&key);

        match result {
            Ok(value) => {
                tracing::trace!(function = %key.function, arg = %key.arg, value = %value, "Function resolved");
                metrics::record_function_call(&key.function, "resolved");
                ctx.store(key, value.clone());
                Ok(value)
            }
            Err(error) => {
                metrics::record_function_call(&key.function, "failed");
                Err(error)
            }
        }
    }
}

/// Collects functions before the registry is frozen.
#[derive(Debug, Default)]
pub struct FunctionRegistryBuilder {
    functions: HashMap<String, Arc<dyn RewriteFunction>>,
}

impl FunctionRegistryBuilder {
    pub fn register(
        mut self,
        name: &str,
        function: impl RewriteFunction + 'static,
    ) -> Result<Self, DuplicateFunctionError> {
        let key = name.to_ascii_lowercase();
        if self.functions.contains_key(&key) {
            return Err(DuplicateFunctionError(key));
        }
        self.functions.insert(key, Arc::new(function));
        Ok(self)
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}
