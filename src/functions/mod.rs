//! Function registry and the built-in rewrite functions.
//!
//! # Responsibilities
//! - Resolve `{$name:arg}` references found in rewrite targets
//! - Provide the service, host map and variable functions
//! - Bound collaborator lookups with a per-evaluation deadline
//!
//! # Design Decisions
//! - The registry is assembled once at startup and never mutated afterwards
//! - Each function documents its failure policy: service functions are
//!   permissive unless configured strict, `var` always fails on an undefined name
//! - Memoization and cycle detection live in the resolver, not in each function
//!
//! # Data Flow
//! ```text
//! Rewriter → FunctionRegistry::resolve ─┬─ cache hit → value
//!                                       └─ RewriteFunction::resolve → ServiceRegistry / HostMap / Variables
//! ```

mod deadline;
mod hostmap;
mod registry;
mod service;
mod variable;

use std::collections::HashSet;
use std::sync::Arc;

pub use deadline::{Deadline, DeadlineError};
pub use hostmap::HostMap;
pub use registry::{
    DuplicateFunctionError, FunctionCall, FunctionRegistry, FunctionRegistryBuilder, RewriteFunction,
};
pub use service::{ServiceComponent, ServiceFunction};
pub use variable::{VariableError, Variables};

use crate::services::ServiceRegistry;

/// Name of the host map function.
pub const HOSTMAP: &str = "hostmap";
/// Name of the variable function.
pub const VAR: &str = "var";

/// Names of every built-in function.
pub fn standard_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = ServiceComponent::ALL
        .iter()
        .map(ServiceComponent::function_name)
        .collect();
    names.push(HOSTMAP);
    names.push(VAR);
    names
}

/// Build a registry holding every built-in function.
///
/// `strict` lists service functions that must fail instead of falling back to
/// their argument. Names are matched case-insensitively.
pub fn standard(
    services: Arc<dyn ServiceRegistry>,
    hostmap: HostMap,
    variables: Variables,
    strict: &HashSet<String>,
) -> Result<FunctionRegistry, DuplicateFunctionError> {
    let strict: HashSet<String> = strict.iter().map(|name| name.to_ascii_lowercase()).collect();
    let mut builder = FunctionRegistry::builder();
    for component in ServiceComponent::ALL {
        let name = component.function_name();
        builder = builder.register(
            name,
            ServiceFunction::new(component, services.clone()).strict(strict.contains(name)),
        )?;
    }
    let registry = builder.register(HOSTMAP, hostmap)?.register(VAR, variables)?.build();
    tracing::debug!(functions = ?registry.names(), "Function registry built");
    Ok(registry)
}
