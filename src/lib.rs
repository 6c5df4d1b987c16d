//! URL rewriting core for an API gateway.
//!
//! Parses URL-like strings into templates, matches them against rule
//! patterns, runs each rule's match/rewrite flow and resolves embedded
//! functions such as service lookups.

pub mod config;
pub mod console;
pub mod functions;
pub mod gateway;
pub mod observability;
pub mod rewrite;
pub mod services;
pub mod template;

pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayUpdate};
pub use rewrite::{Direction, RewriteEngine};
pub use template::{format, parse, Template};
