//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Configure the log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Logs go to stderr so rewritten URLs on stdout stay machine-readable

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("rewrite_gateway={},warn", config.log_level))
    })
}

/// Install the global subscriber. Returns false if one was already installed.
pub fn init(config: &ObservabilityConfig) -> bool {
    let registry = tracing_subscriber::registry().with(filter(config));
    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.is_ok()
}
