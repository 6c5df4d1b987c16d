//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeout > 0, known log level)
//! - Check service URLs are absolute and host maps are unambiguous
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Template and flow errors are reported by rule compilation, which names the rule

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::functions::ServiceComponent;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown log level `{0}`")]
    UnknownLogLevel(String),

    #[error("function_timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("`{0}` is not a service function and cannot be strict")]
    UnknownStrictFunction(String),

    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("service `{service}` has invalid URL `{url}`: {reason}")]
    InvalidServiceUrl {
        service: String,
        url: String,
        reason: String,
    },

    #[error("hostmap entry `{internal}` = `{external}` has an empty host")]
    EmptyHost { internal: String, external: String },

    #[error("external host `{external}` is mapped from both `{first}` and `{second}`")]
    AmbiguousHost {
        external: String,
        first: String,
        second: String,
    },

    #[error("rule #{0} has an empty name")]
    EmptyRuleName(usize),
}

/// Validate a configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.rewrite.function_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    for name in &config.rewrite.strict_functions {
        let known = ServiceComponent::ALL
            .iter()
            .any(|component| component.function_name().eq_ignore_ascii_case(name));
        if !known {
            errors.push(ValidationError::UnknownStrictFunction(name.clone()));
        }
    }

    for (service, url) in &config.services {
        if service.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName);
            continue;
        }
        let reason = match Url::parse(url.trim()) {
            Ok(parsed) if parsed.cannot_be_a_base() || !parsed.has_host() => {
                Some("URL has no authority".to_string())
            }
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            errors.push(ValidationError::InvalidServiceUrl {
                service: service.clone(),
                url: url.clone(),
                reason,
            });
        }
    }

    let mut externals: HashMap<String, &str> = HashMap::new();
    for (internal, external) in &config.hostmap {
        if internal.trim().is_empty() || external.trim().is_empty() {
            errors.push(ValidationError::EmptyHost {
                internal: internal.clone(),
                external: external.clone(),
            });
            continue;
        }
        if let Some(first) = externals.insert(external.to_ascii_lowercase(), internal) {
            errors.push(ValidationError::AmbiguousHost {
                external: external.clone(),
                first: first.to_string(),
                second: internal.clone(),
            });
        }
    }

    for (index, rule) in config.rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRuleName(index));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
