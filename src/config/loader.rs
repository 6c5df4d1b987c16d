//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::functions::{DuplicateFunctionError, VariableError};
use crate::rewrite::error::RuleError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Variable(#[from] VariableError),

    #[error(transparent)]
    Functions(#[from] DuplicateFunctionError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [observability]
            log_level = "debug"

            [rewrite]
            unbound_capture = "empty"
            function_timeout_ms = 100

            [services]
            WEBHDFS = "http://node1:50070/webhdfs/v1"

            [hostmap]
            "node1.internal" = "gateway.example.com"

            [variables]
            gateway = "https://gateway.example.com:8443/gateway/cluster"

            [[rules]]
            name = "webhdfs/inbound"
            directions = ["request"]
            pattern = "/webhdfs/v1/**"
            rewrite = "/gateway/cluster/webhdfs/v1/{**}"
            "#,
        )
        .unwrap();
        assert_eq!(config.rewrite.function_timeout_ms, 100);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.rules[0].name, "webhdfs/inbound");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("[[rules]]\nname = 1"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("[rewrite]\nfunction_timeout_ms = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: function_timeout_ms must be greater than zero"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
