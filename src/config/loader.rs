//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayAppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayAppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayAppConfig, ConfigError> {
    let config: GatewayAppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_valid() {
        let config = parse_config(
            r#"
            [gateway]
            mount = "/my-gateway"

            [api]
            url = "http://api.internal"

            [api.gateway]
            endpointOne = "/my-path/one"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.mount, "/my-gateway");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("[gateway"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_message_lists_all() {
        let err = parse_config("[gateway]\nmount = \"x\"\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("validation failed: "));
        assert!(msg.contains("gateway.mount `x`"));
        assert!(msg.contains("no gateway configuration found for setting `api`"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
