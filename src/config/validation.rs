//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the gateway setting exists and declares a usable upstream
//! - Validate header names and value ranges
//! - Detect conflicting endpoints before the server starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayAppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayAppConfig, GatewayOptions};
use crate::config::source::ConfigSource;
use crate::error::ConfigurationError;
use crate::gateway::endpoint::flatten;
use crate::gateway::routes::build_routes;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("gateway.mount `{0}` must start with `/`")]
    InvalidMount(String),

    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("upstream url `{url}` is invalid: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("gateway.headers: invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error(transparent)]
    Gateway(#[from] ConfigurationError),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayAppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if !config.gateway.mount.starts_with('/') {
        errors.push(ValidationError::InvalidMount(config.gateway.mount.clone()));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    let options = GatewayOptions::merge(&GatewayOptions::default(), &config.gateway.options);
    for name in options.headers.copy.iter().chain(&options.headers.remove) {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    match config.gateway_config(&config.gateway.setting) {
        Ok(gateway) => {
            if let Some(err) = check_upstream_url(&gateway.url) {
                errors.push(err);
            }
            if let Err(err) = build_routes(&flatten(&gateway.gateway), &options.root) {
                errors.push(err.into());
            }
        }
        Err(err) => errors.push(err.into()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream_url(raw: &str) -> Option<ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUpstreamUrl {
        url: raw.to_string(),
        reason,
    };
    match Url::parse(raw) {
        Ok(url) if url.scheme() != "http" => {
            Some(invalid(format!("unsupported scheme `{}`", url.scheme())))
        }
        Ok(url) if url.host_str().is_none() => Some(invalid("missing host".to_string())),
        Ok(_) => None,
        Err(e) => Some(invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> GatewayAppConfig {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let config = parse(
            r#"
            [api]
            url = "http://api.internal"
            [api.gateway]
            one = "/one"
            "#,
        );
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let config = parse(
            r#"
            [listener]
            bind_address = "not-an-address"
            max_body_bytes = 0

            [gateway]
            mount = "gateway"

            [gateway.headers]
            copy = ["bad header"]

            [api]
            url = "https://api.internal"
            [api.gateway]
            a = "/same"
            b = "/same/"
            "#,
        );
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.contains(&ValidationError::InvalidMount("gateway".into())));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::InvalidHeaderName("bad header".into())));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::Gateway(ConfigurationError::DuplicateEndpoint { .. })
        )));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUpstreamUrl { .. })));
    }

    #[test]
    fn test_missing_setting_reported() {
        let config = parse("[gateway]\nsetting = \"backend\"\n");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Gateway(ConfigurationError::MissingSetting("backend".into()))]
        );
    }
}
