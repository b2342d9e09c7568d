//! Config sources the gateway reads its upstream declaration from.

use std::collections::HashMap;

use crate::config::schema::{GatewayAppConfig, GatewayConfig};
use crate::error::ConfigurationError;

/// Supplies a [`GatewayConfig`] by setting name. Read once, at construction.
pub trait ConfigSource {
    fn gateway_config(&self, setting: &str) -> Result<GatewayConfig, ConfigurationError>;
}

impl ConfigSource for GatewayAppConfig {
    fn gateway_config(&self, setting: &str) -> Result<GatewayConfig, ConfigurationError> {
        let value = self
            .settings
            .get(setting)
            .ok_or_else(|| ConfigurationError::MissingSetting(setting.to_string()))?;

        value
            .clone()
            .try_into::<GatewayConfig>()
            .map(GatewayConfig::normalized)
            .map_err(|e| ConfigurationError::InvalidSetting {
                setting: setting.to_string(),
                message: e.to_string(),
            })
    }
}

impl ConfigSource for HashMap<String, GatewayConfig> {
    fn gateway_config(&self, setting: &str) -> Result<GatewayConfig, ConfigurationError> {
        self.get(setting)
            .cloned()
            .map(GatewayConfig::normalized)
            .ok_or_else(|| ConfigurationError::MissingSetting(setting.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::endpoint::EndpointNode;

    fn app_config(toml_src: &str) -> GatewayAppConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_reads_named_setting() {
        let config = app_config(
            r#"
            [backend]
            url = "http://backend.internal/"
            [backend.gateway]
            users = { list = "/users" }
            "#,
        );
        let gateway = config.gateway_config("backend").unwrap();
        assert_eq!(gateway.url, "http://backend.internal");
        assert!(matches!(gateway.gateway.get("users"), Some(EndpointNode::Tree(_))));
    }

    #[test]
    fn test_missing_setting() {
        let config = app_config("");
        assert_eq!(
            config.gateway_config("api").unwrap_err(),
            ConfigurationError::MissingSetting("api".into())
        );
    }

    #[test]
    fn test_invalid_setting() {
        let config = app_config(
            r#"
            [api]
            gateway = { one = "/one" }
            "#,
        );
        assert!(matches!(
            config.gateway_config("api"),
            Err(ConfigurationError::InvalidSetting { .. })
        ));
    }
}
