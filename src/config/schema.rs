//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the gateway server
//! and the forwarding options of the gateway itself. All types derive Serde
//! traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::gateway::endpoint::EndpointTree;
use crate::gateway::routes::trim_slashes;

/// Root configuration file.
///
/// Every top-level table other than the known sections is a config-source
/// entry; the gateway reads its upstream declaration from the one named by
/// `gateway.setting`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayAppConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Gateway mount and forwarding options.
    pub gateway: GatewaySection,

    /// Config-source entries, keyed by setting name.
    #[serde(flatten)]
    pub settings: toml::Table,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest inbound request body read before forwarding.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total inbound request timeout in seconds. Unset means no timeout.
    pub request_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// The `[gateway]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Path prefix at which the gateway is mounted.
    pub mount: String,

    /// Config-source entry holding the upstream declaration.
    pub setting: String,

    #[serde(flatten)]
    pub options: GatewayOptionsOverrides,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            mount: "/gateway".to_string(),
            setting: "api".to_string(),
            options: GatewayOptionsOverrides::default(),
        }
    }
}

/// Upstream declaration: base URL plus endpoint tree.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub url: String,
    #[serde(default)]
    pub gateway: EndpointTree,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, gateway: EndpointTree) -> Self {
        Self {
            url: url.into(),
            gateway,
        }
        .normalized()
    }

    /// Same config with leading/trailing slashes trimmed from `url`.
    pub fn normalized(mut self) -> Self {
        self.url = trim_slashes(&self.url).to_string();
        self
    }
}

/// Resolved forwarding options. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayOptions {
    /// Sub-path under the mount route namespacing every endpoint.
    pub root: String,
    /// Key the endpoint tree is wrapped under in the API descriptor.
    pub api_config_setting: String,
    pub headers: HeaderOptions,
}

/// Header forwarding rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderOptions {
    /// Set `x-forwarded-for` to the client IP.
    pub use_x_forwarded_for: bool,
    /// Forward the inbound custom (`x-`) headers.
    pub copy_custom_headers: bool,
    /// Inbound headers copied to the upstream request.
    pub copy: Vec<String>,
    /// Upstream headers never returned to the client.
    pub remove: Vec<String>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            root: String::new(),
            api_config_setting: "api".to_string(),
            headers: HeaderOptions::default(),
        }
    }
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            use_x_forwarded_for: true,
            copy_custom_headers: true,
            copy: ["authorization", "accept", "accept-language", "content-type", "user-agent"]
                .into_iter()
                .map(String::from)
                .collect(),
            remove: Vec::new(),
        }
    }
}

/// Caller overrides; every field optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayOptionsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_config_setting: Option<String>,
    pub headers: HeaderOverrides,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_x_forwarded_for: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_custom_headers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<Vec<String>>,
}

impl GatewayOptions {
    /// Defaults ⨁ overrides. Scalars and lists given in `overrides` replace
    /// the default; the root is stored without surrounding slashes and header
    /// names in lower case.
    pub fn merge(defaults: &GatewayOptions, overrides: &GatewayOptionsOverrides) -> GatewayOptions {
        let root = overrides.root.as_deref().unwrap_or(&defaults.root);
        let h = &overrides.headers;
        let lower = |names: &[String]| -> Vec<String> {
            names.iter().map(|n| n.trim().to_ascii_lowercase()).collect()
        };

        GatewayOptions {
            root: trim_slashes(root).to_string(),
            api_config_setting: overrides
                .api_config_setting
                .clone()
                .unwrap_or_else(|| defaults.api_config_setting.clone()),
            headers: HeaderOptions {
                use_x_forwarded_for: h
                    .use_x_forwarded_for
                    .unwrap_or(defaults.headers.use_x_forwarded_for),
                copy_custom_headers: h
                    .copy_custom_headers
                    .unwrap_or(defaults.headers.copy_custom_headers),
                copy: lower(h.copy.as_deref().unwrap_or(&defaults.headers.copy)),
                remove: lower(h.remove.as_deref().unwrap_or(&defaults.headers.remove)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_without_overrides_keeps_defaults() {
        let merged =
            GatewayOptions::merge(&GatewayOptions::default(), &GatewayOptionsOverrides::default());
        assert_eq!(merged, GatewayOptions::default());
    }

    #[test]
    fn test_merge_replaces_given_fields() {
        let overrides = GatewayOptionsOverrides {
            root: Some("/my-root/".into()),
            api_config_setting: None,
            headers: HeaderOverrides {
                use_x_forwarded_for: Some(false),
                copy: Some(vec!["X-Tenant".into()]),
                ..Default::default()
            },
        };
        let merged = GatewayOptions::merge(&GatewayOptions::default(), &overrides);
        assert_eq!(merged.root, "my-root");
        assert_eq!(merged.api_config_setting, "api");
        assert!(!merged.headers.use_x_forwarded_for);
        assert!(merged.headers.copy_custom_headers);
        assert_eq!(merged.headers.copy, vec!["x-tenant".to_string()]);
        assert!(merged.headers.remove.is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let config: GatewayAppConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [gateway]
            mount = "/my-gateway"
            root = "v1"

            [gateway.headers]
            remove = ["server"]

            [api]
            url = "http://api.internal/"

            [api.gateway]
            endpointOne = "/my-path/one"
            endpointTwo = { path = "/my-path/two", method = "post" }
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.listener.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.gateway.mount, "/my-gateway");
        assert_eq!(config.gateway.setting, "api");
        assert_eq!(config.gateway.options.root.as_deref(), Some("v1"));
        assert_eq!(config.gateway.options.headers.remove, Some(vec!["server".to_string()]));
        assert!(config.settings.contains_key("api"));
        assert!(!config.settings.contains_key("listener"));
    }

    #[test]
    fn test_gateway_config_trims_url() {
        let config = GatewayConfig::new("http://api.internal/", EndpointTree::new());
        assert_eq!(config.url, "http://api.internal");
    }
}
