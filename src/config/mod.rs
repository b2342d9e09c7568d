//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayAppConfig (validated, immutable)
//!     → source.rs (gateway declaration looked up by setting name)
//!     → GatewayController (built once at startup)
//! ```
//!
//! # Design Decisions
//! - Config is read once; the gateway never observes later changes
//! - All fields have defaults to allow minimal configs
//! - Options are resolved by a pure defaults ⨁ overrides merge
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    GatewayAppConfig, GatewayConfig, GatewayOptions, GatewayOptionsOverrides, HeaderOptions,
    HeaderOverrides, ListenerConfig, ObservabilityConfig, TimeoutConfig,
};
pub use source::ConfigSource;
