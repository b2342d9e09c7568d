//! Endpoint gateway library.
//!
//! Mounts a declared set of upstream API endpoints under a path prefix and
//! forwards matching requests to the upstream, streaming responses back.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::{GatewayAppConfig, GatewayConfig, GatewayOptions};
pub use error::{ConfigurationError, Downstream, GatewayError, RenderError};
pub use gateway::{ApiConfigRequest, EndpointHooks, GatewayController};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
