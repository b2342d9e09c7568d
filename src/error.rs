//! Error taxonomy for the gateway.
//!
//! # Categories
//! - Configuration errors: fatal, raised while building the route table or
//!   when the hook set cannot satisfy a stream decision.
//! - Per-request errors: upstream transport failures, null upstream bodies,
//!   mid-stream failures and hook failures. Each is surfaced exactly once,
//!   either to the `handle_endpoint_error` hook or to the [`Downstream`]
//!   continuation.
//!
//! # Design Decisions
//! - Errors render as JSON `{error_code, message}` with a stable code
//! - The downstream continuation receives the original error value

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Boxed error used for hook failures raised by caller code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Static configuration problems. Never recovered automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Two endpoints resolve to the same normalized `(path, method)` pair.
    #[error("duplicate endpoint: `{duplicate}` and `{existing}` both register {method} on `{path}`")]
    DuplicateEndpoint {
        path: String,
        method: String,
        existing: String,
        duplicate: String,
    },

    /// An endpoint path cannot be mounted as a route.
    #[error("endpoint `{endpoint}` has an unmountable path `{path}`: {reason}")]
    InvalidRoutePath {
        endpoint: String,
        path: String,
        reason: String,
    },

    /// The stream decision resolved to "don't stream" without a handler.
    #[error("response is not streamed: the hook set must implement handle_endpoint_response")]
    MissingResponseHandler,

    /// A header name in the options cannot be used on the wire.
    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),

    /// The config source has no entry for the requested setting.
    #[error("no gateway configuration found for setting `{0}`")]
    MissingSetting(String),

    /// The config source entry exists but cannot be read as a gateway config.
    #[error("invalid gateway configuration in setting `{setting}`: {message}")]
    InvalidSetting { setting: String, message: String },
}

/// Failures of the outbound HTTP call itself.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("invalid upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream connection failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("{0}")]
    Other(String),
}

/// Every error the gateway can surface.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("upstream request to {url} failed: {source}")]
    Upstream {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("response body is null")]
    NullBody,

    #[error("upstream response stream failed: {0}")]
    Stream(String),

    #[error("endpoint hook failed: {0}")]
    Hook(#[source] BoxError),

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl GatewayError {
    /// Wrap an arbitrary failure raised inside a hook.
    pub fn hook<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Hook(error.into())
    }

    /// Stable identifier for client-side handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "GATEWAY_CONFIG_ERROR",
            Self::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            Self::NullBody => "UPSTREAM_NULL_BODY",
            Self::Stream(_) => "UPSTREAM_STREAM_ERROR",
            Self::Hook(_) => "ENDPOINT_HOOK_ERROR",
            Self::Body(_) => "INVALID_REQUEST_BODY",
            Self::BodyTooLarge { .. } => "REQUEST_BODY_TOO_LARGE",
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Upstream { .. } => "upstream",
            Self::NullBody => "null_body",
            Self::Stream(_) => "stream",
            Self::Hook(_) => "hook",
            Self::Body(_) | Self::BodyTooLarge { .. } => "body",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Hook(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { .. } | Self::NullBody | Self::Stream(_) => StatusCode::BAD_GATEWAY,
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_error_response();

        tracing::error!(
            error_code = %body.error_code,
            message = %body.message,
            status = %status.as_u16(),
            "Gateway error"
        );

        (status, Json(body)).into_response()
    }
}

/// JSON body of a rendered [`GatewayError`].
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
}

/// The generic downstream error-handling continuation.
///
/// Receives per-request errors that no hook handled. The returned response is
/// sent to the client, except for stream errors where the response has
/// already started and the return value is discarded.
pub trait Downstream: Send + Sync {
    fn on_error(&self, error: GatewayError) -> Response;
}

/// Default continuation: render the error through [`IntoResponse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderError;

impl Downstream for RenderError {
    fn on_error(&self, error: GatewayError) -> Response {
        error.into_response()
    }
}
