//! HTTP method normalization for endpoint registration.

use std::fmt;

use axum::http::Method;

/// Methods an endpoint can be registered against.
///
/// `All` matches every method and is the fallback for anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
    Options,
    Trace,
    All,
}

impl HttpMethod {
    /// Normalize a declared method. Case-insensitive; unknown or missing
    /// values become [`HttpMethod::All`].
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::All;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "get" => Self::Get,
            "head" => Self::Head,
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            "connect" => Self::Connect,
            "options" => Self::Options,
            "trace" => Self::Trace,
            _ => Self::All,
        }
    }

    /// Lower-case registration name (`get`, `post`, ..., `all`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Head => "head",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Connect => "connect",
            Self::Options => "options",
            Self::Trace => "trace",
            Self::All => "all",
        }
    }

    /// Concrete wire method, `None` for `All`.
    pub fn to_http(&self) -> Option<Method> {
        match self {
            Self::Get => Some(Method::GET),
            Self::Head => Some(Method::HEAD),
            Self::Post => Some(Method::POST),
            Self::Put => Some(Method::PUT),
            Self::Patch => Some(Method::PATCH),
            Self::Delete => Some(Method::DELETE),
            Self::Connect => Some(Method::CONNECT),
            Self::Options => Some(Method::OPTIONS),
            Self::Trace => Some(Method::TRACE),
            Self::All => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
