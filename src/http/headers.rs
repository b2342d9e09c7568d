//! Header forwarding rules.
//!
//! # Normalization table
//! - Header names are compared case-insensitively: every configured name is
//!   parsed into a lower-case [`HeaderName`] once, at construction
//! - Header values are forwarded verbatim, every value of a multi-valued
//!   header included
//! - [`HOP_BY_HOP_HEADERS`] describe a single connection and are never copied
//!   from an upstream response
//! - [`CUSTOM_HEADER_PREFIX`] marks custom headers; [`X_FORWARDED_FOR`] is
//!   excluded from them and set separately

use axum::http::{header::CONTENT_TYPE, request, HeaderMap, HeaderName, HeaderValue};

use crate::config::schema::HeaderOptions;
use crate::error::ConfigurationError;
use crate::http::transport::HttpTransport;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Prefix of custom request headers.
pub const CUSTOM_HEADER_PREFIX: &str = "x-";

/// Connection-scoped headers dropped from streamed responses.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Compiled header options.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    copy: Vec<HeaderName>,
    remove: Vec<HeaderName>,
    copy_custom_headers: bool,
    use_x_forwarded_for: bool,
}

impl HeaderPolicy {
    pub fn from_options(options: &HeaderOptions) -> Result<Self, ConfigurationError> {
        Ok(Self {
            copy: parse_names(&options.copy)?,
            remove: parse_names(&options.remove)?,
            copy_custom_headers: options.copy_custom_headers,
            use_x_forwarded_for: options.use_x_forwarded_for,
        })
    }

    /// Headers for the upstream request.
    ///
    /// Explicitly copied headers win over custom headers of the same name;
    /// `x-forwarded-for` is set last.
    pub fn request_headers(
        &self,
        req: &request::Parts,
        transport: &dyn HttpTransport,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for name in &self.copy {
            for value in req.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        if self.copy_custom_headers {
            let custom = transport.custom_headers(req);
            for name in custom.keys() {
                if headers.contains_key(name) {
                    continue;
                }
                for value in custom.get_all(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        if self.use_x_forwarded_for {
            if let Some(ip) = transport.client_ip(req) {
                match HeaderValue::from_str(&ip) {
                    Ok(value) => {
                        headers.insert(X_FORWARDED_FOR, value);
                    }
                    Err(_) => tracing::warn!(ip = %ip, "Client IP is not a valid header value"),
                }
            }
        }

        headers
    }

    /// Copy upstream response headers, minus removed and hop-by-hop ones.
    pub fn copy_response_headers(&self, from: &HeaderMap, to: &mut HeaderMap) {
        for (name, value) in from.iter() {
            if self.remove.contains(name) || is_hop_by_hop(name) {
                continue;
            }
            to.append(name.clone(), value.clone());
        }
    }
}

/// Default `content-type` to JSON when none is set.
pub fn default_json_content_type(headers: &mut HeaderMap) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, APPLICATION_JSON);
    }
}

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Whether a header is a custom (`x-`) header, `x-forwarded-for` excluded.
pub fn is_custom_header(name: &HeaderName) -> bool {
    name.as_str().starts_with(CUSTOM_HEADER_PREFIX) && *name != X_FORWARDED_FOR
}

fn parse_names(names: &[String]) -> Result<Vec<HeaderName>, ConfigurationError> {
    names
        .iter()
        .map(|name| {
            HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|_| ConfigurationError::InvalidHeaderName(name.clone()))
        })
        .collect()
}
