//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Perform the upstream call for a prepared [`EndpointRequest`]
//! - Resolve the client IP of an inbound request
//! - Extract the custom headers of an inbound request
//!
//! # Design Decisions
//! - One pooled hyper client shared by every pipeline
//! - The upstream body is handed back unbuffered
//! - No timeout on the upstream call; a request-level timeout is opt-in at
//!   the server

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{request, HeaderMap, Request, Uri},
};
use futures_util::future::{BoxFuture, FutureExt};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::TransportError;
use crate::gateway::pipeline::{EndpointRequest, EndpointResponse};
use crate::http::headers::{is_custom_header, X_FORWARDED_FOR};

/// The HTTP collaborator used by the forwarding pipeline.
pub trait HttpTransport: Send + Sync {
    /// Perform the upstream call.
    fn fetch(
        &self,
        request: EndpointRequest,
    ) -> BoxFuture<'static, Result<EndpointResponse, TransportError>>;

    /// Client IP of the inbound request, if known.
    fn client_ip(&self, req: &request::Parts) -> Option<String> {
        client_ip(req)
    }

    /// Custom headers of the inbound request.
    fn custom_headers(&self, req: &request::Parts) -> HeaderMap {
        custom_headers(req)
    }
}

/// Peer address first, then the first `x-forwarded-for` hop.
pub fn client_ip(req: &request::Parts) -> Option<String> {
    if let Some(ConnectInfo(addr)) = req.extensions.get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip().to_string());
    }
    req.headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
}

/// Every `x-` header except `x-forwarded-for`.
pub fn custom_headers(req: &request::Parts) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in req.headers.iter() {
        if is_custom_header(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Transport backed by a pooled hyper client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for HyperTransport {
    fn fetch(
        &self,
        request: EndpointRequest,
    ) -> BoxFuture<'static, Result<EndpointResponse, TransportError>> {
        let client = self.client.clone();
        async move {
            let EndpointRequest { url, options } = request;
            let uri: Uri = url.parse()?;

            let mut builder = Request::builder().method(options.method).uri(uri);
            if let Some(headers) = builder.headers_mut() {
                headers.extend(options.headers);
            }
            let body = options.body.map(Body::from).unwrap_or_else(Body::empty);
            let outbound = builder.body(body)?;

            let response: hyper::Response<Incoming> = client.request(outbound).await?;
            let (parts, body) = response.into_parts();

            Ok(EndpointResponse {
                status: parts.status,
                headers: parts.headers,
                body: Some(Body::new(body)),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(headers: &[(&str, &str)]) -> request::Parts {
        let mut builder = Request::builder().uri("/x");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_client_ip_prefers_peer_address() {
        let mut req = parts(&[("x-forwarded-for", "1.1.1.1")]);
        let peer: SocketAddr = "10.0.0.7:5000".parse().unwrap();
        req.extensions.insert(ConnectInfo(peer));
        assert_eq!(client_ip(&req).as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let req = parts(&[("x-forwarded-for", " 1.1.1.1 , 2.2.2.2")]);
        assert_eq!(client_ip(&req).as_deref(), Some("1.1.1.1"));
        assert_eq!(client_ip(&parts(&[])), None);
    }

    #[test]
    fn test_custom_headers() {
        let req = parts(&[
            ("x-tenant", "acme"),
            ("x-forwarded-for", "1.1.1.1"),
            ("X-Trace", "t"),
            ("accept", "*/*"),
        ]);
        let headers = custom_headers(&req);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-tenant"], "acme");
        assert_eq!(headers["x-trace"], "t");
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let transport = HyperTransport::new();
        let request = EndpointRequest {
            url: "not a url".into(),
            options: crate::gateway::pipeline::RequestOptions {
                method: axum::http::Method::GET,
                headers: HeaderMap::new(),
                body: None,
            },
        };
        let err = transport.fetch(request).await.err().unwrap();
        assert!(matches!(err, TransportError::InvalidUri(_)));
    }
}
