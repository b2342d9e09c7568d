//! Per-request forwarding pipeline.
//!
//! # Stages
//! ```text
//! RECEIVED
//!     → HEADERS_BUILT     (copy list, custom headers, x-forwarded-for, body)
//!     → REQUEST_REDUCED   (reduce_endpoint_request)
//!     → FETCHED           (transport; rejection or null body → ERRORED)
//!     → RESPONSE_REDUCED  (reduce_endpoint_response)
//!     → STREAM_DECIDED    (should_stream_endpoint_response)
//!     → STREAMED | HANDLED
//! ```
//!
//! # Design Decisions
//! - Stages run strictly in sequence; nothing is retried
//! - The stream decision is consulted on its own; `handle_endpoint_response`
//!   is only required when the answer is "don't stream"
//! - Endpoint failures go to `handle_endpoint_error`, then the downstream
//!   continuation; configuration failures go straight downstream
//! - Streaming never buffers the upstream body

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::OriginalUri,
    http::{header::CONTENT_TYPE, request, HeaderMap, Method, Request, StatusCode},
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;

use crate::config::schema::GatewayConfig;
use crate::error::{ConfigurationError, Downstream, GatewayError};
use crate::gateway::hooks::{
    ErrorContext, ErrorDispatch, HookDispatcher, InboundParts, RequestContext, ResponseContext,
    StreamDecisionContext,
};
use crate::gateway::routes::Endpoint;
use crate::http::headers::{default_json_content_type, HeaderPolicy};
use crate::http::request::request_id;
use crate::http::response::stream_response;
use crate::http::transport::HttpTransport;
use crate::observability::metrics;
use crate::routing::matcher::MountMatcher;

/// The outbound call: URL plus options.
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    pub url: String,
    pub options: RequestOptions,
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// The upstream response. `body` is `None` when the upstream gave none.
#[derive(Debug)]
pub struct EndpointResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

/// Inbound body, as read before forwarding.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundBody {
    Empty,
    /// A JSON object or array.
    Json(Value),
    Raw(Bytes),
}

impl InboundBody {
    /// Read at most `limit` bytes and classify them.
    ///
    /// JSON content types must hold valid JSON; objects and arrays become
    /// [`InboundBody::Json`]. Bodies over `limit` fail with
    /// [`GatewayError::BodyTooLarge`].
    pub async fn read(body: Body, headers: &HeaderMap, limit: usize) -> Result<Self, GatewayError> {
        let bytes = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(GatewayError::BodyTooLarge { limit });
            }
            Err(e) => return Err(GatewayError::Body(e.to_string())),
        };
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }
        if !is_json(headers) {
            return Ok(Self::Raw(bytes));
        }
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Body(e.to_string()))?;
        match value {
            Value::Object(_) | Value::Array(_) => Ok(Self::Json(value)),
            _ => Ok(Self::Raw(bytes)),
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// An inbound request with its body already read.
#[derive(Debug)]
pub struct InboundRequest {
    pub parts: request::Parts,
    pub body: InboundBody,
}

/// Everything a pipeline shares with its siblings, built once per controller.
#[derive(Clone)]
pub struct PipelineShared {
    pub gateway: Arc<GatewayConfig>,
    pub matcher: Arc<MountMatcher>,
    pub headers: Arc<HeaderPolicy>,
    pub hooks: HookDispatcher,
    pub transport: Arc<dyn HttpTransport>,
    pub downstream: Arc<dyn Downstream>,
    pub body_limit: usize,
}

/// Forwarding pipeline bound to one endpoint.
pub struct ForwardingPipeline {
    endpoint: Arc<Endpoint>,
    shared: PipelineShared,
}

impl ForwardingPipeline {
    pub fn new(endpoint: Endpoint, shared: PipelineShared) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            shared,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Read the inbound body, then forward.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        match InboundBody::read(body, &parts.headers, self.shared.body_limit).await {
            Ok(body) => self.forward(InboundRequest { parts, body }).await,
            Err(error) => self.fail(error, Arc::new(parts)).await,
        }
    }

    /// Run every stage for one request.
    pub async fn forward(&self, inbound: InboundRequest) -> Response {
        let start = Instant::now();
        let InboundRequest { parts, body } = inbound;
        let req: InboundParts = Arc::new(parts);

        let response = match self.run(req.clone(), body).await {
            Ok(response) => response,
            Err(error) => self.fail(error, req.clone()).await,
        };

        metrics::record_request(
            &self.endpoint.name,
            req.method.as_str(),
            response.status().as_u16(),
            start,
        );
        response
    }

    async fn run(&self, req: InboundParts, body: InboundBody) -> Result<Response, GatewayError> {
        let shared = &self.shared;

        let relative = shared.matcher.strip(original_url(&req));
        let mut headers = shared.headers.request_headers(&req, shared.transport.as_ref());
        let body = outbound_body(&req.method, &mut headers, body)?;

        let endpoint_req = EndpointRequest {
            url: format!("{}/{}", shared.gateway.url, relative),
            options: RequestOptions {
                method: req.method.clone(),
                headers,
                body,
            },
        };

        let endpoint_req = shared
            .hooks
            .reduce_endpoint_request(RequestContext {
                endpoint_req,
                endpoint: self.endpoint.clone(),
                req: req.clone(),
            })
            .await?;

        tracing::debug!(
            request_id = %request_id(&req),
            endpoint = %self.endpoint.name,
            method = %endpoint_req.options.method,
            url = %endpoint_req.url,
            "Forwarding request"
        );

        let url = endpoint_req.url.clone();
        let endpoint_res = shared
            .transport
            .fetch(endpoint_req)
            .await
            .map_err(|source| GatewayError::Upstream { url, source })?;

        if endpoint_res.body.is_none() {
            return Err(GatewayError::NullBody);
        }

        let endpoint_res = shared
            .hooks
            .reduce_endpoint_response(ResponseContext {
                endpoint_res,
                endpoint: self.endpoint.clone(),
                req: req.clone(),
            })
            .await?;

        let stream = shared
            .hooks
            .should_stream_endpoint_response(StreamDecisionContext {
                status: endpoint_res.status,
                headers: endpoint_res.headers.clone(),
                endpoint: self.endpoint.clone(),
                req: req.clone(),
            })
            .await;

        if stream {
            return self.stream(endpoint_res);
        }

        let handled = shared
            .hooks
            .handle_endpoint_response(ResponseContext {
                endpoint_res,
                endpoint: self.endpoint.clone(),
                req,
            })
            .await;

        match handled {
            Some(result) => result,
            None => Err(ConfigurationError::MissingResponseHandler.into()),
        }
    }

    fn stream(&self, endpoint_res: EndpointResponse) -> Result<Response, GatewayError> {
        let EndpointResponse { status, headers, body } = endpoint_res;
        let body = body.ok_or(GatewayError::NullBody)?;

        let downstream = self.shared.downstream.clone();
        let endpoint = self.endpoint.name.clone();
        let on_error = Arc::new(move |error: GatewayError| {
            tracing::error!(endpoint = %endpoint, error = %error, "Upstream stream failed");
            metrics::record_error(&endpoint, error.kind());
            let _ = downstream.on_error(error);
        });

        Ok(stream_response(status, &headers, body, &self.shared.headers, on_error))
    }

    async fn fail(&self, error: GatewayError, req: InboundParts) -> Response {
        tracing::warn!(
            request_id = %request_id(&req),
            endpoint = %self.endpoint.name,
            error = %error,
            "Forwarding failed"
        );
        self.record_error(&error);

        if matches!(error, GatewayError::Configuration(_)) {
            return self.shared.downstream.on_error(error);
        }

        let dispatch = self
            .shared
            .hooks
            .handle_endpoint_error(ErrorContext {
                error,
                endpoint: self.endpoint.clone(),
                req,
            })
            .await;

        match dispatch {
            ErrorDispatch::Handled(response) => response,
            ErrorDispatch::Downstream(error) => self.shared.downstream.on_error(error),
        }
    }

    fn record_error(&self, error: &GatewayError) {
        metrics::record_error(&self.endpoint.name, error.kind());
    }
}

/// Path and query the client originally asked for.
fn original_url(req: &request::Parts) -> &str {
    let uri = req
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&req.uri);
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// Outbound body for a method. `GET` never carries one.
fn outbound_body(
    method: &Method,
    headers: &mut HeaderMap,
    body: InboundBody,
) -> Result<Option<Bytes>, GatewayError> {
    if method == Method::GET {
        return Ok(None);
    }
    match body {
        InboundBody::Empty => Ok(None),
        InboundBody::Json(value) => {
            let bytes = serde_json::to_vec(&value).map_err(|e| GatewayError::Body(e.to_string()))?;
            default_json_content_type(headers);
            Ok(Some(Bytes::from(bytes)))
        }
        InboundBody::Raw(bytes) => Ok(Some(bytes)),
    }
}
