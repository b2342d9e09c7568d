//! Route registration.
//!
//! # Responsibilities
//! - Define the router surface the gateway mounts onto
//! - Bind one [`EndpointHandler`] per `(route, method)`
//! - Run caller-supplied middlewares ahead of the forwarding pipeline
//!
//! # Design Decisions
//! - Registration is additive and order-preserving; `register` returns the
//!   router for chaining, or the reason the path cannot be mounted
//! - `all` endpoints are registered as the path's fallback, so a specific
//!   method on the same path takes precedence
//! - Express-style `:param` and `*rest` segments are rewritten to axum's
//!   `{param}` and `{*rest}`

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, on, MethodFilter, MethodRouter},
    Router,
};
use futures_util::future::{BoxFuture, FutureExt};

use crate::error::ConfigurationError;
use crate::gateway::method::HttpMethod;
use crate::gateway::pipeline::ForwardingPipeline;

/// A pre-handler: passes the (possibly modified) request on, or answers it.
pub type Middleware =
    Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Result<Request<Body>, Response>> + Send + Sync>;

/// Wrap an async function as a [`Middleware`].
pub fn middleware_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Request<Body>, Response>> + Send + 'static,
{
    Arc::new(move |request| f(request).boxed())
}

/// Middlewares followed by the forwarding pipeline of one endpoint.
#[derive(Clone)]
pub struct EndpointHandler {
    middlewares: Arc<[Middleware]>,
    pipeline: Arc<ForwardingPipeline>,
}

impl EndpointHandler {
    pub fn new(middlewares: Arc<[Middleware]>, pipeline: Arc<ForwardingPipeline>) -> Self {
        Self { middlewares, pipeline }
    }

    /// Flattened name of the endpoint this handler forwards to.
    pub fn endpoint_name(&self) -> &str {
        &self.pipeline.endpoint().name
    }

    pub async fn call(&self, mut request: Request<Body>) -> Response {
        for middleware in self.middlewares.iter() {
            match middleware(request).await {
                Ok(next) => request = next,
                Err(response) => return response,
            }
        }
        self.pipeline.handle(request).await
    }
}

impl std::fmt::Debug for EndpointHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointHandler")
            .field("endpoint", &self.endpoint_name())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// A router the gateway can mount its routes onto.
pub trait RouteRegistrar: Sized {
    fn register(
        self,
        method: HttpMethod,
        path: &str,
        handler: EndpointHandler,
    ) -> Result<Self, ConfigurationError>;
}

/// Paths are checked before they reach axum. Routes registered on the router
/// beforehand must not overlap the gateway's paths.
impl<S> RouteRegistrar for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn register(
        self,
        method: HttpMethod,
        path: &str,
        handler: EndpointHandler,
    ) -> Result<Self, ConfigurationError> {
        check_route_path(path).map_err(|reason| ConfigurationError::InvalidRoutePath {
            endpoint: handler.endpoint_name().to_string(),
            path: path.to_string(),
            reason,
        })?;
        Ok(self.route(&axum_path(path), method_router(method, handler)))
    }
}

fn method_router<S>(method: HttpMethod, handler: EndpointHandler) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let Some(expected) = method.to_http() else {
        return any(move |request: Request<Body>| async move { handler.call(request).await });
    };

    match MethodFilter::try_from(expected.clone()) {
        Ok(filter) => on(filter, move |request: Request<Body>| async move {
            handler.call(request).await
        }),
        Err(_) => any(move |request: Request<Body>| guarded(expected, handler, request)),
    }
}

async fn guarded(expected: Method, handler: EndpointHandler, request: Request<Body>) -> Response {
    if request.method() != expected {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    handler.call(request).await
}

/// Reject paths axum cannot mount: braces, unnamed `:` segments and
/// wildcards before the last segment.
pub fn check_route_path(path: &str) -> Result<(), String> {
    let segments: Vec<&str> = path.split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.contains(['{', '}']) {
            return Err(format!("segment `{segment}` contains a brace"));
        }
        if *segment == ":" {
            return Err("parameter segment without a name".to_string());
        }
        if segment.starts_with('*') && i + 1 != segments.len() {
            return Err(format!("wildcard `{segment}` must be the last segment"));
        }
    }
    Ok(())
}

/// Rewrite `:param` and `*rest` segments into axum path syntax.
pub fn axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                let name = if name.is_empty() { "rest" } else { name };
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
