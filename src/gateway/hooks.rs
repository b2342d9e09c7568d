//! Endpoint extension hooks.
//!
//! # Responsibilities
//! - Hold the five optional hooks a caller can supply
//! - Resolve the active hook set on every invocation
//! - Apply the documented default when a hook is absent
//!
//! # Defaults
//! - `reduce_endpoint_request`: request unchanged
//! - `reduce_endpoint_response`: response unchanged
//! - `should_stream_endpoint_response`: `true`
//! - `handle_endpoint_response`: none; required when not streaming
//! - `handle_endpoint_error`: error goes to the downstream continuation
//!
//! # Design Decisions
//! - The hook set lives behind an `ArcSwapOption` so it can be installed,
//!   swapped or cleared between requests without locking

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::http::{request, HeaderMap, StatusCode};
use axum::response::Response;
use futures_util::future::{BoxFuture, FutureExt};

use crate::error::GatewayError;
use crate::gateway::pipeline::{EndpointRequest, EndpointResponse};
use crate::gateway::routes::Endpoint;

/// Request half available to every hook: the inbound request head.
pub type InboundParts = Arc<request::Parts>;

/// An async hook taking an owned context.
pub type Hook<C, T> = Arc<dyn Fn(C) -> BoxFuture<'static, T> + Send + Sync>;

pub struct RequestContext {
    pub endpoint_req: EndpointRequest,
    pub endpoint: Arc<Endpoint>,
    pub req: InboundParts,
}

pub struct ResponseContext {
    pub endpoint_res: EndpointResponse,
    pub endpoint: Arc<Endpoint>,
    pub req: InboundParts,
}

/// Upstream response head, for the stream decision.
pub struct StreamDecisionContext {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub endpoint: Arc<Endpoint>,
    pub req: InboundParts,
}

pub struct ErrorContext {
    pub error: GatewayError,
    pub endpoint: Arc<Endpoint>,
    pub req: InboundParts,
}

/// The caller-supplied hook set. Every field is optional.
#[derive(Clone, Default)]
pub struct EndpointHooks {
    pub reduce_endpoint_request:
        Option<Hook<RequestContext, Result<EndpointRequest, GatewayError>>>,
    pub reduce_endpoint_response:
        Option<Hook<ResponseContext, Result<EndpointResponse, GatewayError>>>,
    pub should_stream_endpoint_response: Option<Hook<StreamDecisionContext, bool>>,
    pub handle_endpoint_response: Option<Hook<ResponseContext, Result<Response, GatewayError>>>,
    pub handle_endpoint_error: Option<Hook<ErrorContext, Result<Response, GatewayError>>>,
}

impl EndpointHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce_endpoint_request<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EndpointRequest, GatewayError>> + Send + 'static,
    {
        self.reduce_endpoint_request = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn reduce_endpoint_response<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResponseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EndpointResponse, GatewayError>> + Send + 'static,
    {
        self.reduce_endpoint_response = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn should_stream_endpoint_response<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StreamDecisionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.should_stream_endpoint_response = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn handle_endpoint_response<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResponseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, GatewayError>> + Send + 'static,
    {
        self.handle_endpoint_response = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn handle_endpoint_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ErrorContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, GatewayError>> + Send + 'static,
    {
        self.handle_endpoint_error = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }
}

impl std::fmt::Debug for EndpointHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointHooks")
            .field("reduce_endpoint_request", &self.reduce_endpoint_request.is_some())
            .field("reduce_endpoint_response", &self.reduce_endpoint_response.is_some())
            .field(
                "should_stream_endpoint_response",
                &self.should_stream_endpoint_response.is_some(),
            )
            .field("handle_endpoint_response", &self.handle_endpoint_response.is_some())
            .field("handle_endpoint_error", &self.handle_endpoint_error.is_some())
            .finish()
    }
}

/// Outcome of an error dispatch.
pub enum ErrorDispatch {
    /// A hook produced the response.
    Handled(Response),
    /// No hook took it, or the hook failed; the error continues downstream.
    Downstream(GatewayError),
}

/// Shared handle to the active hook set, consulted on every call.
#[derive(Clone, Default)]
pub struct HookDispatcher {
    slot: Arc<ArcSwapOption<EndpointHooks>>,
}

impl HookDispatcher {
    pub fn new(hooks: Option<EndpointHooks>) -> Self {
        Self {
            slot: Arc::new(ArcSwapOption::from(hooks.map(Arc::new))),
        }
    }

    /// Install or replace the hook set for subsequent requests.
    pub fn install(&self, hooks: EndpointHooks) {
        self.slot.store(Some(Arc::new(hooks)));
    }

    pub fn clear(&self) {
        self.slot.store(None);
    }

    fn active(&self) -> Option<Arc<EndpointHooks>> {
        self.slot.load_full()
    }

    pub async fn reduce_endpoint_request(
        &self,
        ctx: RequestContext,
    ) -> Result<EndpointRequest, GatewayError> {
        match self.active().and_then(|h| h.reduce_endpoint_request.clone()) {
            Some(hook) => hook(ctx).await,
            None => Ok(ctx.endpoint_req),
        }
    }

    pub async fn reduce_endpoint_response(
        &self,
        ctx: ResponseContext,
    ) -> Result<EndpointResponse, GatewayError> {
        match self.active().and_then(|h| h.reduce_endpoint_response.clone()) {
            Some(hook) => hook(ctx).await,
            None => Ok(ctx.endpoint_res),
        }
    }

    pub async fn should_stream_endpoint_response(&self, ctx: StreamDecisionContext) -> bool {
        match self.active().and_then(|h| h.should_stream_endpoint_response.clone()) {
            Some(hook) => hook(ctx).await,
            None => true,
        }
    }

    /// Hand the response to the caller's handler; `None` when there is none.
    pub async fn handle_endpoint_response(
        &self,
        ctx: ResponseContext,
    ) -> Option<Result<Response, GatewayError>> {
        let hook = self.active().and_then(|h| h.handle_endpoint_response.clone())?;
        Some(hook(ctx).await)
    }

    pub async fn handle_endpoint_error(&self, ctx: ErrorContext) -> ErrorDispatch {
        match self.active().and_then(|h| h.handle_endpoint_error.clone()) {
            Some(hook) => match hook(ctx).await {
                Ok(response) => ErrorDispatch::Handled(response),
                Err(err) => ErrorDispatch::Downstream(err),
            },
            None => ErrorDispatch::Downstream(ctx.error),
        }
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("hooks", &self.active())
            .finish()
    }
}
