//! Gateway forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Construction (once):
//!     GatewayConfig.gateway (EndpointTree)
//!     → endpoint.rs (flatten → FlatEndpoints)
//!     → routes.rs (group by path, detect collisions → Route[])
//!     → descriptor.rs (client-facing ApiDescriptor)
//!     → controller.rs (one ForwardingPipeline per route + method)
//!
//! Incoming Request:
//!     EndpointHandler (routing::registrar)
//!     → pipeline.rs (headers, body, hooks, upstream fetch)
//!     → hooks.rs (active hook set resolved per call)
//!     → streamed or hook-handled response
//! ```
//!
//! # Design Decisions
//! - Static validation happens only at construction
//! - No shared mutable state across requests apart from the hook slot

pub mod controller;
pub mod descriptor;
pub mod endpoint;
pub mod hooks;
pub mod method;
pub mod pipeline;
pub mod routes;

pub use controller::{ApiConfigRequest, GatewayController};
pub use descriptor::{describe, substitute_placeholders, ApiDescriptor, DescribeOptions};
pub use endpoint::{
    flatten, unflatten, EndpointDefinition, EndpointEntry, EndpointNode, EndpointTree,
    FlatEndpoints,
};
pub use hooks::{
    EndpointHooks, ErrorContext, HookDispatcher, RequestContext, ResponseContext,
    StreamDecisionContext,
};
pub use method::HttpMethod;
pub use pipeline::{
    EndpointRequest, EndpointResponse, ForwardingPipeline, InboundBody, RequestOptions,
};
pub use routes::{build_routes, route_shape, Endpoint, Route, RouteMethod};
