//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     Route[] (gateway::routes)
//!     → registrar.rs (one handler per route + method, bound to a router)
//!     → matcher.rs (mount prefix compiled once per controller)
//!
//! Incoming Request:
//!     router dispatch (method + path)
//!     → EndpointHandler (middlewares, then forwarding pipeline)
//!     → matcher.rs (strip mount prefix → upstream-relative path)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always registers the same routes

pub mod matcher;
pub mod registrar;

pub use matcher::{relative_path, MountMatcher};
pub use registrar::{middleware_fn, EndpointHandler, Middleware, RouteRegistrar};
