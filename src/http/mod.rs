//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, optional timeout)
//!     → request.rs (request ID generated and echoed)
//!     → [gateway pipeline builds the upstream call]
//!     → headers.rs (copy / custom / x-forwarded-for rules)
//!     → transport.rs (upstream fetch)
//!     → response.rs (status + filtered headers, streamed body)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use headers::HeaderPolicy;
pub use request::{request_id_layers, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
pub use transport::{HttpTransport, HyperTransport};
