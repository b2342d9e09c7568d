//! Streamed responses.
//!
//! # Responsibilities
//! - Turn an upstream response into the client response
//! - Copy status and permitted headers
//! - Pipe the upstream body through without buffering
//! - Route body stream errors into a single error channel
//!
//! # Design Decisions
//! - Backpressure is left to the body stream: chunks are pulled only as the
//!   client connection accepts them
//! - A stream error is reported once, then ends the response

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use futures_util::TryStreamExt;

use crate::error::GatewayError;
use crate::http::headers::HeaderPolicy;

/// Receives errors raised while the body is already streaming.
pub type StreamErrorSink = Arc<dyn Fn(GatewayError) + Send + Sync>;

/// Build the client response around the upstream body stream.
pub fn stream_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: Body,
    policy: &HeaderPolicy,
    on_error: StreamErrorSink,
) -> Response {
    let stream = body
        .into_data_stream()
        .inspect_err(move |err| on_error(GatewayError::Stream(err.to_string())));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    policy.copy_response_headers(headers, response.headers_mut());
    response
}
