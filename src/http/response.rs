//! Response handling and transformation.
//!
//! # Responsibilities
//! - Pass backend responses through with hop-by-hop headers removed
//! - Build the gateway's own error responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Connect failures → 502 `unreachable`, failures after forwarding → 502
//!   `interrupted`, upstream timeouts → 504 `timeout`, all in
//!   `x-gateway-error` so clients can tell them from backend errors
//! - Unrouted paths → 404 with an `ErrorBody`, never forwarded

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hyper::body::Incoming;

use crate::gateway::types::ErrorBody;
use crate::gateway::{GATEWAY_ERROR_HEADER, INTERRUPTED, TIMED_OUT, UNREACHABLE};
use crate::http::request::strip_hop_by_hop;

/// Relay an upstream response to the client.
pub fn relay(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

fn gateway_error(status: StatusCode, tag: &'static str, reason: impl Into<String>) -> Response {
    let mut response = (status, Json(ErrorBody::new(reason))).into_response();
    response
        .headers_mut()
        .insert(GATEWAY_ERROR_HEADER, HeaderValue::from_static(tag));
    response
}

/// No connection to the backend could be made. Nothing was forwarded.
pub fn unreachable(reason: impl Into<String>) -> Response {
    gateway_error(StatusCode::BAD_GATEWAY, UNREACHABLE, reason)
}

/// The connection failed after the request was forwarded.
pub fn interrupted(reason: impl Into<String>) -> Response {
    gateway_error(StatusCode::BAD_GATEWAY, INTERRUPTED, reason)
}

/// The backend did not answer in time. It may still apply the request.
pub fn timed_out() -> Response {
    gateway_error(StatusCode::GATEWAY_TIMEOUT, TIMED_OUT, "backend timed out")
}

/// No route covers the requested path.
pub fn no_route(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(format!("no route for `{path}`"))),
    )
        .into_response()
}

/// The gateway failed to build the upstream request.
pub fn internal(reason: impl Into<String>) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(reason))).into_response()
}
