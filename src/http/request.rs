//! Request handling and transformation.
//!
//! # Responsibilities
//! - Tag every request with an `x-request-id` (UUID v4)
//! - Rewrite the URI to point at the route's backend
//! - Strip hop-by-hop headers before forwarding
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Method, path, query string and body are forwarded untouched

use axum::http::{
    header::{self, HeaderMap, HeaderName},
    request::Parts,
    uri::{PathAndQuery, Uri},
    Version,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::routing::Route;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning a fresh request ID when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Request ID of an incoming request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove headers that describe a single connection rather than the message.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop too.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// URI of the same path and query on the route's backend.
pub fn upstream_uri(route: &Route, original: &Uri) -> Result<Uri, axum::http::Error> {
    let path_and_query = original
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    Uri::builder()
        .scheme(route.target().scheme())
        .authority(route.authority())
        .path_and_query(path_and_query)
        .build()
}

/// Turn the incoming request head into the one sent upstream.
pub fn prepare_upstream(route: &Route, parts: &mut Parts) -> Result<(), axum::http::Error> {
    parts.uri = upstream_uri(route, &parts.uri)?;
    // The upstream connector speaks HTTP/1.1 regardless of the client hop.
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    Ok(())
}
