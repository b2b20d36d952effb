//! Call metadata extraction

use std::net::SocketAddr;

use axum::http::HeaderMap;

use crate::service::CallContext;

/// Header carrying the caller's consumer identity
pub const CONSUMER_HEADER: &str = "consumer";

/// Build the per-call context from request headers and the peer address
pub fn call_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> CallContext {
    let consumer = headers
        .get(CONSUMER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    CallContext::new(consumer, peer)
}
