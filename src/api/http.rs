//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{handlers, streams};
use crate::service::{methods, Service};

/// Shared state for all routes
pub struct AppState {
    pub service: Arc<Service>,
}

impl AppState {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(methods::CHECK, post(handlers::check))
        .route(methods::ADD, post(handlers::add))
        .route(methods::TEST, post(handlers::test))
        .route(methods::LOGGING, get(streams::logging))
        .route(methods::STATISTICS, get(streams::statistics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
