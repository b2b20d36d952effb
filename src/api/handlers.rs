//! Business operation handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::http::AppState;
use super::metadata::call_context;
use crate::service::{Biz, ServiceError};
use crate::types::Nothing;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// POST /main.Biz/Check
pub async fn check(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<Nothing>, ServiceError> {
    let ctx = call_context(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.service.check(&ctx).map(Json)
}

/// POST /main.Biz/Add
pub async fn add(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<Nothing>, ServiceError> {
    let ctx = call_context(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.service.add(&ctx).map(Json)
}

/// POST /main.Biz/Test
pub async fn test(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<Nothing>, ServiceError> {
    let ctx = call_context(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.service.test(&ctx).map(Json)
}
