//! Server-sent event endpoints for the Admin subscriptions

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use tokio_stream::StreamExt;

use super::http::AppState;
use super::metadata::call_context;
use crate::service::{Admin, ServiceError};
use crate::types::StatInterval;

const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Query parameters for GET /main.Admin/Statistics
///
/// Kept as text so a malformed value surfaces as `InvalidArgument`.
#[derive(Debug, Deserialize)]
pub struct StatisticsParams {
    pub interval_seconds: Option<String>,
}

impl StatisticsParams {
    fn interval(&self) -> Result<StatInterval, ServiceError> {
        let raw = self.interval_seconds.as_deref().ok_or_else(|| {
            ServiceError::InvalidArgument("interval_seconds is required".to_string())
        })?;
        let interval_seconds = raw.trim().parse::<u64>().map_err(|_| {
            ServiceError::InvalidArgument(format!("invalid interval_seconds: {raw}"))
        })?;
        Ok(StatInterval { interval_seconds })
    }
}

/// GET /main.Admin/Logging
pub async fn logging(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ServiceError> {
    let ctx = call_context(&headers, peer.map(|ConnectInfo(addr)| addr));
    let events = state.service.logging(&ctx)?;

    let stream = events.map(|event| {
        Ok::<_, Infallible>(
            SseEvent::default()
                .event("event")
                .data(serde_json::to_string(&*event).unwrap_or_default()),
        )
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default().interval(KEEP_ALIVE)))
}

/// GET /main.Admin/Statistics?interval_seconds=N
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<StatisticsParams>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ServiceError> {
    let interval = params.interval()?;
    let ctx = call_context(&headers, peer.map(|ConnectInfo(addr)| addr));
    let stats = state.service.statistics(&ctx, interval)?;

    let stream = stats.map(|stat| {
        Ok::<_, Infallible>(
            SseEvent::default()
                .event("stat")
                .data(serde_json::to_string(&stat).unwrap_or_default()),
        )
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default().interval(KEEP_ALIVE)))
}
