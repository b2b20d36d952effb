//! HTTP transport
//!
//! Maps the service interfaces onto axum routes:
//!
//! - `POST /main.Biz/Check`, `/main.Biz/Add`, `/main.Biz/Test`: JSON `{"dummy": true}`
//! - `GET /main.Admin/Logging`: SSE stream of `event` messages
//! - `GET /main.Admin/Statistics?interval_seconds=N`: SSE stream of `stat` messages
//!
//! The caller identifies itself with the `consumer` header.

pub mod handlers;
pub mod http;
pub mod metadata;
pub mod streams;

pub use http::{create_router, AppState};
pub use metadata::{call_context, CONSUMER_HEADER};
