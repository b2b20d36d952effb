//! Call Monitor
//!
//! An authorization-gated call-logging and usage-statistics service.
//!
//! Consumers call three business operations (`Check`, `Add`, `Test`) that do
//! nothing but succeed. Every authorized call is counted and fanned out to
//! live observers, who subscribe through two admin streams:
//!
//! - **Logging**: one event per call made by any other consumer
//! - **Statistics**: per-method and per-consumer call counts on a fixed
//!   interval, either as deltas or as cumulative totals
//!
//! # Modules
//!
//! - `acl`: consumer → allowed-method rules
//! - `stats`: call counters and the statistics projection
//! - `distributor`: non-blocking fan-out of call events
//! - `service`: the `Biz` and `Admin` interfaces
//! - `api`: axum routes and SSE framing
//! - `server`: bind, serve and shut down
//! - `config`, `telemetry`: environment configuration and logging
//!
//! # Example
//!
//! ```no_run
//! use call_monitor::{server, ServiceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_env()?;
//! let shutdown = CancellationToken::new();
//! let handle = server::start(config, shutdown.clone()).await?;
//!
//! server::wait_for_shutdown_signal().await?;
//! shutdown.cancel();
//! handle.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod acl;
pub mod api;
pub mod config;
pub mod distributor;
pub mod server;
pub mod service;
pub mod state;
pub mod stats;
pub mod telemetry;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use acl::{AccessController, AclError};
pub use config::{ConfigError, ServiceConfig};
pub use distributor::{DistributorConfig, LogDistributor, Subscription};
pub use server::{start, ServerHandle, StartupError};
pub use service::{Admin, Biz, CallContext, Service, ServiceError, ServiceOptions};
pub use stats::{EventCounter, Snapshot, StatMode, StatPolicy, StatisticsStreamer};
pub use types::{Event, Nothing, Stat, StatInterval};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
