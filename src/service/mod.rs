//! Service facade
//!
//! Wires the [`AccessController`], [`EventCounter`], [`LogDistributor`] and
//! [`StatisticsStreamer`] together behind two interfaces:
//!
//! - [`Biz`]: the business operations `Check`, `Add` and `Test`
//! - [`Admin`]: the `Logging` and `Statistics` subscriptions
//!
//! Every authorized call becomes an [`Event`] that is counted and queued for
//! fan-out. A denied call touches no shared state.

mod error;
pub mod methods;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::acl::AccessController;
use crate::distributor::{DistributorConfig, LogDistributor};
use crate::state::SharedState;
use crate::stats::{EventCounter, Snapshot, StatPolicy, StatisticsStreamer, MAX_INTERVAL};
use crate::types::{Event, Nothing, Stat, StatInterval};

pub use error::ServiceError;

/// Live feed of call events
pub type EventStream = BoxStream<'static, Arc<Event>>;

/// Periodic statistics feed
pub type StatStream = BoxStream<'static, Stat>;

/// Host reported when the transport gives no peer address
pub const UNKNOWN_HOST: &str = "unknown";

/// Per-call metadata handed over by the transport
#[derive(Debug, Clone)]
pub struct CallContext {
    /// The `consumer` metadata value, if the call carried one
    pub consumer: Option<String>,
    /// Caller's network address
    pub peer: Option<SocketAddr>,
    /// Fires when the caller goes away
    pub cancel: CancellationToken,
}

impl CallContext {
    pub fn new(consumer: Option<String>, peer: Option<SocketAddr>) -> Self {
        Self {
            consumer,
            peer,
            cancel: CancellationToken::new(),
        }
    }

    /// Context for a named consumer with no peer address
    pub fn for_consumer(consumer: &str) -> Self {
        Self::new(Some(consumer.to_string()), None)
    }

    pub fn host(&self) -> String {
        self.peer
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| UNKNOWN_HOST.to_string())
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Business operations
pub trait Biz: Send + Sync {
    fn check(&self, ctx: &CallContext) -> Result<Nothing, ServiceError>;
    fn add(&self, ctx: &CallContext) -> Result<Nothing, ServiceError>;
    fn test(&self, ctx: &CallContext) -> Result<Nothing, ServiceError>;
}

/// Observer subscriptions
pub trait Admin: Send + Sync {
    /// Stream every authorized call made by other consumers
    fn logging(&self, ctx: &CallContext) -> Result<EventStream, ServiceError>;

    /// Stream usage statistics every `interval_seconds`
    fn statistics(&self, ctx: &CallContext, req: StatInterval) -> Result<StatStream, ServiceError>;
}

/// Tunables for a [`Service`]
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub distributor: DistributorConfig,
    pub stat_policy: StatPolicy,
    /// Reject Statistics calls that fail the ACL (off: served to any consumer)
    pub statistics_requires_auth: bool,
}

/// The call-logging service
pub struct Service {
    acl: AccessController,
    counter: EventCounter,
    distributor: LogDistributor,
    options: ServiceOptions,
    shutdown: CancellationToken,
}

impl Service {
    /// Create the service and spawn its distributor task
    ///
    /// Cancelling `shutdown` stops the distributor and ends every stream.
    /// Must be called from within a tokio runtime.
    pub fn new(
        acl: AccessController,
        options: ServiceOptions,
        shutdown: CancellationToken,
    ) -> Self {
        let state = SharedState::new();
        let counter = EventCounter::new(state.clone());
        let distributor = LogDistributor::spawn(state, options.distributor, shutdown.clone());

        Self {
            acl,
            counter,
            distributor,
            options,
            shutdown,
        }
    }

    /// Fire the shutdown signal
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait until the distributor has exited
    pub async fn stopped(&self) {
        self.shutdown.cancelled().await;
        self.distributor.join().await;
    }

    /// Current counter values
    pub fn snapshot(&self) -> Snapshot {
        self.counter.snapshot()
    }

    /// Number of active Logging subscribers
    pub fn subscriber_count(&self) -> usize {
        self.distributor.subscriber_count()
    }

    fn ensure_running(&self) -> Result<(), ServiceError> {
        if self.shutdown.is_cancelled() {
            return Err(ServiceError::ShuttingDown);
        }
        Ok(())
    }

    /// Authorize `method` for the caller and return its consumer identity
    fn authorize<'a>(&self, ctx: &'a CallContext, method: &str) -> Result<&'a str, ServiceError> {
        self.ensure_running()?;
        let consumer = ctx.consumer.as_deref();
        if let Err(err) = self.acl.authorize(consumer, method) {
            tracing::warn!(
                consumer = consumer.unwrap_or("-"),
                method,
                reason = %err,
                "call denied"
            );
            return Err(err.into());
        }
        // authorize() rejects a missing consumer
        Ok(consumer.unwrap_or_default())
    }

    /// Count the call and queue it for fan-out
    fn log_call(&self, consumer: &str, method: &str, ctx: &CallContext) {
        let event = Event::new(consumer, method, ctx.host());
        self.counter.record(&event);
        self.distributor.publish(event);
    }

    fn unary(&self, ctx: &CallContext, method: &str) -> Result<Nothing, ServiceError> {
        let consumer = self.authorize(ctx, method)?;
        self.log_call(consumer, method, ctx);
        Ok(Nothing::default())
    }
}

impl Biz for Service {
    fn check(&self, ctx: &CallContext) -> Result<Nothing, ServiceError> {
        self.unary(ctx, methods::CHECK)
    }

    fn add(&self, ctx: &CallContext) -> Result<Nothing, ServiceError> {
        self.unary(ctx, methods::ADD)
    }

    fn test(&self, ctx: &CallContext) -> Result<Nothing, ServiceError> {
        self.unary(ctx, methods::TEST)
    }
}

impl Admin for Service {
    fn logging(&self, ctx: &CallContext) -> Result<EventStream, ServiceError> {
        let consumer = self.authorize(ctx, methods::LOGGING)?;

        let subscription = self.distributor.subscribe(consumer);
        self.log_call(consumer, methods::LOGGING, ctx);

        Ok(subscription.into_stream(ctx.cancel.clone(), self.shutdown.clone()))
    }

    fn statistics(&self, ctx: &CallContext, req: StatInterval) -> Result<StatStream, ServiceError> {
        self.ensure_running()?;
        let max_seconds = MAX_INTERVAL.as_secs();
        if !(1..=max_seconds).contains(&req.interval_seconds) {
            return Err(ServiceError::InvalidArgument(format!(
                "interval_seconds must be between 1 and {max_seconds}"
            )));
        }

        let authorized = match self.acl.authorize(ctx.consumer.as_deref(), methods::STATISTICS) {
            Ok(()) => true,
            Err(err) if self.options.statistics_requires_auth => {
                tracing::warn!(
                    consumer = ctx.consumer.as_deref().unwrap_or("-"),
                    method = methods::STATISTICS,
                    reason = %err,
                    "call denied"
                );
                return Err(err.into());
            }
            Err(_) => false,
        };
        // Anonymous observers get plain totals
        let consumer = ctx.consumer.as_deref().unwrap_or_default();

        let mode = self.options.stat_policy.mode_for(consumer);
        if authorized && mode.records_own_call() {
            self.log_call(consumer, methods::STATISTICS, ctx);
        }
        tracing::info!(
            consumer,
            ?mode,
            interval = req.interval_seconds,
            "statistics subscription started"
        );

        let streamer = StatisticsStreamer::start(
            self.counter.clone(),
            mode,
            methods::STATISTICS,
            consumer,
            Duration::from_secs(req.interval_seconds),
        );
        Ok(streamer.into_stream(ctx.cancel.clone(), self.shutdown.clone()))
    }
}
