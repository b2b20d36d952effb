//! Non-blocking fan-out of call events to Logging subscribers
//!
//! ## Architecture
//! ```text
//! publish(event) ──► [input queue] ──► distributor task
//!   (try_send)        (bounded)            │
//!                                          ├──► [subscriber 1] ──► Logging stream 1
//!                                          ├──► [subscriber 2] ──► Logging stream 2
//!                                          └──► [subscriber N] ──► Logging stream N
//!                                               (bounded, try_send)
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `publish()` never waits; a full input queue drops the event
//! - **Overflow**: a full subscriber buffer drops the event for that subscriber only
//! - **Per-subscriber FIFO**: each subscriber sees events in dequeue order
//! - **No self-events**: a subscriber never receives events carrying its own consumer identity
//! - **Cleanup**: dropping a [`Subscription`] removes its registration

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::state::{SharedState, Subscriber};
use crate::types::Event;

/// Channel capacities for the distributor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributorConfig {
    /// Events queued between call sites and the distributor task
    pub input_capacity: usize,
    /// Events buffered per Logging subscriber
    pub subscriber_capacity: usize,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            input_capacity: 100,
            subscriber_capacity: 10,
        }
    }
}

/// Owner of the input queue and the single long-lived fan-out task
pub struct LogDistributor {
    state: SharedState,
    input: mpsc::Sender<Arc<Event>>,
    next_id: AtomicU64,
    subscriber_capacity: usize,
    /// Fired when the fan-out task has exited
    stopped: CancellationToken,
}

impl LogDistributor {
    /// Spawn the fan-out task; it runs until `shutdown` is cancelled
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        state: SharedState,
        config: DistributorConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let (input, rx) = mpsc::channel(config.input_capacity.max(1));
        let stopped = CancellationToken::new();
        tokio::spawn(run(state.clone(), rx, shutdown, stopped.clone()));

        Self {
            state,
            input,
            next_id: AtomicU64::new(1),
            subscriber_capacity: config.subscriber_capacity.max(1),
            stopped,
        }
    }

    /// Queue an event for fan-out. Returns false if it was dropped.
    pub fn publish(&self, event: Event) -> bool {
        match self.input.try_send(Arc::new(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::debug!(
                    consumer = %event.consumer,
                    method = %event.method,
                    "input queue full, event dropped"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Register a new Logging subscriber for `consumer`
    pub fn subscribe(&self, consumer: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel(self.subscriber_capacity);

        self.state.with(|registry| {
            registry.subscribers.push(Subscriber {
                id,
                consumer: consumer.to_string(),
                sender,
            });
        });
        tracing::info!(consumer, id, "logging subscriber registered");

        Subscription {
            id,
            consumer: consumer.to_string(),
            receiver,
            state: self.state.clone(),
        }
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.state.with(|registry| registry.subscribers.len())
    }

    /// Wait for the fan-out task to exit (after shutdown)
    ///
    /// Any number of callers may wait at once.
    pub async fn join(&self) {
        self.stopped.cancelled().await;
    }
}

async fn run(
    state: SharedState,
    mut rx: mpsc::Receiver<Arc<Event>>,
    shutdown: CancellationToken,
    stopped: CancellationToken,
) {
    // Fires on every exit path, unwinding included
    let _stopped = stopped.drop_guard();

    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        fan_out(&state, &event);
    }

    // Close the input before `stopped` fires so late publishes fail
    drop(rx);
    // Dropping the senders ends every subscriber's receive loop
    state.with(|registry| registry.subscribers.clear());
    tracing::info!("log distributor stopped");
}

/// Deliver one event to every eligible subscriber without blocking.
/// Returns how many subscribers accepted it.
fn fan_out(state: &SharedState, event: &Arc<Event>) -> usize {
    let targets: Vec<(String, mpsc::Sender<Arc<Event>>)> = state.with(|registry| {
        registry
            .subscribers
            .iter()
            .filter(|sub| sub.consumer != event.consumer)
            .map(|sub| (sub.consumer.clone(), sub.sender.clone()))
            .collect()
    });

    let mut delivered = 0;
    for (consumer, sender) in targets {
        match sender.try_send(Arc::clone(event)) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(
                    subscriber = %consumer,
                    method = %event.method,
                    "subscriber channel full, event dropped"
                );
            }
            // Subscription is going away
            Err(TrySendError::Closed(_)) => {}
        }
    }
    delivered
}

/// A registered Logging subscriber's receiving end
///
/// Dropping it deregisters the subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    consumer: String,
    receiver: mpsc::Receiver<Arc<Event>>,
    state: SharedState,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once the distributor has stopped
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.recv().await
    }

    /// Next buffered event without waiting
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.try_recv().ok()
    }

    /// Forward events until the channel closes, `cancel` fires or `shutdown` fires
    pub fn into_stream(
        self,
        cancel: CancellationToken,
        shutdown: CancellationToken,
    ) -> BoxStream<'static, Arc<Event>> {
        let mut subscription = self;
        let stream = async_stream::stream! {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    _ = shutdown.cancelled() => None,
                    event = subscription.recv() => event,
                };
                match next {
                    Some(event) if event.consumer == subscription.consumer => continue,
                    Some(event) => {
                        yield event;
                    }
                    None => break,
                }
            }
            tracing::info!(
                consumer = %subscription.consumer,
                id = subscription.id,
                "logging stream finished"
            );
            drop(subscription);
        };
        Box::pin(stream)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let id = self.id;
        self.state
            .with(|registry| registry.subscribers.retain(|sub| sub.id != id));
    }
}
