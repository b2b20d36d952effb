//! Process-wide invocation counters

use crate::state::SharedState;
use crate::types::{Counts, Event};

/// Deep copy of both counter maps taken under the lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub by_method: Counts,
    pub by_consumer: Counts,
}

/// Tallies of calls by operation name and by consumer identity
///
/// Counters only ever grow. Every increment and every snapshot goes through
/// the same lock, so a snapshot never observes half of a `record`.
#[derive(Debug, Clone)]
pub struct EventCounter {
    state: SharedState,
}

impl EventCounter {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Count one call for the event's operation and consumer
    pub fn record(&self, event: &Event) {
        self.state.with(|registry| {
            *registry.by_method.entry(event.method.clone()).or_insert(0) += 1;
            *registry.by_consumer.entry(event.consumer.clone()).or_insert(0) += 1;
        });
    }

    /// Copy both maps so callers can transform them without holding the lock
    pub fn snapshot(&self) -> Snapshot {
        self.state.with(|registry| Snapshot {
            by_method: registry.by_method.clone(),
            by_consumer: registry.by_consumer.clone(),
        })
    }
}
