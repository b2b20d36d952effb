//! Shared mutable state
//!
//! The usage counters and the live subscriber list sit behind one lock so a
//! statistics snapshot and a fan-out pass always see a consistent picture.
//! Critical sections stay short: map increments, a bounded copy, or a list
//! insert/remove. Channel sends never happen while the lock is held.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::types::{Counts, Event};

/// A Logging subscriber's registration
#[derive(Debug, Clone)]
pub(crate) struct Subscriber {
    pub id: u64,
    pub consumer: String,
    pub sender: mpsc::Sender<Arc<Event>>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub by_method: Counts,
    pub by_consumer: Counts,
    pub subscribers: Vec<Subscriber>,
}

/// Cloneable handle to the single guarded registry
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<Registry>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the registry locked
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}
