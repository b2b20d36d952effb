//! Call events and statistics snapshots
//!
//! An [`Event`] is the immutable record of one authorized call. A [`Stat`] is a
//! point-in-time view of the usage counters, built fresh on every statistics tick.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utils::time::current_timestamp;

/// Counts keyed by operation name or consumer identity
pub type Counts = HashMap<String, u64>;

/// A single record of one authorized call (who, what, when, from where)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Consumer identity taken from call metadata
    pub consumer: String,
    /// Fully-qualified operation name, e.g. `/main.Biz/Check`
    pub method: String,
    /// Network origin of the caller
    pub host: String,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(
        consumer: impl Into<String>,
        method: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: current_timestamp(),
            consumer: consumer.into(),
            method: method.into(),
            host: host.into(),
        }
    }
}

/// Usage statistics emitted by a statistics subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub timestamp: i64,
    pub by_method: Counts,
    pub by_consumer: Counts,
}

impl Stat {
    pub fn new(by_method: Counts, by_consumer: Counts) -> Self {
        Self {
            timestamp: current_timestamp(),
            by_method,
            by_consumer,
        }
    }
}

/// Trivial acknowledgement returned by the business operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nothing {
    pub dummy: bool,
}

impl Default for Nothing {
    fn default() -> Self {
        Self { dummy: true }
    }
}

/// Payload of the Statistics subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatInterval {
    pub interval_seconds: u64,
}
