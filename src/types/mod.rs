//! Data types for the call monitor
//!
//! This module contains the records that flow between the service components.

mod event;

pub use event::{Counts, Event, Nothing, Stat, StatInterval};
