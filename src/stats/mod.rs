//! Usage statistics
//!
//! - `EventCounter`: shared per-operation and per-consumer tallies
//! - `StatisticsStreamer`: one periodic snapshot stream per subscription
//! - `StatPolicy`: which consumer gets which [`StatMode`]

mod counter;
mod policy;
mod streamer;

pub use counter::{EventCounter, Snapshot};
pub use policy::StatPolicy;
pub use streamer::{
    delta, Projection, StatMode, StatisticsStreamer, MAX_INTERVAL, MIN_INTERVAL,
};
