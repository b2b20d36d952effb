//! Periodic statistics snapshots for one subscription
//!
//! A [`StatisticsStreamer`] owns its mode-specific state (see [`Projection`])
//! and turns fresh counter snapshots into [`Stat`] records on every tick.

use std::time::Duration;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::counter::{EventCounter, Snapshot};
use crate::types::{Counts, Stat};

/// How a subscription turns counters into emitted statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMode {
    /// Counts since the previous tick, against a rolling baseline
    Delta,
    /// Running totals without the subscriber's own operation and consumer keys
    CumulativeExcludingSelf,
    /// Running totals as-is
    #[default]
    Cumulative,
}

impl StatMode {
    /// Whether the subscribe call itself is recorded as an event
    pub fn records_own_call(&self) -> bool {
        matches!(self, StatMode::CumulativeExcludingSelf)
    }
}

/// Per-key `max(0, current - baseline)`; keys with no growth are left out
pub fn delta(current: &Counts, baseline: &Counts) -> Counts {
    current
        .iter()
        .filter_map(|(key, &value)| {
            let base = baseline.get(key).copied().unwrap_or(0);
            (value > base).then(|| (key.clone(), value - base))
        })
        .collect()
}

/// Mode-specific state carried between ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Delta { baseline: Snapshot },
    ExcludeSelf { method: String, consumer: String },
    Cumulative,
}

impl Projection {
    /// Set up the projection at subscription start
    ///
    /// Delta mode zeroes the baseline for its own operation so calls that
    /// start statistics subscriptions show up as activity.
    pub fn start(mode: StatMode, initial: Snapshot, method: &str, consumer: &str) -> Self {
        match mode {
            StatMode::Delta => {
                let mut baseline = initial;
                baseline.by_method.insert(method.to_string(), 0);
                Projection::Delta { baseline }
            }
            StatMode::CumulativeExcludingSelf => Projection::ExcludeSelf {
                method: method.to_string(),
                consumer: consumer.to_string(),
            },
            StatMode::Cumulative => Projection::Cumulative,
        }
    }

    /// Transform a fresh snapshot into what gets emitted
    pub fn apply(&mut self, current: Snapshot) -> Snapshot {
        match self {
            Projection::Delta { baseline } => {
                let out = Snapshot {
                    by_method: delta(&current.by_method, &baseline.by_method),
                    by_consumer: delta(&current.by_consumer, &baseline.by_consumer),
                };
                *baseline = current;
                out
            }
            Projection::ExcludeSelf { method, consumer } => {
                let mut out = current;
                out.by_method.remove(method.as_str());
                out.by_consumer.remove(consumer.as_str());
                out
            }
            Projection::Cumulative => current,
        }
    }
}

/// Shortest tick period a streamer will run with
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Longest tick period a streamer will run with
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// One statistics subscription: a counter, a projection and an interval
pub struct StatisticsStreamer {
    counter: EventCounter,
    projection: Projection,
    interval: Duration,
}

impl StatisticsStreamer {
    /// Start a subscription; delta mode captures its baseline right here
    ///
    /// `interval` is clamped to `MIN_INTERVAL..=MAX_INTERVAL`.
    pub fn start(
        counter: EventCounter,
        mode: StatMode,
        method: &str,
        consumer: &str,
        interval: Duration,
    ) -> Self {
        let projection = Projection::start(mode, counter.snapshot(), method, consumer);
        Self {
            counter,
            projection,
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take a snapshot and project it
    pub fn tick(&mut self) -> Stat {
        let snapshot = self.projection.apply(self.counter.snapshot());
        Stat::new(snapshot.by_method, snapshot.by_consumer)
    }

    /// Emit one [`Stat`] per interval until `cancel` or `shutdown` fires
    ///
    /// The first emission happens one full interval after the call.
    pub fn into_stream(
        self,
        cancel: CancellationToken,
        shutdown: CancellationToken,
    ) -> BoxStream<'static, Stat> {
        let mut streamer = self;
        let stream = async_stream::stream! {
            let period = streamer.interval;
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let fire = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = shutdown.cancelled() => false,
                    _ = ticker.tick() => true,
                };
                if !fire {
                    break;
                }
                yield streamer.tick();
            }
            tracing::debug!("statistics stream finished");
        };
        Box::pin(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;
    use crate::types::Event;
    use futures::StreamExt;

    const STATS: &str = "/main.Admin/Statistics";
    const CHECK: &str = "/main.Biz/Check";

    fn counts(pairs: &[(&str, u64)]) -> Counts {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn snapshot(method: &[(&str, u64)], consumer: &[(&str, u64)]) -> Snapshot {
        Snapshot {
            by_method: counts(method),
            by_consumer: counts(consumer),
        }
    }

    #[test]
    fn test_delta_clamps_at_zero() {
        let current = counts(&[("a", 5), ("b", 2), ("c", 1)]);
        let baseline = counts(&[("a", 3), ("b", 4)]);
        assert_eq!(delta(&current, &baseline), counts(&[("a", 2), ("c", 1)]));
    }

    #[test]
    fn test_delta_projection_uses_rolling_baseline() {
        let mut projection = Projection::start(
            StatMode::Delta,
            snapshot(&[(CHECK, 5)], &[("alice", 5)]),
            STATS,
            "stat1",
        );

        let mut seen = vec![];
        for total in [8, 8, 12] {
            let out = projection.apply(snapshot(&[(CHECK, total)], &[("alice", total)]));
            seen.push(out.by_method.get(CHECK).copied().unwrap_or(0));
        }

        assert_eq!(seen, vec![3, 0, 4]);
    }

    #[test]
    fn test_delta_projection_forces_own_method_baseline_to_zero() {
        let mut projection = Projection::start(
            StatMode::Delta,
            snapshot(&[(STATS, 4)], &[]),
            STATS,
            "stat1",
        );

        let out = projection.apply(snapshot(&[(STATS, 4)], &[]));
        assert_eq!(out.by_method.get(STATS), Some(&4));

        let out = projection.apply(snapshot(&[(STATS, 4)], &[]));
        assert!(out.by_method.get(STATS).is_none());
    }

    #[test]
    fn test_exclude_self_projection_drops_own_keys() {
        let mut projection = Projection::start(
            StatMode::CumulativeExcludingSelf,
            Snapshot::default(),
            STATS,
            "stat2",
        );

        for extra in 0..3 {
            let out = projection.apply(snapshot(
                &[(STATS, 1 + extra), (CHECK, 2 + extra)],
                &[("stat2", 1 + extra), ("alice", 2 + extra)],
            ));
            assert!(!out.by_method.contains_key(STATS));
            assert!(!out.by_consumer.contains_key("stat2"));
            assert_eq!(out.by_method[CHECK], 2 + extra);
            assert_eq!(out.by_consumer["alice"], 2 + extra);
        }
    }

    #[test]
    fn test_cumulative_projection_passes_through() {
        let mut projection =
            Projection::start(StatMode::Cumulative, Snapshot::default(), STATS, "viewer");
        let snap = snapshot(&[(STATS, 1)], &[("viewer", 1)]);
        assert_eq!(projection.apply(snap.clone()), snap);
    }

    #[test]
    fn test_only_self_excluding_mode_records_its_call() {
        assert!(StatMode::CumulativeExcludingSelf.records_own_call());
        assert!(!StatMode::Delta.records_own_call());
        assert!(!StatMode::Cumulative.records_own_call());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_emits_per_interval() {
        let counter = EventCounter::new(SharedState::new());
        let streamer = StatisticsStreamer::start(
            counter.clone(),
            StatMode::Delta,
            STATS,
            "stat1",
            Duration::from_secs(1),
        );
        let mut stream = streamer.into_stream(CancellationToken::new(), CancellationToken::new());

        counter.record(&Event::new("alice", CHECK, "h"));
        let first = stream.next().await.unwrap();
        assert_eq!(first.by_method.get(CHECK), Some(&1));
        assert_eq!(first.by_consumer.get("alice"), Some(&1));

        let second = stream.next().await.unwrap();
        assert!(second.by_method.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_on_cancel() {
        let counter = EventCounter::new(SharedState::new());
        let cancel = CancellationToken::new();
        let streamer = StatisticsStreamer::start(
            counter,
            StatMode::Cumulative,
            STATS,
            "viewer",
            Duration::from_secs(5),
        );
        let mut stream = streamer.into_stream(cancel.clone(), CancellationToken::new());

        cancel.cancel();
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_interval_is_clamped() {
        let counter = EventCounter::new(SharedState::new());
        let start = |interval| {
            StatisticsStreamer::start(counter.clone(), StatMode::Cumulative, STATS, "v", interval)
        };

        assert_eq!(start(Duration::ZERO).interval(), MIN_INTERVAL);
        assert_eq!(start(Duration::from_secs(3)).interval(), Duration::from_secs(3));
        assert_eq!(start(Duration::from_secs(u64::MAX)).interval(), MAX_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_stream_ticks_at_the_cap() {
        let counter = EventCounter::new(SharedState::new());
        let streamer = StatisticsStreamer::start(
            counter.clone(),
            StatMode::Cumulative,
            STATS,
            "viewer",
            Duration::from_secs(u64::MAX),
        );
        let mut stream = streamer.into_stream(CancellationToken::new(), CancellationToken::new());

        counter.record(&Event::new("alice", CHECK, "h"));
        let before = Instant::now();
        let stat = stream.next().await.unwrap();
        assert_eq!(stat.by_method[CHECK], 1);
        let waited = Instant::now() - before;
        assert!(waited >= MAX_INTERVAL && waited < MAX_INTERVAL + Duration::from_secs(1));
    }
}
