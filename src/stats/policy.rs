//! Consumer identity -> statistics mode mapping

use std::collections::HashMap;

use super::streamer::StatMode;

/// Chooses the [`StatMode`] for a statistics subscriber
///
/// Consumers without an explicit entry get `default_mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatPolicy {
    modes: HashMap<String, StatMode>,
    default_mode: StatMode,
}

impl StatPolicy {
    /// A policy with no per-consumer entries
    pub fn new(default_mode: StatMode) -> Self {
        Self {
            modes: HashMap::new(),
            default_mode,
        }
    }

    /// Assign a mode to a consumer identity
    pub fn with_mode(mut self, consumer: impl Into<String>, mode: StatMode) -> Self {
        self.modes.insert(consumer.into(), mode);
        self
    }

    /// Build from lists of delta and self-excluding consumers
    pub fn from_lists<I, J>(delta: I, cumulative: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        let mut policy = Self::new(StatMode::Cumulative);
        for consumer in cumulative {
            policy = policy.with_mode(consumer, StatMode::CumulativeExcludingSelf);
        }
        for consumer in delta {
            policy = policy.with_mode(consumer, StatMode::Delta);
        }
        policy
    }

    pub fn mode_for(&self, consumer: &str) -> StatMode {
        self.modes.get(consumer).copied().unwrap_or(self.default_mode)
    }
}

impl Default for StatPolicy {
    fn default() -> Self {
        Self::new(StatMode::Cumulative)
            .with_mode("stat1", StatMode::Delta)
            .with_mode("stat2", StatMode::CumulativeExcludingSelf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = StatPolicy::default();
        assert_eq!(policy.mode_for("stat1"), StatMode::Delta);
        assert_eq!(policy.mode_for("stat2"), StatMode::CumulativeExcludingSelf);
        assert_eq!(policy.mode_for("someone"), StatMode::Cumulative);
    }

    #[test]
    fn test_from_lists_delta_wins_on_overlap() {
        let policy = StatPolicy::from_lists(
            vec!["a".to_string(), "both".to_string()],
            vec!["b".to_string(), "both".to_string()],
        );
        assert_eq!(policy.mode_for("a"), StatMode::Delta);
        assert_eq!(policy.mode_for("b"), StatMode::CumulativeExcludingSelf);
        assert_eq!(policy.mode_for("both"), StatMode::Delta);
        assert_eq!(policy.mode_for("stat1"), StatMode::Cumulative);
    }
}
