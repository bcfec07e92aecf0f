//! In-process outcome counters.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::Serialize;

/// Counters of strategy outcomes, keyed by `(strategy, outcome)` labels.
///
/// Owned by one single-threaded execution context; not shared across threads.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    counts: RefCell<BTreeMap<(&'static str, &'static str), u64>>,
}

impl OutcomeCounters {
    /// Create empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter.
    pub fn record(&self, strategy: &'static str, outcome: &'static str) {
        *self
            .counts
            .borrow_mut()
            .entry((strategy, outcome))
            .or_insert(0) += 1;
    }

    /// Current value of a counter.
    pub fn get(&self, strategy: &str, outcome: &str) -> u64 {
        self.counts
            .borrow()
            .iter()
            .find(|((s, o), _)| *s == strategy && *o == outcome)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.borrow().values().sum()
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut strategies: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for ((strategy, outcome), n) in self.counts.borrow().iter() {
            strategies
                .entry(strategy.to_string())
                .or_default()
                .insert(outcome.to_string(), *n);
        }
        MetricsSnapshot { strategies }
    }
}

/// Serializable counter snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// strategy -> outcome -> count
    pub strategies: BTreeMap<String, BTreeMap<String, u64>>,
}

impl MetricsSnapshot {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
