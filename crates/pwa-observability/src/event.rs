//! Worker event correlation.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EVENT: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of one dispatched worker event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId(String);

impl EventId {
    /// Allocate the next id for an event kind (e.g. `fetch-17`).
    pub fn next(kind: &str) -> Self {
        let n = NEXT_EVENT.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{}", kind, n))
    }

    /// Get the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span wrapping every log line emitted while handling one event.
pub fn event_span(kind: &'static str, id: &EventId) -> tracing::Span {
    tracing::info_span!("worker_event", kind, id = %id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_prefixed() {
        let a = EventId::next("fetch");
        let b = EventId::next("fetch");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("fetch-"));
    }
}
