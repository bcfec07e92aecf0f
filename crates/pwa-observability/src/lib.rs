//! Observability infrastructure for the offline worker and push controller.
//!
//! This crate provides:
//! - `init_logging` - `tracing` subscriber setup (JSON or human output)
//! - `EventId` / `event_span` - Correlation of one worker event's log lines
//! - `OutcomeCounters` - In-process strategy outcome counters

mod event;
mod logging;
mod metrics;

pub use event::*;
pub use logging::*;
pub use metrics::*;
