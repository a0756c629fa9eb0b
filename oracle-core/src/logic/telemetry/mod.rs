//! Telemetry Module
//!
//! Per-attempt repair telemetry and shadow ComparisonRecords.
//! Sinks observe scoring; they never steer it.
//!
//! ## Structure
//! - `event.rs` - AttemptRecord, ComparisonRecord (immutable, timestamped)
//! - `sink.rs` - TelemetrySink trait, tracing and null sinks
//! - `recorder.rs` - Append-only JSONL writer with rotation
//! - `queue.rs` - Bounded queue that drains a blocking sink off the request path

pub mod event;
pub mod sink;
pub mod recorder;
pub mod queue;

pub use event::{
    AttemptOutcome,
    AttemptRecord,
    ComparisonRecord,
    ExperimentalOutcome,
    TelemetryEvent,
};
pub use sink::{NullSink, TelemetrySink, TracingSink};
pub use recorder::{list_log_files, read_events, JsonlRecorder};
pub use queue::QueuedSink;

#[cfg(test)]
pub(crate) use sink::MemorySink;
