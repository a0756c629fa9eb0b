//! Queued Sink
//!
//! Moves blocking sinks off the request path: `record` only enqueues, and a
//! blocking-pool task drains the queue into the inner sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::event::TelemetryEvent;
use super::sink::TelemetrySink;
use crate::constants::TELEMETRY_QUEUE_CAPACITY;

/// Bounded, non-blocking front for a blocking sink.
///
/// A full queue drops the event with a warning rather than stall scoring.
pub struct QueuedSink {
    tx: mpsc::Sender<TelemetryEvent>,
    dropped: AtomicU64,
}

impl QueuedSink {
    /// Start draining into `inner` with the default capacity.
    ///
    /// The returned handle resolves once every clone of the sink is dropped
    /// and the queue is empty. Must be called inside a tokio runtime.
    pub fn spawn(inner: Arc<dyn TelemetrySink>) -> (Self, JoinHandle<()>) {
        Self::with_capacity(inner, TELEMETRY_QUEUE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn TelemetrySink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));
        let drain = tokio::task::spawn_blocking(move || {
            while let Some(event) = rx.blocking_recv() {
                inner.record(event);
            }
            tracing::debug!("Telemetry queue drained");
        });

        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            drain,
        )
    }

    /// Events discarded because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for QueuedSink {
    fn record(&self, event: TelemetryEvent) {
        let event = match self.tx.try_send(event) {
            Ok(()) => return,
            Err(TrySendError::Full(event)) | Err(TrySendError::Closed(event)) => event,
        };
        self.dropped.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            request_id = %event.request_id(),
            "Telemetry queue unavailable, dropped {} event",
            event.as_str()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::schema::PromptVariant;
    use crate::logic::telemetry::event::{AttemptOutcome, AttemptRecord};
    use crate::logic::telemetry::MemorySink;
    use chrono::Utc;
    use uuid::Uuid;

    fn attempt(n: u8) -> TelemetryEvent {
        TelemetryEvent::RepairAttempt(AttemptRecord {
            request_id: Uuid::new_v4(),
            variant: PromptVariant::Standard,
            attempt: n,
            max_tokens: 800,
            latency_ms: 5,
            outcome: AttemptOutcome::Accepted { score: 40 },
            recorded_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_events_reach_inner_sink_in_order() {
        let inner = Arc::new(MemorySink::default());
        let (sink, drain) = QueuedSink::spawn(inner.clone());

        for n in 1..=3 {
            sink.record(attempt(n));
        }
        drop(sink);
        drain.await.unwrap();

        let attempts: Vec<u8> = inner.attempts().iter().map(|a| a.attempt).collect();
        assert_eq!(attempts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_record_does_not_wait_on_a_slow_sink() {
        struct Stalled(std::sync::Mutex<()>);
        impl TelemetrySink for Stalled {
            fn record(&self, _event: TelemetryEvent) {
                let _held = self.0.lock();
            }
        }

        let stalled = Arc::new(Stalled(std::sync::Mutex::new(())));
        let gate = stalled.0.lock().unwrap();
        let (sink, drain) = QueuedSink::with_capacity(stalled.clone(), 1);

        // the drainer blocks on the first event; the rest overflow the queue
        for n in 1..=10 {
            sink.record(attempt(n));
        }
        assert!(sink.dropped() >= 1);

        drop(gate);
        drop(sink);
        drain.await.unwrap();
    }
}
