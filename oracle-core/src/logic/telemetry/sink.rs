//! Observability sinks.

use super::event::TelemetryEvent;

/// Receives telemetry; has no way to influence scoring.
///
/// Called from async contexts, so implementations must not block for long.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Emits each event as a structured tracing line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::RepairAttempt(r) => tracing::debug!(
                request_id = %r.request_id,
                variant = %r.variant,
                attempt = r.attempt,
                max_tokens = r.max_tokens,
                latency_ms = r.latency_ms,
                outcome = ?r.outcome,
                "repair attempt"
            ),
            TelemetryEvent::Comparison(r) => tracing::info!(
                request_id = %r.request_id,
                standard_score = r.standard.score(),
                score_delta = ?r.score_delta,
                experimental_failed = r.experimental_failed(),
                verification_passed = ?r.verification_passed,
                standard_latency_ms = r.standard_latency_ms,
                experimental_latency_ms = r.experimental_latency_ms,
                "shadow comparison"
            ),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Keeps events in memory for assertions.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySink {
    events: parking_lot::Mutex<Vec<TelemetryEvent>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn comparisons(&self) -> Vec<super::event::ComparisonRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TelemetryEvent::Comparison(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn attempts(&self) -> Vec<super::event::AttemptRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TelemetryEvent::RepairAttempt(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl TelemetrySink for MemorySink {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }
}
