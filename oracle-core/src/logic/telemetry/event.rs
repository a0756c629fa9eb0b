//! Telemetry Event Types
//!
//! Immutable, timestamped records handed to the observability sink.
//! They never feed back into scoring.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::logic::schema::{PromptVariant, RiskLevel, ValidatedScore};

// ============================================================================
// EVENT ENVELOPE
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// One reasoning attempt inside the repair loop
    RepairAttempt(AttemptRecord),
    /// Standard vs experimental outcome for one shadowed request
    Comparison(ComparisonRecord),
}

impl TelemetryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryEvent::RepairAttempt(_) => "repair_attempt",
            TelemetryEvent::Comparison(_) => "comparison",
        }
    }

    pub fn request_id(&self) -> Uuid {
        match self {
            TelemetryEvent::RepairAttempt(r) => r.request_id,
            TelemetryEvent::Comparison(r) => r.request_id,
        }
    }
}

// ============================================================================
// REPAIR ATTEMPTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted { score: u8 },
    Rejected { reason: String, detail: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub request_id: Uuid,
    pub variant: PromptVariant,
    pub attempt: u8,
    pub max_tokens: u32,
    pub latency_ms: u64,
    pub outcome: AttemptOutcome,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// SHADOW COMPARISON
// ============================================================================

/// Outcome of the experimental branch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExperimentalOutcome {
    Completed { result: ValidatedScore },
    Failed { reason: String, detail: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRecord {
    pub request_id: Uuid,
    pub wallet_address: String,
    /// SHA-256 of the feature bundle; the bundle itself is not logged
    pub features_digest: String,
    pub standard: ValidatedScore,
    pub standard_risk_level: RiskLevel,
    pub experimental: ExperimentalOutcome,
    /// experimental score minus standard score
    pub score_delta: Option<i16>,
    pub standard_latency_ms: u64,
    pub experimental_latency_ms: u64,
    /// The experimental model's own declared self-check
    pub verification_passed: Option<bool>,
    pub recorded_at: DateTime<Utc>,
}

impl ComparisonRecord {
    pub fn experimental_failed(&self) -> bool {
        matches!(self.experimental, ExperimentalOutcome::Failed { .. })
    }
}
