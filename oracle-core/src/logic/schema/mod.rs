//! Schema Validator
//!
//! Checks a candidate model response against the structured-score schema.
//! Pure: no I/O, no logging, no state carried between calls.
//!
//! ## Structure
//! - `types.rs` - ValidatedScore, breakdown dimensions, prompt variants
//! - `extract.rs` - Recover the JSON object from free-form model text
//! - `validate.rs` - Field, bound, tolerance and chain-of-thought rules

pub mod types;
pub mod extract;
pub mod validate;


pub use types::{
    Dimension,
    PromptVariant,
    ReasoningStep,
    RiskLevel,
    ScoreBreakdown,
    ValidatedScore,
};
pub use extract::extract_json;
pub use validate::SchemaValidator;

// ============================================================================
// ERRORS
// ============================================================================

/// Why a candidate response was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("malformed_json: {0}")]
    MalformedJson(String),

    #[error("missing_field({0})")]
    MissingField(String),

    #[error("out_of_range({field}, {value})")]
    OutOfRange { field: String, value: String },

    #[error("breakdown_sum_mismatch: breakdown mean {mean:.1} is more than {tolerance} points from score {score}")]
    BreakdownSumMismatch { score: u8, mean: f64, tolerance: u32 },

    #[error("wrong_intermediate_count: expected 5 steps, got {0}")]
    WrongIntermediateCount(usize),

    #[error("type_mismatch({0})")]
    TypeMismatch(String),

    #[error("uncovered_dimension({0}): each step must justify a different dimension")]
    UncoveredDimension(Dimension),
}

impl SchemaError {
    /// Stable reason code, used in telemetry and terminal failures
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaError::MalformedJson(_) => "malformed_json",
            SchemaError::MissingField(_) => "missing_field",
            SchemaError::OutOfRange { .. } => "out_of_range",
            SchemaError::BreakdownSumMismatch { .. } => "breakdown_sum_mismatch",
            SchemaError::WrongIntermediateCount(_) => "wrong_intermediate_count",
            SchemaError::TypeMismatch(_) => "type_mismatch",
            SchemaError::UncoveredDimension(_) => "uncovered_dimension",
        }
    }
}
