//! Oracle Endpoint Types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants;
use crate::logic::repair::RepairFailure;
use crate::logic::schema::PromptVariant;
use crate::logic::shadow::ShadowPolicy;
use crate::logic::synth::SynthConfig;

// ============================================================================
// REQUEST
// ============================================================================

/// Which scoring path a request takes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    #[default]
    Standard,
    ChainOfThought,
    /// Standard result returned; chain-of-thought run alongside for comparison
    Shadow,
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::Standard => "standard",
            ScoringMode::ChainOfThought => "chain_of_thought",
            ScoringMode::Shadow => "shadow",
        }
    }

    /// Variant whose result the caller receives
    pub fn served_variant(&self) -> PromptVariant {
        match self {
            ScoringMode::ChainOfThought => PromptVariant::ChainOfThought,
            ScoringMode::Standard | ScoringMode::Shadow => PromptVariant::Standard,
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scoring call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub wallet_address: String,
    /// Opaque feature bundle; must be a non-empty JSON object
    pub features: Value,
    #[serde(default)]
    pub mode: ScoringMode,
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleConfig {
    pub synth: SynthConfig,
    pub breakdown_tolerance: u32,
    pub truncation_budget_increment: u32,
    pub shadow_policy: ShadowPolicy,
    /// Echo the feature bundle back in response metadata
    pub include_features_in_metadata: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            synth: SynthConfig::default(),
            breakdown_tolerance: constants::DEFAULT_BREAKDOWN_TOLERANCE,
            truncation_budget_increment: constants::DEFAULT_TRUNCATION_BUDGET_INCREMENT,
            shadow_policy: ShadowPolicy::default(),
            include_features_in_metadata: false,
        }
    }
}

impl OracleConfig {
    /// Budgets, tolerance and flags from the environment
    pub fn from_env() -> Self {
        Self {
            synth: SynthConfig::from_env(),
            breakdown_tolerance: constants::get_breakdown_tolerance(),
            truncation_budget_increment: constants::get_truncation_budget_increment(),
            shadow_policy: std::env::var("SHADOW_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            include_features_in_metadata: constants::is_flag_enabled("INCLUDE_FEATURES_IN_METADATA", false),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Typed endpoint failure. Distinguishes "the model could not produce a
/// valid score" from "the signer could not attest it".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("scoring failed ({reason}) after {attempts} attempts")]
    ScoringFailed { reason: &'static str, attempts: u8, detail: String },

    #[error("signing unavailable: {0}")]
    SigningUnavailable(String),
}

impl OracleError {
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::InvalidRequest(_) => "invalid_request",
            OracleError::ScoringFailed { .. } => "scoring_failed",
            OracleError::SigningUnavailable(_) => "signing_unavailable",
        }
    }
}

impl From<RepairFailure> for OracleError {
    fn from(failure: RepairFailure) -> Self {
        OracleError::ScoringFailed {
            reason: failure.last_reason.kind(),
            attempts: failure.attempts,
            detail: failure.last_reason.to_string(),
        }
    }
}
