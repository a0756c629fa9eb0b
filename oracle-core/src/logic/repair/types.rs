//! Repair Loop Types

use std::time::Duration;

use crate::logic::reasoning::ReasoningError;
use crate::logic::schema::{PromptVariant, SchemaError, ValidatedScore};

// ============================================================================
// FAILURE CLASSES
// ============================================================================

/// Why an attempt failed; drives the next prompt strategy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FailureCause {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
}

impl FailureCause {
    /// Stable reason code (`malformed_json`, `truncated`, ...)
    pub fn kind(&self) -> &'static str {
        match self {
            FailureCause::Schema(e) => e.kind(),
            FailureCause::Reasoning(e) => e.kind(),
        }
    }

    pub fn is_truncation(&self) -> bool {
        matches!(self, FailureCause::Reasoning(e) if e.is_truncation())
    }

    /// Timeout, unreachable backend or unusable envelope: the model never
    /// saw or never answered the prompt
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureCause::Reasoning(e) if !e.is_truncation())
    }
}

/// Which prompt the next attempt uses
#[derive(Debug, Clone, Copy)]
pub enum PromptStage<'a> {
    /// First attempt
    Base,
    /// Second attempt: quote the violation back to the model
    Repair(&'a FailureCause),
    /// Final attempt: maximally explicit, example-bearing
    Strict(&'a FailureCause),
}

impl PromptStage<'_> {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStage::Base => "base",
            PromptStage::Repair(_) => "repair",
            PromptStage::Strict(_) => "strict",
        }
    }
}

// ============================================================================
// SETTINGS & RESULTS
// ============================================================================

/// Token budget and per-call deadline for one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSettings {
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// A validated score and how it was obtained
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub score: ValidatedScore,
    pub variant: PromptVariant,
    pub attempts: u8,
    /// Budget used by the successful attempt
    pub final_budget: u32,
    /// Wall time across all attempts
    pub elapsed: Duration,
}

/// All attempts exhausted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{variant} scoring failed after {attempts} attempts: {last_reason}")]
pub struct RepairFailure {
    pub variant: PromptVariant,
    pub attempts: u8,
    pub last_reason: FailureCause,
    pub elapsed: Duration,
}
