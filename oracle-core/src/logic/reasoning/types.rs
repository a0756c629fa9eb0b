//! Reasoning Types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logic::schema::PromptVariant;

/// Stop reasons that count as a terminating marker
const NATURAL_STOPS: &[&str] = &["stop", "end_turn", "stop_sequence", "eos"];

/// Stop reasons a backend uses to say it ran out of tokens
const LENGTH_STOPS: &[&str] = &["length", "max_tokens"];

// ============================================================================
// PROMPT
// ============================================================================

/// A fully rendered prompt: system instructions plus the user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

// ============================================================================
// BACKEND OUTPUT
// ============================================================================

/// What a backend returned for one call, before any budget checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    pub text: String,
    pub completion_tokens: u32,
    pub stop_reason: Option<String>,
}

impl RawCompletion {
    /// True when the backend reported a natural stop
    pub fn is_terminated(&self) -> bool {
        self.stop_reason
            .as_deref()
            .map(|r| NATURAL_STOPS.iter().any(|s| r.eq_ignore_ascii_case(s)))
            .unwrap_or(false)
    }

    /// True when the backend says it stopped on its token limit
    pub fn hit_length_limit(&self) -> bool {
        self.stop_reason
            .as_deref()
            .map(|r| LENGTH_STOPS.iter().any(|s| r.eq_ignore_ascii_case(s)))
            .unwrap_or(false)
    }

    /// Budget exhausted without a terminating marker, or a length stop
    /// whatever the reported token count
    pub fn is_truncated(&self, budget: u32) -> bool {
        self.hit_length_limit() || (self.completion_tokens >= budget && !self.is_terminated())
    }
}

/// Raw output of one successful reasoning call, tagged with its variant
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub variant: PromptVariant,
    pub latency: Duration,
    pub tokens_used: u32,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReasoningError {
    #[error("timeout: no response within {0:?}")]
    Timeout(Duration),

    #[error("backend_unreachable: {0}")]
    BackendUnreachable(String),

    #[error("truncated: {tokens_used} tokens reached the {budget}-token budget without a stop marker")]
    Truncated { tokens_used: u32, budget: u32 },

    #[error("bad_response: {0}")]
    BadResponse(String),
}

impl ReasoningError {
    /// Stable reason code
    pub fn kind(&self) -> &'static str {
        match self {
            ReasoningError::Timeout(_) => "timeout",
            ReasoningError::BackendUnreachable(_) => "backend_unreachable",
            ReasoningError::Truncated { .. } => "truncated",
            ReasoningError::BadResponse(_) => "bad_response",
        }
    }

    pub fn is_truncation(&self) -> bool {
        matches!(self, ReasoningError::Truncated { .. })
    }
}
