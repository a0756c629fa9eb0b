//! Schema Types
//!
//! Core types for the structured score.
//! No validation logic here - only data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// PROMPT VARIANT
// ============================================================================

/// Prompt variant that produced (or will produce) a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVariant {
    /// Direct score + breakdown, no rationale trace
    Standard,
    /// Five dimension steps followed by a self-verification
    ChainOfThought,
}

impl PromptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVariant::Standard => "standard",
            PromptVariant::ChainOfThought => "chain_of_thought",
        }
    }

    pub fn is_chain_of_thought(&self) -> bool {
        matches!(self, PromptVariant::ChainOfThought)
    }
}

impl std::fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Named breakdown dimensions, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "activity")]
    Activity,
    #[serde(rename = "maturity")]
    Maturity,
    #[serde(rename = "diversity")]
    Diversity,
    #[serde(rename = "riskBehavior")]
    RiskBehavior,
    #[serde(rename = "surveyMatch")]
    SurveyMatch,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Activity,
        Dimension::Maturity,
        Dimension::Diversity,
        Dimension::RiskBehavior,
        Dimension::SurveyMatch,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Activity => "activity",
            Dimension::Maturity => "maturity",
            Dimension::Diversity => "diversity",
            Dimension::RiskBehavior => "riskBehavior",
            Dimension::SurveyMatch => "surveyMatch",
        }
    }

    /// What a high sub-score means, used in prompts
    pub fn description(&self) -> &'static str {
        match self {
            Dimension::Activity => "volume and recency of on-chain transactions",
            Dimension::Maturity => "wallet age and sustained history",
            Dimension::Diversity => "breadth of assets, protocols and chains used",
            Dimension::RiskBehavior => "absence of mixers, scams and risky approvals (higher is safer)",
            Dimension::SurveyMatch => "consistency between survey answers and on-chain behavior",
        }
    }

    /// Lenient lookup: case-insensitive, ignores `_`, `-` and spaces,
    /// so `risk_behavior` and `RiskBehavior` both resolve.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().to_lowercase() == folded)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// BREAKDOWN
// ============================================================================

/// Per-dimension sub-scores, each in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub activity: u8,
    pub maturity: u8,
    pub diversity: u8,
    #[serde(rename = "riskBehavior")]
    pub risk_behavior: u8,
    #[serde(rename = "surveyMatch")]
    pub survey_match: u8,
}

impl ScoreBreakdown {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Activity => self.activity,
            Dimension::Maturity => self.maturity,
            Dimension::Diversity => self.diversity,
            Dimension::RiskBehavior => self.risk_behavior,
            Dimension::SurveyMatch => self.survey_match,
        }
    }

    pub(crate) fn set(&mut self, dimension: Dimension, value: u8) {
        match dimension {
            Dimension::Activity => self.activity = value,
            Dimension::Maturity => self.maturity = value,
            Dimension::Diversity => self.diversity = value,
            Dimension::RiskBehavior => self.risk_behavior = value,
            Dimension::SurveyMatch => self.survey_match = value,
        }
    }

    /// Arithmetic mean of the five dimensions
    pub fn mean(&self) -> f64 {
        let sum: u32 = Dimension::ALL.iter().map(|d| u32::from(self.get(*d))).sum();
        f64::from(sum) / Dimension::ALL.len() as f64
    }
}

// ============================================================================
// CHAIN-OF-THOUGHT STEP
// ============================================================================

/// One intermediate reasoning step, justifying a single dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub dimension: Dimension,
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_score: Option<u8>,
}

// ============================================================================
// RISK LEVEL
// ============================================================================

/// Coarse band over the 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => RiskLevel::VeryHigh,
            30..=49 => RiskLevel::High,
            50..=69 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryHigh => "very_high",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }
}

// ============================================================================
// VALIDATED SCORE
// ============================================================================

/// A schema-valid score. Only the validator constructs these, so every
/// instance satisfies the bounds and the variant's field rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedScore {
    pub(crate) score: u8,
    pub(crate) breakdown: ScoreBreakdown,
    pub(crate) risk_factors: Vec<String>,
    pub(crate) strengths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) intermediate_reasoning: Option<Vec<ReasoningStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) verification_passed: Option<bool>,
}

impl ValidatedScore {
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    pub fn risk_factors(&self) -> &[String] {
        &self.risk_factors
    }

    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    /// Present only for chain-of-thought results (always 5 steps)
    pub fn intermediate_reasoning(&self) -> Option<&[ReasoningStep]> {
        self.intermediate_reasoning.as_deref()
    }

    /// The model's own declared self-check (chain-of-thought only)
    pub fn verification_passed(&self) -> Option<bool> {
        self.verification_passed
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }
}
