//! Validation rules for candidate score objects.

use serde_json::{Map, Value};

use super::types::{Dimension, PromptVariant, ReasoningStep, ScoreBreakdown, ValidatedScore};
use super::{extract_json, SchemaError};
use crate::constants::{DEFAULT_BREAKDOWN_TOLERANCE, DIMENSION_COUNT};

const SCORE_MAX: i64 = 100;

/// Stateless validator; the tolerance is the only knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaValidator {
    tolerance: u32,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(DEFAULT_BREAKDOWN_TOLERANCE)
    }
}

impl SchemaValidator {
    pub fn new(tolerance: u32) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Extract and validate a raw model response.
    pub fn validate_text(
        &self,
        text: &str,
        variant: PromptVariant,
    ) -> Result<ValidatedScore, SchemaError> {
        let candidate = extract_json(text)?;
        self.validate_value(&candidate, variant)
    }

    /// Validate an already-parsed candidate.
    ///
    /// Chain-of-thought fields emitted in standard mode are dropped, so a
    /// standard result never carries them.
    pub fn validate_value(
        &self,
        candidate: &Value,
        variant: PromptVariant,
    ) -> Result<ValidatedScore, SchemaError> {
        let obj = candidate
            .as_object()
            .ok_or_else(|| SchemaError::MalformedJson("top-level value is not an object".to_string()))?;

        let score = bounded_integer(required(obj, "score")?, "score")?;
        let breakdown = read_breakdown(required(obj, "breakdown")?)?;
        let risk_factors = string_list(required(obj, "risk_factors")?, "risk_factors")?;
        let strengths = string_list(required(obj, "strengths")?, "strengths")?;
        let reasoning = optional_text(obj, "reasoning")?;

        let mean = breakdown.mean();
        if (mean - f64::from(score)).abs() > f64::from(self.tolerance) {
            return Err(SchemaError::BreakdownSumMismatch {
                score,
                mean,
                tolerance: self.tolerance,
            });
        }

        let (intermediate_reasoning, verification_passed) = match variant {
            PromptVariant::Standard => (None, None),
            PromptVariant::ChainOfThought => {
                let steps = read_steps(required(obj, "intermediate_reasoning")?)?;
                let passed = required(obj, "verification_passed")?
                    .as_bool()
                    .ok_or_else(|| SchemaError::TypeMismatch("verification_passed".to_string()))?;
                (Some(steps), Some(passed))
            }
        };

        Ok(ValidatedScore {
            score,
            breakdown,
            risk_factors,
            strengths,
            reasoning,
            intermediate_reasoning,
            verification_passed,
        })
    }
}

// ============================================================================
// FIELD READERS
// ============================================================================

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, SchemaError> {
    obj.get(field)
        .ok_or_else(|| SchemaError::MissingField(field.to_string()))
}

/// Integer in 0..=100. `42.0` counts as an integer, `42.5` does not.
fn bounded_integer(value: &Value, field: &str) -> Result<u8, SchemaError> {
    let number = match value {
        Value::Number(n) => n,
        _ => return Err(SchemaError::TypeMismatch(field.to_string())),
    };

    let int = if let Some(i) = number.as_i64() {
        i
    } else {
        match number.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => f as i64,
            Some(f) if f.is_finite() && f.fract() == 0.0 => {
                return Err(SchemaError::OutOfRange {
                    field: field.to_string(),
                    value: number.to_string(),
                })
            }
            _ => return Err(SchemaError::TypeMismatch(field.to_string())),
        }
    };

    if !(0..=SCORE_MAX).contains(&int) {
        return Err(SchemaError::OutOfRange {
            field: field.to_string(),
            value: number.to_string(),
        });
    }
    Ok(int as u8)
}

fn read_breakdown(value: &Value) -> Result<ScoreBreakdown, SchemaError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::TypeMismatch("breakdown".to_string()))?;

    let mut breakdown = ScoreBreakdown {
        activity: 0,
        maturity: 0,
        diversity: 0,
        risk_behavior: 0,
        survey_match: 0,
    };

    for dimension in Dimension::ALL {
        let field = format!("breakdown.{}", dimension.as_str());
        let raw = obj
            .get(dimension.as_str())
            .or_else(|| {
                obj.iter()
                    .find(|(k, _)| Dimension::from_name(k) == Some(dimension))
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| SchemaError::MissingField(field.clone()))?;
        breakdown.set(dimension, bounded_integer(raw, &field)?);
    }

    Ok(breakdown)
}

/// Sequence of strings; `null` is a type mismatch, an empty array is fine.
fn string_list(value: &Value, field: &str) -> Result<Vec<String>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| SchemaError::TypeMismatch(field.to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| SchemaError::TypeMismatch(format!("{}[{}]", field, i)))
        })
        .collect()
}

fn optional_text(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::TypeMismatch(field.to_string())),
    }
}

fn read_steps(value: &Value) -> Result<Vec<ReasoningStep>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| SchemaError::TypeMismatch("intermediate_reasoning".to_string()))?;

    if items.len() != DIMENSION_COUNT {
        return Err(SchemaError::WrongIntermediateCount(items.len()));
    }

    let mut steps = Vec::with_capacity(DIMENSION_COUNT);
    for (i, item) in items.iter().enumerate() {
        let prefix = format!("intermediate_reasoning[{}]", i);
        let obj = item
            .as_object()
            .ok_or_else(|| SchemaError::TypeMismatch(prefix.clone()))?;

        let name = required(obj, "dimension")
            .map_err(|_| SchemaError::MissingField(format!("{}.dimension", prefix)))?
            .as_str()
            .ok_or_else(|| SchemaError::TypeMismatch(format!("{}.dimension", prefix)))?;
        let dimension = Dimension::from_name(name)
            .ok_or_else(|| SchemaError::TypeMismatch(format!("{}.dimension", prefix)))?;

        let analysis = required(obj, "analysis")
            .map_err(|_| SchemaError::MissingField(format!("{}.analysis", prefix)))?
            .as_str()
            .ok_or_else(|| SchemaError::TypeMismatch(format!("{}.analysis", prefix)))?
            .to_string();

        let sub_score = match obj.get("sub_score") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(bounded_integer(raw, &format!("{}.sub_score", prefix))?),
        };

        steps.push(ReasoningStep {
            dimension,
            analysis,
            sub_score,
        });
    }

    if let Some(uncovered) = Dimension::ALL
        .into_iter()
        .find(|d| !steps.iter().any(|s| s.dimension == *d))
    {
        return Err(SchemaError::UncoveredDimension(uncovered));
    }

    Ok(steps)
}
