//! Repair Loop Engine
//!
//! Turns an unreliable reasoning client into a bounded-attempt guarantee of
//! either a ValidatedScore or a terminal failure. Never falls back to a
//! default score.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use super::types::{FailureCause, PromptStage, RepairFailure, RepairOutcome, VariantSettings};
use crate::constants::{DEFAULT_TRUNCATION_BUDGET_INCREMENT, MAX_REPAIR_ATTEMPTS};
use crate::logic::reasoning::{ReasoningClient, RenderedPrompt};
use crate::logic::schema::{PromptVariant, SchemaValidator, ValidatedScore};
use crate::logic::telemetry::{AttemptOutcome, AttemptRecord, TelemetryEvent, TelemetrySink};

#[derive(Clone)]
pub struct RepairLoop {
    client: ReasoningClient,
    validator: SchemaValidator,
    budget_increment: u32,
    sink: Arc<dyn TelemetrySink>,
}

impl RepairLoop {
    pub fn new(
        client: ReasoningClient,
        validator: SchemaValidator,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            client,
            validator,
            budget_increment: DEFAULT_TRUNCATION_BUDGET_INCREMENT,
            sink,
        }
    }

    pub fn with_budget_increment(mut self, increment: u32) -> Self {
        self.budget_increment = increment;
        self
    }

    /// Run up to `MAX_REPAIR_ATTEMPTS` attempts.
    ///
    /// Attempts are sequential; the only state carried forward is the
    /// previous failure (for the prompt) and the token budget (raised after a
    /// truncation).
    pub async fn run<F>(
        &self,
        request_id: Uuid,
        variant: PromptVariant,
        settings: VariantSettings,
        render: F,
    ) -> Result<RepairOutcome, RepairFailure>
    where
        F: Fn(PromptStage<'_>) -> RenderedPrompt,
    {
        let started = Instant::now();
        let mut budget = settings.max_tokens;
        let mut previous: Option<FailureCause> = None;
        // transport failures never replace the last answer the model got wrong
        let mut last_rejection: Option<FailureCause> = None;
        let mut attempt: u8 = 1;

        loop {
            let stage = match previous.as_ref() {
                None => PromptStage::Base,
                Some(cause) if attempt >= MAX_REPAIR_ATTEMPTS => {
                    PromptStage::Strict(last_rejection.as_ref().unwrap_or(cause))
                }
                Some(cause) => PromptStage::Repair(cause),
            };
            let stage_label = stage.as_str();
            let prompt = render(stage);

            let attempt_started = Instant::now();
            let result = self.attempt(&prompt, variant, budget, settings).await;
            let latency_ms = attempt_started.elapsed().as_millis() as u64;

            self.sink.record(TelemetryEvent::RepairAttempt(AttemptRecord {
                request_id,
                variant,
                attempt,
                max_tokens: budget,
                latency_ms,
                outcome: match &result {
                    Ok(score) => AttemptOutcome::Accepted { score: score.score() },
                    Err(cause) => AttemptOutcome::Rejected {
                        reason: cause.kind().to_string(),
                        detail: cause.to_string(),
                    },
                },
                recorded_at: Utc::now(),
            }));

            match result {
                Ok(score) => {
                    tracing::debug!(
                        %request_id,
                        %variant,
                        attempt,
                        stage = stage_label,
                        score = score.score(),
                        "attempt accepted"
                    );
                    return Ok(RepairOutcome {
                        score,
                        variant,
                        attempts: attempt,
                        final_budget: budget,
                        elapsed: started.elapsed(),
                    });
                }
                Err(cause) => {
                    tracing::warn!(
                        %request_id,
                        %variant,
                        attempt,
                        stage = stage_label,
                        reason = cause.kind(),
                        "attempt rejected: {}",
                        cause
                    );

                    if attempt >= MAX_REPAIR_ATTEMPTS {
                        return Err(RepairFailure {
                            variant,
                            attempts: attempt,
                            last_reason: cause,
                            elapsed: started.elapsed(),
                        });
                    }

                    if cause.is_truncation() {
                        budget = budget.saturating_add(self.budget_increment);
                    }
                    if !cause.is_transient() {
                        last_rejection = Some(cause.clone());
                    }
                    previous = Some(cause);
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        prompt: &RenderedPrompt,
        variant: PromptVariant,
        budget: u32,
        settings: VariantSettings,
    ) -> Result<ValidatedScore, FailureCause> {
        let response = self
            .client
            .invoke(prompt, variant, budget, settings.timeout)
            .await?;
        Ok(self.validator.validate_text(&response.text, response.variant)?)
    }
}
