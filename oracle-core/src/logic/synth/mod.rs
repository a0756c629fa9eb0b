//! Score Synthesizer
//!
//! Binds a prompt variant (standard or chain-of-thought) to the repair loop,
//! with per-variant token budget and deadline.
//!
//! ## Structure
//! - `prompt.rs` - Base, repair and strict prompt templates

pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::constants;
use crate::logic::features::WalletFeatures;
use crate::logic::repair::{RepairFailure, RepairLoop, RepairOutcome, VariantSettings};
use crate::logic::schema::PromptVariant;

// ============================================================================
// CONFIG
// ============================================================================

/// Budgets and deadlines per variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthConfig {
    pub standard: VariantSettings,
    pub chain_of_thought: VariantSettings,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            standard: VariantSettings {
                max_tokens: constants::DEFAULT_STANDARD_TOKEN_BUDGET,
                timeout: Duration::from_secs(constants::DEFAULT_STANDARD_TIMEOUT_SECS),
            },
            chain_of_thought: VariantSettings {
                max_tokens: constants::DEFAULT_COT_TOKEN_BUDGET,
                timeout: Duration::from_secs(constants::DEFAULT_COT_TIMEOUT_SECS),
            },
        }
    }
}

impl SynthConfig {
    /// Read budgets and deadlines from the environment
    pub fn from_env() -> Self {
        Self {
            standard: VariantSettings {
                max_tokens: constants::get_standard_token_budget(),
                timeout: Duration::from_secs(constants::get_standard_timeout_secs()),
            },
            chain_of_thought: VariantSettings {
                max_tokens: constants::get_cot_token_budget(),
                timeout: Duration::from_secs(constants::get_cot_timeout_secs()),
            },
        }
    }

    pub fn settings(&self, variant: PromptVariant) -> VariantSettings {
        match variant {
            PromptVariant::Standard => self.standard,
            PromptVariant::ChainOfThought => self.chain_of_thought,
        }
    }
}

// ============================================================================
// SYNTHESIZER
// ============================================================================

/// Cheap to clone; the shadow comparator hands a clone to its
/// experimental task.
#[derive(Clone)]
pub struct ScoreSynthesizer {
    repair: RepairLoop,
    config: SynthConfig,
}

impl ScoreSynthesizer {
    pub fn new(repair: RepairLoop, config: SynthConfig) -> Self {
        Self { repair, config }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Run one variant to a validated score or a terminal failure.
    pub async fn synthesize(
        &self,
        request_id: Uuid,
        wallet_address: &str,
        features: &Arc<WalletFeatures>,
        variant: PromptVariant,
    ) -> Result<RepairOutcome, RepairFailure> {
        let settings = self.config.settings(variant);
        let features: &WalletFeatures = features;

        tracing::debug!(
            %request_id,
            %variant,
            max_tokens = settings.max_tokens,
            timeout_secs = settings.timeout.as_secs(),
            "synthesizing score"
        );

        self.repair
            .run(request_id, variant, settings, |stage| {
                prompt::render(variant, wallet_address, features, stage)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::reasoning::scripted::{ScriptedBackend, Step};
    use crate::logic::reasoning::{ReasoningClient, RubricBackend};
    use crate::logic::schema::SchemaValidator;
    use crate::logic::telemetry::{MemorySink, NullSink};
    use serde_json::json;

    const ADDR: &str = "0x00000000000000000000000000000000000000aa";

    fn features() -> Arc<WalletFeatures> {
        Arc::new(WalletFeatures::from_value(json!({ "tx_count": 150, "wallet_age_days": 400 })).unwrap())
    }

    #[tokio::test]
    async fn test_variant_budgets_reach_backend() {
        let backend = Arc::new(ScriptedBackend::always(Step::reply("not json")));
        let repair = RepairLoop::new(
            ReasoningClient::new(backend.clone()),
            SchemaValidator::default(),
            Arc::new(NullSink),
        );
        let synth = ScoreSynthesizer::new(repair, SynthConfig::default());

        let _ = synth
            .synthesize(Uuid::new_v4(), ADDR, &features(), PromptVariant::ChainOfThought)
            .await;
        let calls = backend.calls();
        assert_eq!(calls[0].max_tokens, constants::DEFAULT_COT_TOKEN_BUDGET);
        assert!(calls[0].user.contains(prompt::CONTRACT_CHAIN_OF_THOUGHT));
        assert!(calls[2].user.contains("final attempt"));
    }

    #[tokio::test]
    async fn test_rubric_synthesis_end_to_end() {
        let sink = Arc::new(MemorySink::default());
        let repair = RepairLoop::new(
            ReasoningClient::new(Arc::new(RubricBackend::new())),
            SchemaValidator::default(),
            sink.clone(),
        );
        let synth = ScoreSynthesizer::new(repair, SynthConfig::default());

        let outcome = synth
            .synthesize(Uuid::new_v4(), ADDR, &features(), PromptVariant::ChainOfThought)
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.score.intermediate_reasoning().map(|s| s.len()), Some(5));
        assert_eq!(sink.attempts().len(), 1);
    }
}
