//! Oracle Endpoint
//!
//! Validates a ScoreRequest, dispatches by mode (shadow-aware), signs the
//! validated score, and returns a SignedAttestation or a typed OracleError.
//!
//! A signing failure latches the oracle into a halted state: every later
//! request fails fast with `signing_unavailable`.
//!
//! ## Structure
//! - `types.rs` - ScoreRequest, ScoringMode, OracleConfig, OracleError

pub mod types;

#[cfg(test)]
mod tests;

pub use types::{OracleConfig, OracleError, ScoreRequest, ScoringMode};

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::watch;
use uuid::Uuid;

use crate::logic::attest::{AttestationSigner, SignedAttestation};
use crate::logic::features::{normalize_address, WalletFeatures};
use crate::logic::reasoning::{ReasoningBackend, ReasoningClient};
use crate::logic::repair::RepairLoop;
use crate::logic::schema::{SchemaValidator, ValidatedScore};
use crate::logic::shadow::{ShadowComparator, ShadowPolicy};
use crate::logic::synth::ScoreSynthesizer;
use crate::logic::telemetry::TelemetrySink;

pub struct ReputationOracle {
    synth: ScoreSynthesizer,
    shadow: ShadowComparator,
    signer: AttestationSigner,
    config: OracleConfig,
    halt: watch::Sender<bool>,
}

impl ReputationOracle {
    pub fn new(
        backend: Arc<dyn ReasoningBackend>,
        signer: AttestationSigner,
        sink: Arc<dyn TelemetrySink>,
        config: OracleConfig,
    ) -> Self {
        let repair = RepairLoop::new(
            ReasoningClient::new(backend),
            SchemaValidator::new(config.breakdown_tolerance),
            sink.clone(),
        )
        .with_budget_increment(config.truncation_budget_increment);
        let synth = ScoreSynthesizer::new(repair, config.synth);
        let shadow = ShadowComparator::new(synth.clone(), sink, config.shadow_policy);
        let (halt, _) = watch::channel(false);

        Self {
            synth,
            shadow,
            signer,
            config,
            halt,
        }
    }

    pub fn signer(&self) -> &AttestationSigner {
        &self.signer
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn is_halted(&self) -> bool {
        *self.halt.borrow()
    }

    /// Flips to `true` once, when the oracle halts
    pub fn halted(&self) -> watch::Receiver<bool> {
        self.halt.subscribe()
    }

    /// Score a wallet and attest the result.
    pub async fn score(&self, request: ScoreRequest) -> Result<SignedAttestation, OracleError> {
        if self.is_halted() {
            return Err(OracleError::SigningUnavailable(
                "oracle halted after a signing failure".to_string(),
            ));
        }

        let wallet_address = normalize_address(&request.wallet_address)
            .map_err(|e| OracleError::InvalidRequest(e.to_string()))?;
        let features = Arc::new(
            WalletFeatures::from_value(request.features)
                .map_err(|e| OracleError::InvalidRequest(e.to_string()))?,
        );
        let request_id = Uuid::new_v4();

        tracing::info!(%request_id, wallet = %wallet_address, mode = %request.mode, "score request");

        let score = self
            .dispatch(request_id, request.mode, &wallet_address, &features)
            .await
            .map_err(|e| {
                tracing::warn!(%request_id, "{}", e);
                e
            })?;

        let metadata = build_metadata(
            &score,
            self.config.include_features_in_metadata.then(|| features.as_ref()),
        );

        match self.signer.attest(&score, &wallet_address, Some(metadata)) {
            Ok(attestation) => {
                tracing::info!(
                    %request_id,
                    score = attestation.score,
                    risk_level = score.risk_level().as_str(),
                    timestamp_ms = attestation.timestamp_ms,
                    "score attested"
                );
                Ok(attestation)
            }
            Err(e) => {
                self.halt_scoring(request_id, &e.to_string());
                Err(OracleError::SigningUnavailable(e.to_string()))
            }
        }
    }

    async fn dispatch(
        &self,
        request_id: Uuid,
        mode: ScoringMode,
        wallet_address: &str,
        features: &Arc<WalletFeatures>,
    ) -> Result<ValidatedScore, OracleError> {
        let variant = mode.served_variant();
        let shadow_requested = mode == ScoringMode::Shadow;

        if shadow_requested && self.shadow.policy() == ShadowPolicy::Disabled {
            tracing::warn!(%request_id, "shadow mode disabled; scoring standard only");
        }

        if self.shadow.engages(shadow_requested, variant) {
            let outcome = self
                .shadow
                .compare(request_id, wallet_address.to_string(), features.clone())
                .await?;
            // the comparison join runs detached and records on its own
            return Ok(outcome.standard.score);
        }

        let outcome = self
            .synth
            .synthesize(request_id, wallet_address, features, variant)
            .await?;
        Ok(outcome.score)
    }

    fn halt_scoring(&self, request_id: Uuid, reason: &str) {
        let was_halted = self.halt.send_replace(true);
        if !was_halted {
            tracing::error!(%request_id, "signing failed, halting scoring: {}", reason);
        }
    }
}

/// Informational metadata returned next to the signed fields.
fn build_metadata(score: &ValidatedScore, features: Option<&WalletFeatures>) -> Value {
    let mut metadata = Map::new();
    metadata.insert("scoreBreakdown".to_string(), json!(score.breakdown()));
    if let Some(reasoning) = score.reasoning() {
        metadata.insert("reasoning".to_string(), json!(reasoning));
    }
    metadata.insert("risk_factors".to_string(), json!(score.risk_factors()));
    metadata.insert("strengths".to_string(), json!(score.strengths()));
    metadata.insert("risk_level".to_string(), json!(score.risk_level().as_str()));
    if let Some(steps) = score.intermediate_reasoning() {
        metadata.insert("intermediate_reasoning".to_string(), json!(steps));
    }
    if let Some(passed) = score.verification_passed() {
        metadata.insert("verification_passed".to_string(), json!(passed));
    }
    if let Some(features) = features {
        metadata.insert("features".to_string(), features.as_value().clone());
    }
    Value::Object(metadata)
}
