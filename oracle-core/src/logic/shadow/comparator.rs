//! Fork-join comparator

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinError;
use tokio::time::Instant;
use uuid::Uuid;

use super::types::{AbortOnDrop, ShadowOutcome, ShadowPolicy};
use crate::logic::features::WalletFeatures;
use crate::logic::repair::{RepairFailure, RepairOutcome};
use crate::logic::schema::PromptVariant;
use crate::logic::synth::ScoreSynthesizer;
use crate::logic::telemetry::{ComparisonRecord, ExperimentalOutcome, TelemetryEvent, TelemetrySink};

type ExperimentalRun = (Result<RepairOutcome, RepairFailure>, Duration);

#[derive(Clone)]
pub struct ShadowComparator {
    synth: ScoreSynthesizer,
    sink: Arc<dyn TelemetrySink>,
    policy: ShadowPolicy,
}

impl ShadowComparator {
    pub fn new(synth: ScoreSynthesizer, sink: Arc<dyn TelemetrySink>, policy: ShadowPolicy) -> Self {
        Self { synth, sink, policy }
    }

    pub fn policy(&self) -> ShadowPolicy {
        self.policy
    }

    /// Whether a request runs the experimental branch.
    /// Chain-of-thought requests never do; they already are the experiment.
    pub fn engages(&self, shadow_requested: bool, variant: PromptVariant) -> bool {
        match self.policy {
            ShadowPolicy::Disabled => false,
            ShadowPolicy::OnRequest => shadow_requested,
            ShadowPolicy::AllStandard => shadow_requested || variant == PromptVariant::Standard,
        }
    }

    /// Run both variants; resolve as soon as the standard one does.
    ///
    /// If the standard variant fails the experimental task is aborted and
    /// no record is produced.
    pub async fn compare(
        &self,
        request_id: Uuid,
        wallet_address: String,
        features: Arc<WalletFeatures>,
    ) -> Result<ShadowOutcome, RepairFailure> {
        let experimental = {
            let synth = self.synth.clone();
            let wallet_address = wallet_address.clone();
            let features = features.clone();
            AbortOnDrop(tokio::spawn(async move {
                let started = Instant::now();
                let result = synth
                    .synthesize(request_id, &wallet_address, &features, PromptVariant::ChainOfThought)
                    .await;
                (result, started.elapsed())
            }))
        };

        let started = Instant::now();
        let standard = match self
            .synth
            .synthesize(request_id, &wallet_address, &features, PromptVariant::Standard)
            .await
        {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::warn!(%request_id, "standard variant failed; aborting experimental branch");
                return Err(failure);
            }
        };
        let standard_latency = started.elapsed();

        let sink = self.sink.clone();
        let baseline = standard.clone();
        let comparison = tokio::spawn(async move {
            let joined = experimental.join().await;
            let record = build_record(
                request_id,
                wallet_address,
                &features,
                baseline,
                standard_latency,
                joined,
            );
            sink.record(TelemetryEvent::Comparison(record));
        });

        Ok(ShadowOutcome { standard, comparison })
    }
}

fn build_record(
    request_id: Uuid,
    wallet_address: String,
    features: &WalletFeatures,
    standard: RepairOutcome,
    standard_latency: Duration,
    joined: Result<ExperimentalRun, JoinError>,
) -> ComparisonRecord {
    let (experimental, experimental_latency) = match joined {
        Ok((Ok(outcome), latency)) => (
            ExperimentalOutcome::Completed {
                result: outcome.score,
            },
            latency,
        ),
        Ok((Err(failure), latency)) => (
            ExperimentalOutcome::Failed {
                reason: failure.last_reason.kind().to_string(),
                detail: failure.to_string(),
            },
            latency,
        ),
        Err(e) => (
            ExperimentalOutcome::Failed {
                reason: if e.is_cancelled() { "cancelled" } else { "panicked" }.to_string(),
                detail: e.to_string(),
            },
            Duration::ZERO,
        ),
    };

    let (score_delta, verification_passed) = match &experimental {
        ExperimentalOutcome::Completed { result } => (
            Some(i16::from(result.score()) - i16::from(standard.score.score())),
            result.verification_passed(),
        ),
        ExperimentalOutcome::Failed { .. } => (None, None),
    };

    ComparisonRecord {
        request_id,
        wallet_address,
        features_digest: features.digest(),
        standard_risk_level: standard.score.risk_level(),
        standard: standard.score,
        experimental,
        score_delta,
        standard_latency_ms: standard_latency.as_millis() as u64,
        experimental_latency_ms: experimental_latency.as_millis() as u64,
        verification_passed,
        recorded_at: Utc::now(),
    }
}
