//! Oracle endpoint tests

use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::logic::attest::{verify_attestation, EnclaveKey};
use crate::logic::reasoning::scripted::{ScriptedBackend, Step};
use crate::logic::reasoning::RubricBackend;
use crate::logic::telemetry::{ExperimentalOutcome, MemorySink, NullSink};

const ADDR: &str = "0x8589427373D6D84E98730D7795D8f6f8731FDA16";

fn rubric_oracle(config: OracleConfig) -> (ReputationOracle, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let oracle = ReputationOracle::new(
        Arc::new(RubricBackend::new()),
        AttestationSigner::new(EnclaveKey::ephemeral()),
        sink.clone(),
        config,
    );
    (oracle, sink)
}

fn request(features: serde_json::Value, mode: ScoringMode) -> ScoreRequest {
    ScoreRequest {
        wallet_address: ADDR.to_string(),
        features,
        mode,
    }
}

fn active_wallet() -> serde_json::Value {
    json!({
        "tx_count": 320,
        "wallet_age_days": 540,
        "token_count": 6,
        "defi_protocol_count": 2,
        "survey": { "match_score": 65 }
    })
}

#[tokio::test]
async fn test_minimal_wallet_scores_low() {
    let (oracle, _) = rubric_oracle(OracleConfig::default());
    let attestation = oracle
        .score(request(json!({ "tx_count": 0, "wallet_age_days": 2 }), ScoringMode::Standard))
        .await
        .unwrap();

    assert!(attestation.score <= 30);
    let metadata = attestation.metadata.as_ref().unwrap();
    assert!(!metadata["risk_factors"].as_array().unwrap().is_empty());
    assert!(metadata.get("intermediate_reasoning").is_none());
    assert_eq!(attestation.wallet_address, ADDR.to_lowercase());
    assert!(verify_attestation(&attestation).is_ok());
}

#[tokio::test]
async fn test_chain_of_thought_metadata() {
    let (oracle, _) = rubric_oracle(OracleConfig::default());
    let attestation = oracle
        .score(request(active_wallet(), ScoringMode::ChainOfThought))
        .await
        .unwrap();

    let metadata = attestation.metadata.unwrap();
    assert_eq!(metadata["intermediate_reasoning"].as_array().unwrap().len(), 5);
    assert!(metadata["verification_passed"].is_boolean());
    assert!(metadata["scoreBreakdown"]["riskBehavior"].is_u64());
}

#[tokio::test]
async fn test_features_echo_is_opt_in() {
    let (oracle, _) = rubric_oracle(OracleConfig::default());
    let attestation = oracle.score(request(active_wallet(), ScoringMode::Standard)).await.unwrap();
    assert!(attestation.metadata.unwrap().get("features").is_none());

    let (oracle, _) = rubric_oracle(OracleConfig {
        include_features_in_metadata: true,
        ..OracleConfig::default()
    });
    let attestation = oracle.score(request(active_wallet(), ScoringMode::Standard)).await.unwrap();
    assert_eq!(attestation.metadata.unwrap()["features"]["tx_count"], 320);
}

#[tokio::test]
async fn test_always_malformed_is_scoring_failed() {
    let backend = Arc::new(ScriptedBackend::always(Step::reply("I think this wallet is fine.")));
    let oracle = ReputationOracle::new(
        backend.clone(),
        AttestationSigner::new(EnclaveKey::ephemeral()),
        Arc::new(NullSink),
        OracleConfig::default(),
    );

    let err = oracle.score(request(active_wallet(), ScoringMode::Standard)).await.unwrap_err();

    assert_eq!(err.kind(), "scoring_failed");
    assert!(matches!(
        err,
        OracleError::ScoringFailed { reason: "malformed_json", attempts: 3, .. }
    ));
    assert_eq!(backend.calls().len(), 3);
    assert!(!oracle.is_halted());
}

#[tokio::test]
async fn test_invalid_requests() {
    let (oracle, _) = rubric_oracle(OracleConfig::default());

    let mut bad_address = request(active_wallet(), ScoringMode::Standard);
    bad_address.wallet_address = "0x1234".to_string();
    let err = oracle.score(bad_address).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_request");

    let err = oracle.score(request(json!({}), ScoringMode::Standard)).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_request");

    let err = oracle.score(request(json!([1, 2]), ScoringMode::Standard)).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_request");
}

#[tokio::test]
async fn test_signing_failure_halts_oracle() {
    let backend = Arc::new(ScriptedBackend::always(Step::reply(
        json!({
            "score": 50,
            "breakdown": { "activity": 50, "maturity": 50, "diversity": 50, "riskBehavior": 50, "surveyMatch": 50 },
            "risk_factors": [],
            "strengths": []
        })
        .to_string(),
    )));
    let signer = AttestationSigner::new(EnclaveKey::ephemeral());
    signer.seal();
    let oracle = ReputationOracle::new(backend.clone(), signer, Arc::new(NullSink), OracleConfig::default());
    let halted = oracle.halted();

    let err = oracle.score(request(active_wallet(), ScoringMode::Standard)).await.unwrap_err();
    assert_eq!(err.kind(), "signing_unavailable");
    assert!(oracle.is_halted());
    assert!(*halted.borrow());

    let err = oracle.score(request(active_wallet(), ScoringMode::Standard)).await.unwrap_err();
    assert_eq!(err.kind(), "signing_unavailable");
    assert_eq!(backend.calls().len(), 1);
}

async fn wait_for_comparison(sink: &MemorySink) {
    for _ in 0..200 {
        if !sink.comparisons().is_empty() {
            return;
        }
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_shadow_mode_serves_standard_and_records_comparison() {
    let (oracle, sink) = rubric_oracle(OracleConfig::default());
    let attestation = oracle.score(request(active_wallet(), ScoringMode::Shadow)).await.unwrap();

    assert!(attestation.metadata.as_ref().unwrap().get("intermediate_reasoning").is_none());

    wait_for_comparison(&sink).await;
    let records = sink.comparisons();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].standard.score(), attestation.score);
    assert_eq!(records[0].wallet_address, ADDR.to_lowercase());
    assert!(matches!(records[0].experimental, ExperimentalOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_disabled_shadow_degrades_to_standard() {
    let (oracle, sink) = rubric_oracle(OracleConfig {
        shadow_policy: ShadowPolicy::Disabled,
        ..OracleConfig::default()
    });
    oracle.score(request(active_wallet(), ScoringMode::Shadow)).await.unwrap();

    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert!(sink.comparisons().is_empty());
    assert_eq!(sink.attempts().len(), 1);
}

#[tokio::test]
async fn test_all_standard_policy_shadows_plain_requests() {
    let (oracle, sink) = rubric_oracle(OracleConfig {
        shadow_policy: ShadowPolicy::AllStandard,
        ..OracleConfig::default()
    });
    oracle.score(request(active_wallet(), ScoringMode::Standard)).await.unwrap();

    wait_for_comparison(&sink).await;
    assert_eq!(sink.comparisons().len(), 1);
}

#[test]
fn test_mode_wire_names() {
    let parsed: ScoreRequest = serde_json::from_value(json!({
        "wallet_address": ADDR,
        "features": { "tx_count": 1 }
    }))
    .unwrap();
    assert_eq!(parsed.mode, ScoringMode::Standard);

    let parsed: ScoringMode = serde_json::from_value(json!("chain_of_thought")).unwrap();
    assert_eq!(parsed, ScoringMode::ChainOfThought);
}
