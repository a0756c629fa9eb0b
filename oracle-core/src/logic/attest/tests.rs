//! Attestation tests

use serde_json::json;

use super::*;
use crate::logic::schema::{PromptVariant, SchemaValidator, ValidatedScore};

const ADDR: &str = "0x8589427373D6D84E98730D7795D8f6f8731FDA16";

fn validated(score: u8) -> ValidatedScore {
    SchemaValidator::default()
        .validate_value(
            &json!({
                "score": score,
                "breakdown": {
                    "activity": score,
                    "maturity": score,
                    "diversity": score,
                    "riskBehavior": score,
                    "surveyMatch": score
                },
                "risk_factors": [],
                "strengths": []
            }),
            PromptVariant::Standard,
        )
        .unwrap()
}

fn signer() -> AttestationSigner {
    AttestationSigner::new(EnclaveKey::ephemeral())
}

#[test]
fn test_attestation_verifies() {
    let signer = signer();
    let attestation = signer.attest(&validated(62), ADDR, None).unwrap();

    assert_eq!(attestation.score, 62);
    assert_eq!(attestation.wallet_address, ADDR.to_lowercase());
    assert_eq!(attestation.signature.len(), 128);
    assert_eq!(attestation.public_key, signer.public_key_hex());
    assert!(!attestation.signature.starts_with("0x"));

    assert!(verify_attestation(&attestation).is_ok());
    assert!(signer.verify(&attestation).is_ok());
}

#[test]
fn test_tampering_breaks_verification() {
    let signer = signer();
    let original = signer.attest(&validated(62), ADDR, None).unwrap();

    let mut tampered = original.clone();
    tampered.score = 63;
    assert!(verify_attestation(&tampered).is_err());

    let mut tampered = original.clone();
    tampered.wallet_address = "0x8589427373d6d84e98730d7795d8f6f8731fda17".to_string();
    assert!(verify_attestation(&tampered).is_err());

    let mut tampered = original.clone();
    tampered.timestamp_ms += 1;
    assert!(verify_attestation(&tampered).is_err());

    let mut tampered = original.clone();
    let flipped = if tampered.signature.starts_with('0') { "1" } else { "0" };
    tampered.signature.replace_range(0..1, flipped);
    assert!(verify_attestation(&tampered).is_err());

    let mut tampered = original;
    tampered.public_key = signer_public_key_of_other();
    assert!(verify_attestation(&tampered).is_err());
}

fn signer_public_key_of_other() -> String {
    AttestationSigner::new(EnclaveKey::ephemeral()).public_key_hex()
}

#[test]
fn test_metadata_is_not_signed() {
    let signer = signer();
    let mut attestation = signer
        .attest(&validated(40), ADDR, Some(json!({ "reasoning": "thin history" })))
        .unwrap();
    attestation.metadata = Some(json!({ "reasoning": "edited" }));
    assert!(verify_attestation(&attestation).is_ok());
}

#[test]
fn test_foreign_key_rejected_by_signer() {
    let ours = signer();
    let theirs = signer();
    let attestation = theirs.attest(&validated(50), ADDR, None).unwrap();

    assert!(verify_attestation(&attestation).is_ok());
    assert!(matches!(ours.verify(&attestation), Err(SigningError::Verification(_))));
}

#[test]
fn test_timestamps_never_decrease() {
    let signer = signer();
    let mut last = 0;
    for _ in 0..50 {
        let attestation = signer.attest(&validated(50), ADDR, None).unwrap();
        assert!(attestation.timestamp_ms >= last);
        last = attestation.timestamp_ms;
    }
}

#[test]
fn test_sealed_signer_is_unavailable() {
    let signer = signer();
    signer.seal();
    assert!(!signer.is_available());
    assert_eq!(
        signer.attest(&validated(50), ADDR, None).unwrap_err(),
        SigningError::KeyUnavailable
    );
}

#[test]
fn test_invalid_address_is_rejected() {
    let err = signer().attest(&validated(50), "0x1234", None).unwrap_err();
    assert!(matches!(err, SigningError::InvalidPayload(_)));
}

#[test]
fn test_wire_shape() {
    let attestation = signer().attest(&validated(70), ADDR, None).unwrap();
    let wire = serde_json::to_value(&attestation).unwrap();
    for field in ["score", "wallet_address", "signature", "public_key", "timestamp_ms"] {
        assert!(wire.get(field).is_some(), "missing {}", field);
    }
    assert!(wire.get("metadata").is_none());
}
