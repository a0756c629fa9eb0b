//! Attestation key and verification handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use oracle_core::logic::attest::{DOMAIN_TAG, ENCODING_VERSION};
use oracle_core::SignedAttestation;

use crate::models::{PublicKeyResponse, VerifyResponse};
use crate::{AppError, AppResult, AppState};

/// Enclave public key for registration with the verifying contract
pub async fn public_key(State(state): State<AppState>) -> Json<PublicKeyResponse> {
    let signer = state.oracle.signer();
    Json(PublicKeyResponse {
        public_key: signer.public_key_hex(),
        algorithm: "ed25519",
        encoding_version: ENCODING_VERSION,
        domain_tag: std::str::from_utf8(DOMAIN_TAG).unwrap_or("REPUTEv1"),
        available: signer.is_available(),
    })
}

/// Off-chain parity check: does this attestation verify under our key?
pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<SignedAttestation>, JsonRejection>,
) -> AppResult<Json<VerifyResponse>> {
    let Json(attestation) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let response = match state.oracle.signer().verify(&attestation) {
        Ok(()) => VerifyResponse { valid: true, reason: None },
        Err(e) => {
            tracing::debug!("Attestation rejected: {}", e);
            VerifyResponse {
                valid: false,
                reason: Some(e.to_string()),
            }
        }
    };

    Ok(Json(response))
}
