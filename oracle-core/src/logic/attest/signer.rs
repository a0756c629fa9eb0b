//! Attestation signing and off-chain verification.

use std::sync::Arc;

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::canonical;
use super::clock::MonotonicClock;
use super::key::EnclaveKey;
use crate::logic::features::decode_address;
use crate::logic::schema::ValidatedScore;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("enclave signing key is unavailable")]
    KeyUnavailable,

    #[error("invalid attestation payload: {0}")]
    InvalidPayload(String),

    #[error("signature failure: {0}")]
    Signature(String),

    #[error("attestation does not verify: {0}")]
    Verification(String),
}

// ============================================================================
// SIGNED ATTESTATION
// ============================================================================

/// What the caller receives and relays on-chain.
///
/// `signature` and `public_key` are lowercase hex without `0x`;
/// `wallet_address` is lowercase with `0x`. `metadata` is informational and
/// not covered by the signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedAttestation {
    pub score: u8,
    pub wallet_address: String,
    pub signature: String,
    pub public_key: String,
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

// ============================================================================
// SIGNER
// ============================================================================

/// Signs validated scores with the enclave key.
#[derive(Debug, Clone)]
pub struct AttestationSigner {
    key: Arc<EnclaveKey>,
    clock: Arc<MonotonicClock>,
}

impl AttestationSigner {
    pub fn new(key: EnclaveKey) -> Self {
        Self {
            key: Arc::new(key),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    pub fn public_key_hex(&self) -> String {
        self.key.public_key_hex()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }

    pub fn is_available(&self) -> bool {
        !self.key.is_sealed()
    }

    /// Wipe the key; used on shutdown.
    pub fn seal(&self) {
        self.key.seal();
    }

    /// Attest a validated score for `wallet_address`.
    ///
    /// Only a `ValidatedScore` can be signed, so an unvalidated number never
    /// reaches the key.
    pub fn attest(
        &self,
        score: &ValidatedScore,
        wallet_address: &str,
        metadata: Option<Value>,
    ) -> Result<SignedAttestation, SigningError> {
        let address = decode_address(wallet_address)
            .map_err(|e| SigningError::InvalidPayload(e.to_string()))?;
        let timestamp_ms = self.clock.now_ms();
        let message = canonical::encode(score.score(), &address, timestamp_ms)?;

        let signature = self.key.sign(&message)?;

        // never release a signature the verifier would reject
        self.key
            .verifying_key()
            .verify_strict(&message, &signature)
            .map_err(|_| SigningError::Signature("self-verification failed".to_string()))?;

        Ok(SignedAttestation {
            score: score.score(),
            wallet_address: format!("0x{}", hex::encode(address)),
            signature: hex::encode(signature.to_bytes()),
            public_key: self.key.public_key_hex(),
            timestamp_ms,
            metadata,
        })
    }

    /// Verify an attestation and check it was signed by this oracle's key.
    pub fn verify(&self, attestation: &SignedAttestation) -> Result<(), SigningError> {
        if !attestation
            .public_key
            .trim_start_matches("0x")
            .eq_ignore_ascii_case(&self.key.public_key_hex())
        {
            return Err(SigningError::Verification("public key is not this oracle's".to_string()));
        }
        verify_attestation(attestation)
    }
}

/// Recompute the canonical bytes and check the signature under the
/// attestation's own public key.
pub fn verify_attestation(attestation: &SignedAttestation) -> Result<(), SigningError> {
    let public_key: [u8; 32] = decode_hex_array(&attestation.public_key, "public_key")?;
    let signature: [u8; 64] = decode_hex_array(&attestation.signature, "signature")?;
    let address = decode_address(&attestation.wallet_address)
        .map_err(|e| SigningError::Verification(e.to_string()))?;

    let verifying = VerifyingKey::from_bytes(&public_key)
        .map_err(|_| SigningError::Verification("public_key is not a valid Ed25519 point".to_string()))?;
    let message = canonical::encode(attestation.score, &address, attestation.timestamp_ms)
        .map_err(|e| SigningError::Verification(e.to_string()))?;

    verifying
        .verify_strict(&message, &Signature::from_bytes(&signature))
        .map_err(|_| SigningError::Verification("signature mismatch".to_string()))
}

fn decode_hex_array<const N: usize>(value: &str, field: &str) -> Result<[u8; N], SigningError> {
    let mut out = [0u8; N];
    let trimmed = value.trim();
    hex::decode_to_slice(trimmed.strip_prefix("0x").unwrap_or(trimmed), &mut out)
        .map_err(|_| SigningError::Verification(format!("{} must be {} bytes of hex", field, N)))?;
    Ok(out)
}
