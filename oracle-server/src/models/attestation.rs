//! Attestation endpoint models

use serde::Serialize;

/// `GET /api/v1/attestation/public-key`
#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    pub public_key: String,
    pub algorithm: &'static str,
    pub encoding_version: u8,
    pub domain_tag: &'static str,
    /// False once the key has been sealed
    pub available: bool,
}

/// `POST /api/v1/attestation/verify`
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
