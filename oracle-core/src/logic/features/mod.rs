//! Wallet Features
//!
//! The feature bundle is assembled by an external collaborator and is opaque
//! to the oracle: it is rendered into prompts, digested for telemetry, and
//! never mutated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"));

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("wallet features must be a JSON object")]
    NotAnObject,

    #[error("wallet features must not be empty")]
    Empty,

    #[error("invalid EVM address: {0}")]
    InvalidAddress(String),
}

// ============================================================================
// FEATURE BUNDLE
// ============================================================================

/// Immutable feature bundle for one wallet (activity metrics, survey answers,
/// derived risk signals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletFeatures(Value);

impl WalletFeatures {
    /// Wrap a JSON value; only non-empty objects are accepted.
    pub fn from_value(value: Value) -> Result<Self, FeatureError> {
        match &value {
            Value::Object(map) if map.is_empty() => Err(FeatureError::Empty),
            Value::Object(_) => Ok(Self(value)),
            _ => Err(FeatureError::NotAnObject),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a value by JSON pointer (e.g. `/activity/tx_count`).
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// First numeric value found among the candidate pointers.
    pub fn number(&self, candidates: &[&str]) -> Option<f64> {
        candidates
            .iter()
            .filter_map(|p| self.pointer(p))
            .find_map(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
    }

    /// First boolean value found among the candidate pointers.
    pub fn flag(&self, candidates: &[&str]) -> Option<bool> {
        candidates
            .iter()
            .filter_map(|p| self.pointer(p))
            .find_map(Value::as_bool)
    }

    /// Length of the first array found among the candidate pointers.
    pub fn count(&self, candidates: &[&str]) -> Option<usize> {
        candidates
            .iter()
            .filter_map(|p| self.pointer(p))
            .find_map(|v| v.as_array().map(Vec::len))
    }

    /// Stable JSON rendering used inside prompts.
    ///
    /// Object keys are ordered, so identical bundles render identically.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// SHA-256 hex digest of the compact rendering, for telemetry records
    /// that must not carry the raw bundle.
    pub fn digest(&self) -> String {
        let compact = serde_json::to_vec(&self.0).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&compact);
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// ADDRESSES
// ============================================================================

/// `0x` followed by 40 hex digits, any case.
pub fn is_evm_address(address: &str) -> bool {
    EVM_ADDRESS.is_match(address)
}

/// Lowercased `0x`-prefixed form, or `InvalidAddress`.
pub fn normalize_address(address: &str) -> Result<String, FeatureError> {
    let trimmed = address.trim();
    if !is_evm_address(trimmed) {
        return Err(FeatureError::InvalidAddress(trimmed.to_string()));
    }
    Ok(trimmed.to_lowercase())
}

/// Raw 20 address bytes.
pub fn decode_address(address: &str) -> Result<[u8; 20], FeatureError> {
    let normalized = normalize_address(address)?;
    let bytes = hex::decode(&normalized[2..])
        .map_err(|_| FeatureError::InvalidAddress(address.to_string()))?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDR: &str = "0x8589427373D6D84E98730D7795D8f6f8731FDA16";

    #[test]
    fn test_address_checks() {
        assert!(is_evm_address(ADDR));
        assert!(!is_evm_address("8589427373d6d84e98730d7795d8f6f8731fda16"));
        assert!(!is_evm_address("0x1234"));
        assert!(!is_evm_address("0xZZ89427373d6d84e98730d7795d8f6f8731fda16"));

        assert_eq!(
            normalize_address(ADDR).unwrap(),
            "0x8589427373d6d84e98730d7795d8f6f8731fda16"
        );
        let raw = decode_address(ADDR).unwrap();
        assert_eq!(raw[0], 0x85);
        assert_eq!(raw[19], 0x16);
    }

    #[test]
    fn test_rejects_non_object_bundles() {
        assert_eq!(
            WalletFeatures::from_value(json!([1, 2])).unwrap_err(),
            FeatureError::NotAnObject
        );
        assert_eq!(
            WalletFeatures::from_value(json!({})).unwrap_err(),
            FeatureError::Empty
        );
    }

    #[test]
    fn test_lookups_and_digest() {
        let features = WalletFeatures::from_value(json!({
            "activity": { "tx_count": 42, "wallet_age_days": "400" },
            "risk": { "mixer_usage": true },
            "holdings": { "chains": ["ethereum", "base"] }
        }))
        .unwrap();

        assert_eq!(features.number(&["/tx_count", "/activity/tx_count"]), Some(42.0));
        assert_eq!(features.number(&["/activity/wallet_age_days"]), Some(400.0));
        assert_eq!(features.flag(&["/risk/mixer_usage"]), Some(true));
        assert_eq!(features.count(&["/holdings/chains"]), Some(2));
        assert_eq!(features.number(&["/missing"]), None);

        let again = WalletFeatures::from_value(features.as_value().clone()).unwrap();
        assert_eq!(features.digest(), again.digest());
        assert_eq!(features.digest().len(), 64);
    }
}
