//! Score request body

use oracle_core::logic::features::is_evm_address;
use oracle_core::{ScoreRequest, ScoringMode};
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

/// `POST /api/v1/score` body
#[derive(Debug, Deserialize, Validate)]
pub struct ScoreBody {
    #[validate(custom(function = "validate_wallet_address"))]
    pub wallet_address: String,

    /// Opaque feature bundle assembled upstream
    pub features: Value,

    #[serde(default)]
    pub mode: ScoringMode,
}

impl From<ScoreBody> for ScoreRequest {
    fn from(body: ScoreBody) -> Self {
        ScoreRequest {
            wallet_address: body.wallet_address,
            features: body.features,
            mode: body.mode,
        }
    }
}

fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    if is_evm_address(address.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("evm_address");
        err.message = Some("wallet_address must be 0x followed by 40 hex digits".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_address_validation() {
        let body: ScoreBody = serde_json::from_value(json!({
            "wallet_address": "0x8589427373D6D84E98730D7795D8f6f8731FDA16",
            "features": { "tx_count": 3 }
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.mode, ScoringMode::Standard);

        let body: ScoreBody = serde_json::from_value(json!({
            "wallet_address": "vitalik.eth",
            "features": { "tx_count": 3 },
            "mode": "shadow"
        }))
        .unwrap();
        assert!(body.validate().is_err());
    }
}
