//! Scoring handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use oracle_core::SignedAttestation;
use validator::Validate;

use crate::models::ScoreBody;
use crate::{AppError, AppResult, AppState};

/// Score a wallet and return the signed attestation
pub async fn score(
    State(state): State<AppState>,
    payload: Result<Json<ScoreBody>, JsonRejection>,
) -> AppResult<Json<SignedAttestation>> {
    let Json(body) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;
    body.validate()?;

    let attestation = state.oracle.score(body.into()).await?;
    Ok(Json(attestation))
}
