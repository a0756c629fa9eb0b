//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    public_key: String,
    reasoning_backend: &'static str,
    scoring_halted: bool,
}

/// 503 once the oracle has halted, so load balancers drain it
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let halted = state.oracle.is_halted();
    let status = if halted {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(HealthResponse {
            status: if halted { "halted" } else { "healthy" },
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().timestamp(),
            public_key: state.oracle.signer().public_key_hex(),
            reasoning_backend: state.config.reasoning_backend.as_str(),
            scoring_halted: halted,
        }),
    )
}
