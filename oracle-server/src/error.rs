//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use oracle_core::OracleError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// Typed failure from the scoring pipeline
    Oracle(OracleError),

    // Request shape errors caught before the oracle
    ValidationError(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Oracle(OracleError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            AppError::Oracle(OracleError::ScoringFailed { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Oracle(OracleError::SigningUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Oracle(e) => e.kind(),
            AppError::ValidationError(_) => "invalid_request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let error_message = match &self {
            AppError::Oracle(e @ OracleError::SigningUnavailable(_)) => {
                tracing::error!("Signing unavailable: {}", e);
                e.to_string()
            }
            AppError::Oracle(e) => e.to_string(),
            AppError::ValidationError(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<OracleError> for AppError {
    fn from(err: OracleError) -> Self {
        AppError::Oracle(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
