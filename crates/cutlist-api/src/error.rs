use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cutlist_core::OptimizerError;
use serde_json::json;
use std::time::Duration;
use tracing::error;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error("Optimization did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Request asks for {requested} cut-piece units, the limit is {limit}")]
    TooManyUnits { requested: u64, limit: u64 },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Optimizer(OptimizerError::DeadlineExceeded) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Optimizer(_) => StatusCode::BAD_REQUEST,
            AppError::TimedOut(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TooManyUnits { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self);

        (
            self.status(),
            Json(json!({
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
