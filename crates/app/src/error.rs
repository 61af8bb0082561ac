use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quiz_core::ValidationError;
use serde_json::json;
use services::{MaintenanceError, QuizError, StatsError};
use storage::repository::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("Unauthorized. Admin access required.")]
    Unauthorized,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::MalformedBody(_)
            | ApiError::Quiz(QuizError::Validation(_) | QuizError::Incomplete { .. })
            | ApiError::Maintenance(
                MaintenanceError::Validation(_) | MaintenanceError::InvalidRetention,
            ) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Quiz(QuizError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Quiz(QuizError::AlreadyCompleted | QuizError::AlreadyAnswered(_)) => {
                StatusCode::CONFLICT
            }
            _ => match self.storage() {
                Some(StorageError::NotFound) => StatusCode::NOT_FOUND,
                Some(err) if !err.is_unavailable() => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn storage(&self) -> Option<&StorageError> {
        match self {
            ApiError::Quiz(QuizError::Storage(e))
            | ApiError::Stats(StatsError::Storage(e))
            | ApiError::Maintenance(MaintenanceError::Storage(e)) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            match self.storage() {
                Some(err) => tracing::error!(error = %err, "storage failure"),
                None => tracing::error!(error = %self, "unhandled error"),
            }
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
