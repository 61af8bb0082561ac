//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::ValidationError;
use quiz_core::model::QuestionId;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session not found")]
    NotFound,
    #[error("session already completed")]
    AlreadyCompleted,
    #[error("question {0} already answered")]
    AlreadyAnswered(QuestionId),
    #[error("session is missing answers for {} question(s)", .missing.len())]
    Incomplete { missing: Vec<QuestionId> },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `MaintenanceService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MaintenanceError {
    #[error("retention must be positive")]
    InvalidRetention,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
