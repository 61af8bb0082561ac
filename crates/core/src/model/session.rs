use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AnswerValue, Percentage, QuestionId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session already completed")]
    AlreadyCompleted,

    #[error("completed_at is before created_at")]
    InvalidTimeRange,

    #[error("completed session is missing its {0}")]
    MissingCompletionField(&'static str),

    #[error("incomplete session carries completion data")]
    UnexpectedCompletionData,
}

/// One quiz attempt.
///
/// Starts incomplete and moves to complete exactly once, fixing the overlap
/// percentage at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    completion: Option<Completion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Completion {
    overlap_percentage: Percentage,
    completed_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            completion: None,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` if the completion columns disagree with the
    /// `completed` flag or the timestamps are out of order.
    pub fn from_persisted(
        id: SessionId,
        created_at: DateTime<Utc>,
        completed: bool,
        overlap_percentage: Option<Percentage>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionStateError> {
        let completion = match (completed, overlap_percentage, completed_at) {
            (false, None, None) => None,
            (false, _, _) => return Err(SessionStateError::UnexpectedCompletionData),
            (true, None, _) => {
                return Err(SessionStateError::MissingCompletionField(
                    "overlap_percentage",
                ));
            }
            (true, _, None) => {
                return Err(SessionStateError::MissingCompletionField("completed_at"));
            }
            (true, Some(overlap_percentage), Some(completed_at)) => {
                if completed_at < created_at {
                    return Err(SessionStateError::InvalidTimeRange);
                }
                Some(Completion {
                    overlap_percentage,
                    completed_at,
                })
            }
        };

        Ok(Self {
            id,
            created_at,
            completion,
        })
    }

    /// Fix the overlap percentage and stamp the completion time.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::AlreadyCompleted` on a second call, and
    /// `SessionStateError::InvalidTimeRange` if `at` precedes creation.
    pub fn complete(
        &mut self,
        overlap_percentage: Percentage,
        at: DateTime<Utc>,
    ) -> Result<(), SessionStateError> {
        if self.completion.is_some() {
            return Err(SessionStateError::AlreadyCompleted);
        }
        if at < self.created_at {
            return Err(SessionStateError::InvalidTimeRange);
        }
        self.completion = Some(Completion {
            overlap_percentage,
            completed_at: at,
        });
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }

    #[must_use]
    pub fn overlap_percentage(&self) -> Option<Percentage> {
        self.completion.map(|c| c.overlap_percentage)
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.map(|c| c.completed_at)
    }
}

/// A single recorded answer. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub answer: AnswerValue,
    pub created_at: DateTime<Utc>,
}

impl Response {
    #[must_use]
    pub fn new(
        session_id: SessionId,
        question_id: QuestionId,
        answer: AnswerValue,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            question_id,
            answer,
            created_at,
        }
    }
}
