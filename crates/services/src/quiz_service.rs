use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::ValidationError;
use quiz_core::model::{
    AnswerValue, Answers, Percentage, PublicQuestion, QuestionBank, QuestionId, Response,
    SessionId,
};
use quiz_core::scoring::compute_alignment;
use serde::Serialize;
use storage::repository::{ResponseRepository, SessionRepository, StorageError};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::QuizError;

/// Result of a one-shot submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub session_id: SessionId,
    pub overlap_percentage: Percentage,
}

/// Everything known about one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResults {
    pub session_id: SessionId,
    pub overlap_percentage: Percentage,
    pub completed: bool,
    pub responses: BTreeMap<QuestionId, AnswerValue>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Runs quiz attempts: one-shot submission, the per-question flow, and result lookup.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    sessions: Arc<dyn SessionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        sessions: Arc<dyn SessionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            clock,
            bank,
            sessions,
            responses,
        }
    }

    /// Questions as shown to participants, without reference answers.
    #[must_use]
    pub fn questions(&self) -> Vec<PublicQuestion> {
        self.bank.public_questions()
    }

    /// Validate a raw `{questionId: answer}` object, store it as a new completed
    /// session, and return the session id with its percentage.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` for malformed input before anything is stored.
    /// Returns `QuizError::Storage` if persistence fails.
    pub async fn submit(&self, raw_answers: &serde_json::Value) -> Result<SubmitOutcome, QuizError> {
        let answers = Answers::from_json(raw_answers, &self.bank)?;
        let session_id = SessionId::generate();
        let now = self.clock.now();

        self.sessions.create_session(&session_id, now).await?;
        for (question, answer) in answers.iter() {
            self.responses
                .record_answer(&session_id, question, answer, now)
                .await?;
        }

        let overlap_percentage = compute_alignment(&self.bank, &answers);
        self.sessions
            .complete_session(&session_id, overlap_percentage, now)
            .await?;

        info!(
            session = %session_id,
            answered = answers.len(),
            percentage = overlap_percentage.value(),
            "quiz submitted"
        );
        Ok(SubmitOutcome {
            session_id,
            overlap_percentage,
        })
    }

    /// Open an empty session for answering question by question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the session cannot be stored.
    pub async fn start_session(&self) -> Result<SessionId, QuizError> {
        let session_id = SessionId::generate();
        self.sessions
            .create_session(&session_id, self.clock.now())
            .await?;
        debug!(session = %session_id, "session started");
        Ok(session_id)
    }

    /// Record a single answer on an open session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` for an unknown question or out-of-range value,
    /// `QuizError::NotFound` for an unknown session, `QuizError::AlreadyCompleted`
    /// once the session is closed, and `QuizError::AlreadyAnswered` if the question
    /// already has an answer.
    pub async fn answer(
        &self,
        session_id: &SessionId,
        question: QuestionId,
        value: i64,
    ) -> Result<(), QuizError> {
        if !self.bank.contains(question) {
            return Err(ValidationError::UnknownQuestion(i64::from(question.value())).into());
        }
        let answer = AnswerValue::new(question, value)?;

        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(QuizError::NotFound)?;
        if session.is_completed() {
            return Err(QuizError::AlreadyCompleted);
        }

        self.responses
            .record_answer(session_id, question, answer, self.clock.now())
            .await
            .map_err(|e| match e {
                StorageError::NotFound => QuizError::NotFound,
                StorageError::Conflict => QuizError::AlreadyAnswered(question),
                other => QuizError::Storage(other),
            })
    }

    /// Score the stored answers and close the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Incomplete` unless every question is answered,
    /// `QuizError::NotFound` for an unknown session, and
    /// `QuizError::AlreadyCompleted` if the session was already closed.
    pub async fn complete(&self, session_id: &SessionId) -> Result<Percentage, QuizError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(QuizError::NotFound)?;
        if session.is_completed() {
            return Err(QuizError::AlreadyCompleted);
        }

        let answers = to_answers(self.responses.get_answers(session_id).await?);
        let missing: Vec<QuestionId> = self
            .bank
            .ids()
            .filter(|id| answers.get(*id).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(QuizError::Incomplete { missing });
        }

        let overlap_percentage = compute_alignment(&self.bank, &answers);
        // A wall clock that stepped back since `start_session` must not
        // produce a completion earlier than the session itself.
        let now = self.clock.now();
        if now < session.created_at() {
            warn!(session = %session_id, "clock is behind session creation");
        }
        let completed_at = now.max(session.created_at());
        self.sessions
            .complete_session(session_id, overlap_percentage, completed_at)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => QuizError::NotFound,
                StorageError::Conflict => QuizError::AlreadyCompleted,
                other => QuizError::Storage(other),
            })?;

        info!(
            session = %session_id,
            percentage = overlap_percentage.value(),
            "session completed"
        );
        Ok(overlap_percentage)
    }

    /// Look up a session with its answers.
    ///
    /// A completed session reports its stored percentage; an open one is scored
    /// from whatever has been answered so far.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for an unknown session.
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn results(&self, session_id: &SessionId) -> Result<SessionResults, QuizError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(QuizError::NotFound)?;
        let answers = to_answers(self.responses.get_answers(session_id).await?);

        let overlap_percentage = session
            .overlap_percentage()
            .unwrap_or_else(|| compute_alignment(&self.bank, &answers));

        Ok(SessionResults {
            session_id: session.id().clone(),
            overlap_percentage,
            completed: session.is_completed(),
            responses: answers.iter().collect(),
            created_at: session.created_at(),
            completed_at: session.completed_at(),
        })
    }
}

fn to_answers(responses: Vec<Response>) -> Answers {
    responses
        .into_iter()
        .map(|r| (r.question_id, r.answer))
        .collect()
}
