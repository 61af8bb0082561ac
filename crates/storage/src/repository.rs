use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerValue, Percentage, QuestionId, Response, Session, SessionId, SessionStateError,
};
use quiz_core::stats::AnswerTally;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
///
/// `NotFound`, `Conflict` and `InvalidTransition` describe the data; the other
/// variants mean the store itself failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    /// The write would leave a session that cannot be read back.
    #[error("invalid session transition: {0}")]
    InvalidTransition(SessionStateError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// True for failures of the store itself, as opposed to missing or
    /// conflicting data.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StorageError::Connection(_) | StorageError::Serialization(_)
        )
    }
}

impl From<SessionStateError> for StorageError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::AlreadyCompleted => StorageError::Conflict,
            other => StorageError::InvalidTransition(other),
        }
    }
}

/// Row counts and time span of the stored data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTotals {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_responses: u64,
    pub oldest_session: Option<DateTime<Utc>>,
    pub newest_session: Option<DateTime<Utc>>,
}

/// Repository contract for quiz sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert an incomplete session. No-op if the id already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn create_session(
        &self,
        id: &SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Mark a session completed with its final percentage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session is missing,
    /// `StorageError::Conflict` if it was already completed, and
    /// `StorageError::InvalidTransition` if `completed_at` precedes creation.
    async fn complete_session(
        &self,
        id: &SessionId,
        overlap_percentage: Percentage,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch a session by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures; a missing session is `Ok(None)`.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StorageError>;

    /// Percentages of every completed session, oldest completion first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn list_completed_percentages(&self) -> Result<Vec<Percentage>, StorageError>;

    /// Delete incomplete sessions created before `created_before`, along with
    /// their responses. Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn delete_stale_sessions(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn count_sessions_with_prefix(&self, prefix: &str) -> Result<u64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn storage_totals(&self) -> Result<StorageTotals, StorageError>;
}

/// Repository contract for per-question responses.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Record one answer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist and
    /// `StorageError::Conflict` if the question was already answered.
    async fn record_answer(
        &self,
        session_id: &SessionId,
        question_id: QuestionId,
        answer: AnswerValue,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Answers of a session, ascending by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn get_answers(&self, session_id: &SessionId) -> Result<Vec<Response>, StorageError>;

    /// Per (question, answer) counts over completed sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn answer_counts(&self) -> Result<Vec<AnswerTally>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
    responses: Arc<Mutex<HashMap<SessionId, BTreeMap<QuestionId, Response>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn create_session(
        &self,
        id: &SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        guard
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone(), created_at));
        Ok(())
    }

    async fn complete_session(
        &self,
        id: &SessionId,
        overlap_percentage: Percentage,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        let session = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        session.complete(overlap_percentage, completed_at)?;
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_completed_percentages(&self) -> Result<Vec<Percentage>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        let mut completed: Vec<&Session> = guard.values().filter(|s| s.is_completed()).collect();
        completed.sort_by(|a, b| {
            a.completed_at()
                .cmp(&b.completed_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(completed
            .into_iter()
            .filter_map(Session::overlap_percentage)
            .collect())
    }

    async fn delete_stale_sessions(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        let mut responses = self.responses.lock().map_err(poisoned)?;
        let stale: Vec<SessionId> = sessions
            .values()
            .filter(|s| !s.is_completed() && s.created_at() < created_before)
            .map(|s| s.id().clone())
            .collect();
        for id in &stale {
            sessions.remove(id);
            responses.remove(id);
        }
        Ok(stale.len() as u64)
    }

    async fn count_sessions_with_prefix(&self, prefix: &str) -> Result<u64, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        Ok(guard
            .keys()
            .filter(|id| id.as_str().starts_with(prefix))
            .count() as u64)
    }

    async fn storage_totals(&self) -> Result<StorageTotals, StorageError> {
        let sessions = self.sessions.lock().map_err(poisoned)?;
        let responses = self.responses.lock().map_err(poisoned)?;
        Ok(StorageTotals {
            total_sessions: sessions.len() as u64,
            completed_sessions: sessions.values().filter(|s| s.is_completed()).count() as u64,
            total_responses: responses.values().map(BTreeMap::len).sum::<usize>() as u64,
            oldest_session: sessions.values().map(Session::created_at).min(),
            newest_session: sessions.values().map(Session::created_at).max(),
        })
    }
}

#[async_trait]
impl ResponseRepository for InMemoryRepository {
    async fn record_answer(
        &self,
        session_id: &SessionId,
        question_id: QuestionId,
        answer: AnswerValue,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let sessions = self.sessions.lock().map_err(poisoned)?;
        if !sessions.contains_key(session_id) {
            return Err(StorageError::NotFound);
        }
        let mut responses = self.responses.lock().map_err(poisoned)?;
        let answers = responses.entry(session_id.clone()).or_default();
        if answers.contains_key(&question_id) {
            return Err(StorageError::Conflict);
        }
        answers.insert(
            question_id,
            Response::new(session_id.clone(), question_id, answer, created_at),
        );
        Ok(())
    }

    async fn get_answers(&self, session_id: &SessionId) -> Result<Vec<Response>, StorageError> {
        let guard = self.responses.lock().map_err(poisoned)?;
        Ok(guard
            .get(session_id)
            .map(|answers| answers.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn answer_counts(&self) -> Result<Vec<AnswerTally>, StorageError> {
        let sessions = self.sessions.lock().map_err(poisoned)?;
        let responses = self.responses.lock().map_err(poisoned)?;

        let mut counts: BTreeMap<(QuestionId, AnswerValue), u64> = BTreeMap::new();
        for (session_id, answers) in responses.iter() {
            if !sessions.get(session_id).is_some_and(Session::is_completed) {
                continue;
            }
            for response in answers.values() {
                *counts
                    .entry((response.question_id, response.answer))
                    .or_insert(0) += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|((question_id, answer), count)| AnswerTally {
                question_id,
                answer,
                count,
            })
            .collect())
    }
}

/// Aggregates the session and response repositories behind trait objects for
/// easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub responses: Arc<dyn ResponseRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let responses: Arc<dyn ResponseRepository> = Arc::new(repo);
        Self {
            sessions,
            responses,
        }
    }
}
