use std::sync::Arc;

use chrono::Duration;
use quiz_core::model::{AnswerValue, Percentage, QuestionBank, QuestionId, SessionId};
use rand::{Rng, rng};
use serde::Serialize;
use storage::repository::{ResponseRepository, SessionRepository};
use tracing::info;

use crate::Clock;
use crate::error::MaintenanceError;

/// Id prefix shared by every demo session.
pub const DEMO_PREFIX: &str = "demo";

/// Percentages given to `demo1..demo8`.
pub const DEMO_PERCENTAGES: [u8; 8] = [75, 45, 88, 32, 67, 91, 23, 56];

/// Outcome of a seeding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub seeded: bool,
    pub sessions: u32,
}

/// Housekeeping: stale-session cleanup and demo data.
#[derive(Clone)]
pub struct MaintenanceService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    sessions: Arc<dyn SessionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl MaintenanceService {
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

    /// Delete incomplete sessions created more than `older_than` ago.
    ///
    /// # Errors
    ///
    /// Returns `MaintenanceError::InvalidRetention` for a zero or negative window.
    /// Returns `MaintenanceError::Storage` if deletion fails.
    pub async fn cleanup_stale(&self, older_than: Duration) -> Result<u64, MaintenanceError> {
        if older_than <= Duration::zero() {
            return Err(MaintenanceError::InvalidRetention);
        }
        let cutoff = self.clock.cutoff(older_than);
        let deleted = self.sessions.delete_stale_sessions(cutoff).await?;
        info!(deleted, %cutoff, "stale sessions removed");
        Ok(deleted)
    }

    /// Insert the eight demo sessions unless any `demo*` session already exists.
    ///
    /// # Errors
    ///
    /// Returns `MaintenanceError::Storage` if persistence fails.
    pub async fn seed_demo_data(&self) -> Result<SeedOutcome, MaintenanceError> {
        if self.sessions.count_sessions_with_prefix(DEMO_PREFIX).await? > 0 {
            info!("demo data already present");
            return Ok(SeedOutcome {
                seeded: false,
                sessions: 0,
            });
        }

        let now = self.clock.now();
        let mut sessions = 0_u32;
        for (index, percentage) in (1_i64..).zip(DEMO_PERCENTAGES) {
            let id = SessionId::parse(format!("{DEMO_PREFIX}{index}"))?;
            let created_at = now - Duration::minutes(10 * (9 - index));
            let answers = random_answers(&self.bank)?;

            self.sessions.create_session(&id, created_at).await?;
            for (question, answer) in answers {
                self.responses
                    .record_answer(&id, question, answer, created_at)
                    .await?;
            }
            self.sessions
                .complete_session(
                    &id,
                    Percentage::new(i64::from(percentage))?,
                    created_at + Duration::minutes(5),
                )
                .await?;
            sessions += 1;
        }

        info!(sessions, "demo data seeded");
        Ok(SeedOutcome {
            seeded: true,
            sessions,
        })
    }
}

// Synchronous on purpose: `ThreadRng` is not `Send` and must not cross an await.
fn random_answers(bank: &QuestionBank) -> Result<Vec<(QuestionId, AnswerValue)>, MaintenanceError> {
    let mut rng = rng();
    bank.ids()
        .map(|question| -> Result<_, MaintenanceError> {
            let value = rng.random_range(AnswerValue::MIN..=AnswerValue::MAX);
            Ok((question, AnswerValue::new(question, i64::from(value))?))
        })
        .collect()
}
