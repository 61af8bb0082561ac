use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{Percentage, QuestionBank};
use quiz_core::stats::{self, Distribution, QuestionAnalysis, Statistics};
use serde::Serialize;
use storage::repository::{ResponseRepository, SessionRepository, StorageTotals};
use tracing::warn;

use crate::Clock;
use crate::error::StatsError;

/// Operator view over every completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub question_analysis: Vec<QuestionAnalysis>,
    pub totals: StorageTotals,
    /// Highest first.
    pub all_scores: Vec<Percentage>,
    pub generated_at: DateTime<Utc>,
}

/// Read-only aggregation over completed sessions.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    sessions: Arc<dyn SessionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl StatsService {
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

    /// Public histogram of completed percentages.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn distribution(&self) -> Result<Distribution, StatsError> {
        let scores = self.sessions.list_completed_percentages().await?;
        Ok(stats::distribution(&scores))
    }

    /// Whether the store answers a trivial query.
    pub async fn storage_reachable(&self) -> bool {
        match self.sessions.storage_totals().await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "storage health probe failed");
                false
            }
        }
    }

    /// Full statistics bundle for operators.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn admin_stats(&self) -> Result<AdminStats, StatsError> {
        let mut scores = self.sessions.list_completed_percentages().await?;
        let tallies = self.responses.answer_counts().await?;
        let totals = self.sessions.storage_totals().await?;

        let statistics = stats::summarize(&scores);
        scores.sort_unstable_by(|a, b| b.cmp(a));

        Ok(AdminStats {
            statistics,
            question_analysis: stats::analyze_questions(&self.bank, &tallies),
            totals,
            all_scores: scores,
            generated_at: self.clock.now(),
        })
    }
}
