use std::sync::Arc;

use quiz_core::model::QuestionBank;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::maintenance_service::MaintenanceService;
use crate::quiz_service::QuizService;
use crate::stats_service::StatsService;

/// Assembles the services shared by every request handler.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
    stats: Arc<StatsService>,
    maintenance: Arc<MaintenanceService>,
}

impl AppServices {
    /// Wire services over an already-open store.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        let bank = Arc::new(QuestionBank::standard());
        let quiz = Arc::new(QuizService::new(
            clock,
            Arc::clone(&bank),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.responses),
        ));
        let stats = Arc::new(StatsService::new(
            clock,
            Arc::clone(&bank),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.responses),
        ));
        let maintenance = Arc::new(MaintenanceService::new(
            clock,
            bank,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.responses),
        ));
        Self {
            quiz,
            stats,
            maintenance,
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), clock)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock))
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn maintenance(&self) -> Arc<MaintenanceService> {
        Arc::clone(&self.maintenance)
    }
}
