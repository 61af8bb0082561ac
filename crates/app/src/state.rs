use std::sync::Arc;

use chrono::Duration;
use services::AppServices;

use crate::config::Config;

/// Shared by every handler; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    admin_key: Option<Arc<str>>,
    pub stale_after: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices, config: &Config) -> Self {
        if config.admin_key.is_none() {
            tracing::warn!("QUIZ_ADMIN_KEY is not set; admin routes will reject every request");
        }
        Self {
            services,
            admin_key: config.admin_key.as_deref().map(Arc::from),
            stale_after: config.stale_after,
        }
    }

    /// True only when a key is configured and `candidate` matches it.
    #[must_use]
    pub fn admin_key_matches(&self, candidate: &str) -> bool {
        self.admin_key
            .as_deref()
            .is_some_and(|key| key.as_bytes() == candidate.as_bytes())
    }
}
