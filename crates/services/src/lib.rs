#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod maintenance_service;
pub mod quiz_service;
pub mod stats_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, MaintenanceError, QuizError, StatsError};
pub use maintenance_service::{MaintenanceService, SeedOutcome};
pub use quiz_service::{QuizService, SessionResults, SubmitOutcome};
pub use stats_service::{AdminStats, StatsService};
