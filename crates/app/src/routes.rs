use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{admin, health, quiz, stats};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/questions", get(quiz::questions))
        .route("/submit", post(quiz::submit))
        .route("/sessions", post(quiz::start_session))
        .route(
            "/sessions/{session_id}/answers/{question_id}",
            put(quiz::answer),
        )
        .route("/sessions/{session_id}/complete", post(quiz::complete))
        .route("/results/{session_id}", get(quiz::results))
        .route("/distribution", get(stats::distribution))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/seed", post(admin::seed))
        .route("/admin/cleanup", post(admin::cleanup));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
