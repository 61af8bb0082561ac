use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    timestamp: String,
    version: &'static str,
    database: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = if state.services.stats().storage_reachable().await {
        "healthy"
    } else {
        "unhealthy"
    };
    Json(Health {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
