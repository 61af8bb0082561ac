use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, header::AUTHORIZATION},
};
use serde::{Deserialize, Serialize};
use services::{AdminStats, SeedOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct AdminQuery {
    key: Option<String>,
}

/// A query string that does not parse carries no key.
fn query_key(query: Result<Query<AdminQuery>, QueryRejection>) -> AdminQuery {
    query.map(|Query(inner)| inner).unwrap_or_default()
}

#[derive(Serialize)]
pub struct CleanupResponse {
    deleted: u64,
}

/// Accepts `Authorization: Bearer <key>` or `?key=<key>`.
fn authorize(state: &AppState, headers: &HeaderMap, query: &AdminQuery) -> ApiResult<()> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let accepted = bearer.is_some_and(|key| state.admin_key_matches(key))
        || query
            .key
            .as_deref()
            .is_some_and(|key| state.admin_key_matches(key));

    if accepted {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AdminQuery>, QueryRejection>,
) -> ApiResult<Json<AdminStats>> {
    authorize(&state, &headers, &query_key(query))?;
    Ok(Json(state.services.stats().admin_stats().await?))
}

pub async fn seed(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AdminQuery>, QueryRejection>,
) -> ApiResult<Json<SeedOutcome>> {
    authorize(&state, &headers, &query_key(query))?;
    Ok(Json(state.services.maintenance().seed_demo_data().await?))
}

pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AdminQuery>, QueryRejection>,
) -> ApiResult<Json<CleanupResponse>> {
    authorize(&state, &headers, &query_key(query))?;
    let deleted = state
        .services
        .maintenance()
        .cleanup_stale(state.stale_after)
        .await?;
    Ok(Json(CleanupResponse { deleted }))
}
