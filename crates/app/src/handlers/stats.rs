use axum::{Json, extract::State};
use quiz_core::stats::Distribution;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn distribution(State(state): State<AppState>) -> ApiResult<Json<Distribution>> {
    Ok(Json(state.services.stats().distribution().await?))
}
