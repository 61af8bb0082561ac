use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use quiz_core::ValidationError;
use quiz_core::model::{Percentage, PublicQuestion, QuestionId, SessionId};
use serde::{Deserialize, Serialize};
use services::SessionResults;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    answers: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    session_id: SessionId,
    overlap_percentage: Percentage,
    message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    session_id: SessionId,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    answer: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompleted {
    session_id: SessionId,
    overlap_percentage: Percentage,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))
}

pub async fn questions(State(state): State<AppState>) -> Json<Vec<PublicQuestion>> {
    Json(state.services.quiz().questions())
}

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let request = body(payload)?;
    let outcome = state.services.quiz().submit(&request.answers).await?;
    Ok(Json(SubmitResponse {
        session_id: outcome.session_id,
        overlap_percentage: outcome.overlap_percentage,
        message: "Responses submitted successfully",
    }))
}

pub async fn start_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionCreated>)> {
    let session_id = state.services.quiz().start_session().await?;
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

pub async fn answer(
    State(state): State<AppState>,
    Path((session_id, question_id)): Path<(String, String)>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let session_id = SessionId::parse(session_id)?;
    let question: QuestionId = question_id.parse()?;
    let request = body(payload)?;
    let value = request
        .answer
        .as_i64()
        .ok_or_else(|| ValidationError::InvalidAnswer {
            question: i64::from(question.value()),
            raw: request.answer.to_string(),
        })?;

    state
        .services
        .quiz()
        .answer(&session_id, question, value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionCompleted>> {
    let session_id = SessionId::parse(session_id)?;
    let overlap_percentage = state.services.quiz().complete(&session_id).await?;
    Ok(Json(SessionCompleted {
        session_id,
        overlap_percentage,
    }))
}

pub async fn results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionResults>> {
    let session_id = SessionId::parse(session_id)?;
    Ok(Json(state.services.quiz().results(&session_id).await?))
}
