use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerValue, Percentage, QuestionId, Response, Session, SessionId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u8::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid question_id: {v}")))
}

pub(crate) fn session_id_from_str(raw: String) -> Result<SessionId, StorageError> {
    SessionId::parse(raw).map_err(ser)
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<Session, StorageError> {
    let id = session_id_from_str(row.try_get("id").map_err(ser)?)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    let completed: i64 = row.try_get("completed").map_err(ser)?;
    let overlap_percentage = row
        .try_get::<Option<i64>, _>("overlap_percentage")
        .map_err(ser)?
        .map(Percentage::new)
        .transpose()
        .map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;

    Session::from_persisted(
        id,
        created_at,
        completed != 0,
        overlap_percentage,
        completed_at,
    )
    .map_err(ser)
}

pub(crate) fn map_response_row(row: &SqliteRow) -> Result<Response, StorageError> {
    let session_id = session_id_from_str(row.try_get("session_id").map_err(ser)?)?;
    let question_id = question_id_from_i64(row.try_get("question_id").map_err(ser)?)?;
    let answer = AnswerValue::new(question_id, row.try_get("answer").map_err(ser)?).map_err(ser)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    Ok(Response::new(session_id, question_id, answer, created_at))
}
