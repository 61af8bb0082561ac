use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerValue, QuestionId, Response, SessionId};
use quiz_core::stats::AnswerTally;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, i64_to_u64, map_response_row, question_id_from_i64, ser};
use crate::repository::{ResponseRepository, StorageError};

#[async_trait::async_trait]
impl ResponseRepository for SqliteRepository {
    async fn record_answer(
        &self,
        session_id: &SessionId,
        question_id: QuestionId,
        answer: AnswerValue,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM quiz_sessions WHERE id = ?1")
            .bind(session_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .is_some();
        if !exists {
            return Err(StorageError::NotFound);
        }

        let res = sqlx::query(
            r"
            INSERT INTO quiz_responses (session_id, question_id, answer, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(session_id, question_id) DO NOTHING
            ",
        )
        .bind(session_id.as_str())
        .bind(i64::from(question_id.value()))
        .bind(i64::from(answer.value()))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_answers(&self, session_id: &SessionId) -> Result<Vec<Response>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session_id, question_id, answer, created_at
            FROM quiz_responses
            WHERE session_id = ?1
            ORDER BY question_id ASC
            ",
        )
        .bind(session_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_response_row(&row)?);
        }
        Ok(out)
    }

    async fn answer_counts(&self) -> Result<Vec<AnswerTally>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT r.question_id AS question_id, r.answer AS answer, COUNT(*) AS n
            FROM quiz_responses r
            JOIN quiz_sessions s ON s.id = r.session_id
            WHERE s.completed = 1
            GROUP BY r.question_id, r.answer
            ORDER BY r.question_id ASC, r.answer ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let question_id = question_id_from_i64(row.try_get("question_id").map_err(ser)?)?;
            let answer =
                AnswerValue::new(question_id, row.try_get("answer").map_err(ser)?).map_err(ser)?;
            let count = i64_to_u64("count", row.try_get("n").map_err(ser)?)?;
            out.push(AnswerTally {
                question_id,
                answer,
                count,
            });
        }
        Ok(out)
    }
}
