use chrono::{DateTime, Utc};
use quiz_core::model::{Percentage, Session, SessionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, i64_to_u64, map_session_row, ser};
use crate::repository::{SessionRepository, StorageError, StorageTotals};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn create_session(
        &self,
        id: &SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_sessions (id, created_at, completed)
            VALUES (?1, ?2, 0)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(id.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn complete_session(
        &self,
        id: &SessionId,
        overlap_percentage: Percentage,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut session = self.get_session(id).await?.ok_or(StorageError::NotFound)?;
        session.complete(overlap_percentage, completed_at)?;

        // Only the first completion wins; a concurrent second one updates nothing.
        let res = sqlx::query(
            r"
            UPDATE quiz_sessions
            SET completed = 1, overlap_percentage = ?2, completed_at = ?3
            WHERE id = ?1 AND completed = 0
            ",
        )
        .bind(id.as_str())
        .bind(i64::from(overlap_percentage.value()))
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 1 {
            Ok(())
        } else {
            Err(StorageError::Conflict)
        }
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, created_at, completed, overlap_percentage, completed_at
            FROM quiz_sessions WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn list_completed_percentages(&self) -> Result<Vec<Percentage>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT overlap_percentage
            FROM quiz_sessions
            WHERE completed = 1 AND overlap_percentage IS NOT NULL
            ORDER BY completed_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: i64 = row.try_get("overlap_percentage").map_err(ser)?;
            out.push(Percentage::new(raw).map_err(ser)?);
        }
        Ok(out)
    }

    async fn delete_stale_sessions(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
            DELETE FROM quiz_sessions
            WHERE completed = 0 AND created_at < ?1
            ",
        )
        .bind(created_before)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(res.rows_affected())
    }

    async fn count_sessions_with_prefix(&self, prefix: &str) -> Result<u64, StorageError> {
        // Not LIKE: '_' is a legal id character.
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS n FROM quiz_sessions
            WHERE substr(id, 1, length(?1)) = ?1
            ",
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;
        i64_to_u64("count", row.try_get("n").map_err(ser)?)
    }

    async fn storage_totals(&self) -> Result<StorageTotals, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM quiz_sessions) AS total_sessions,
                (SELECT COUNT(*) FROM quiz_sessions WHERE completed = 1) AS completed_sessions,
                (SELECT COUNT(*) FROM quiz_responses) AS total_responses,
                (SELECT MIN(created_at) FROM quiz_sessions) AS oldest_session,
                (SELECT MAX(created_at) FROM quiz_sessions) AS newest_session
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        Ok(StorageTotals {
            total_sessions: i64_to_u64("total_sessions", row.try_get("total_sessions").map_err(ser)?)?,
            completed_sessions: i64_to_u64(
                "completed_sessions",
                row.try_get("completed_sessions").map_err(ser)?,
            )?,
            total_responses: i64_to_u64(
                "total_responses",
                row.try_get("total_responses").map_err(ser)?,
            )?,
            oldest_session: row.try_get("oldest_session").map_err(ser)?,
            newest_session: row.try_get("newest_session").map_err(ser)?,
        })
    }
}
