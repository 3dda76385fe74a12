use async_trait::async_trait;
use std::collections::HashMap;

use quiz_core::model::{ProgressEntry, QuestionId};

use super::SqliteRepository;
use super::mapping::map_progress_row;
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_entry(&self, id: &QuestionId) -> Result<Option<ProgressEntry>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT question_id, bucket, consecutive_correct, seen, correct, wrong,
                   last_was_correct, last_seen
            FROM progress
            WHERE question_id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (_, entry) = map_progress_row(&row)?.normalize();
        Ok(Some(entry))
    }

    async fn all_entries(&self) -> Result<HashMap<QuestionId, ProgressEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, bucket, consecutive_correct, seen, correct, wrong,
                   last_was_correct, last_seen
            FROM progress
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in &rows {
            let (id, entry) = map_progress_row(row)?.normalize();
            entries.insert(id, entry);
        }
        Ok(entries)
    }

    async fn upsert_entry(
        &self,
        id: &QuestionId,
        entry: &ProgressEntry,
    ) -> Result<(), StorageError> {
        let record = ProgressRecord::from_entry(id, entry);
        sqlx::query(
            r"
            INSERT INTO progress (
                question_id,
                bucket,
                consecutive_correct,
                seen,
                correct,
                wrong,
                last_was_correct,
                last_seen
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(question_id) DO UPDATE SET
                bucket = excluded.bucket,
                consecutive_correct = excluded.consecutive_correct,
                seen = excluded.seen,
                correct = excluded.correct,
                wrong = excluded.wrong,
                last_was_correct = excluded.last_was_correct,
                last_seen = excluded.last_seen
            ",
        )
        .bind(record.question_id)
        .bind(record.bucket)
        .bind(record.consecutive_correct)
        .bind(record.seen)
        .bind(record.correct)
        .bind(record.wrong)
        .bind(record.last_was_correct)
        .bind(record.last_seen)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
