use async_trait::async_trait;

use quiz_core::model::DailyCounter;

use super::SqliteRepository;
use super::mapping::map_daily_counter_row;
use crate::repository::{DailyCounterRecord, DailyCounterRepository, StorageError};

#[async_trait]
impl DailyCounterRepository for SqliteRepository {
    async fn get_counter(&self) -> Result<Option<DailyCounter>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT date, seen, correct
            FROM daily_counter
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(row.map(|row| map_daily_counter_row(&row).normalize()))
    }

    async fn save_counter(&self, counter: &DailyCounter) -> Result<(), StorageError> {
        let record = DailyCounterRecord::from_counter(counter);
        sqlx::query(
            r"
            INSERT INTO daily_counter (id, date, seen, correct)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                date = excluded.date,
                seen = excluded.seen,
                correct = excluded.correct
            ",
        )
        .bind(1_i64)
        .bind(record.date)
        .bind(record.seen)
        .bind(record.correct)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
