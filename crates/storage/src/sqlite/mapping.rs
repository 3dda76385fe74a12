use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{DailyCounterRecord, ProgressRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Map a progress row into its record shape.
///
/// Only the key must be readable; every state column degrades to `None` on
/// unexpected content and is coerced to a default by `normalize`.
pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let question_id: String = row.try_get("question_id").map_err(ser)?;

    Ok(ProgressRecord {
        question_id,
        bucket: row.try_get("bucket").ok(),
        consecutive_correct: row.try_get("consecutive_correct").ok(),
        seen: row.try_get("seen").ok(),
        correct: row.try_get("correct").ok(),
        wrong: row.try_get("wrong").ok(),
        last_was_correct: row.try_get("last_was_correct").ok(),
        last_seen: row.try_get("last_seen").ok(),
    })
}

pub(crate) fn map_daily_counter_row(row: &SqliteRow) -> DailyCounterRecord {
    DailyCounterRecord {
        date: row.try_get("date").ok(),
        seen: row.try_get("seen").ok(),
        correct: row.try_get("correct").ok(),
    }
}
