use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{Bucket, DailyCounter, ProgressEntry, QuestionId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a progress entry.
///
/// Every field except the key is optional: older or partially corrupt rows
/// must load without erroring, so `normalize` coerces whatever is missing or
/// out of range to defaults instead of failing.
#[derive(Debug, Clone, Default)]
pub struct ProgressRecord {
    pub question_id: String,
    pub bucket: Option<String>,
    pub consecutive_correct: Option<i64>,
    pub seen: Option<i64>,
    pub correct: Option<i64>,
    pub wrong: Option<i64>,
    pub last_was_correct: Option<bool>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Coerce a stored count to `u32`, treating negatives and absence as zero.
fn coerce_count(value: Option<i64>) -> u32 {
    value
        .filter(|v| *v >= 0)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Parse a stored bucket letter, falling back to `A` on anything unknown.
#[must_use]
pub fn parse_bucket(value: Option<&str>) -> Bucket {
    match value {
        Some("B") => Bucket::B,
        Some("C") => Bucket::C,
        _ => Bucket::A,
    }
}

impl ProgressRecord {
    #[must_use]
    pub fn from_entry(id: &QuestionId, entry: &ProgressEntry) -> Self {
        Self {
            question_id: id.as_str().to_owned(),
            bucket: Some(entry.bucket().as_str().to_owned()),
            consecutive_correct: Some(i64::from(entry.consecutive_correct())),
            seen: Some(i64::from(entry.seen())),
            correct: Some(i64::from(entry.correct())),
            wrong: Some(i64::from(entry.wrong())),
            last_was_correct: Some(entry.last_was_correct()),
            last_seen: Some(entry.last_seen()),
        }
    }

    /// Convert the record into a domain entry, coercing malformed fields.
    ///
    /// A missing timestamp falls back to the epoch, which makes the entry
    /// maximally stale for focus-mode recency without inventing history.
    #[must_use]
    pub fn normalize(self) -> (QuestionId, ProgressEntry) {
        let entry = ProgressEntry::from_persisted(
            parse_bucket(self.bucket.as_deref()),
            coerce_count(self.consecutive_correct),
            coerce_count(self.seen),
            coerce_count(self.correct),
            coerce_count(self.wrong),
            self.last_was_correct.unwrap_or(true),
            self.last_seen.unwrap_or(DateTime::UNIX_EPOCH),
        );
        (QuestionId::new(self.question_id), entry)
    }
}

/// Persisted shape for the daily counter singleton.
#[derive(Debug, Clone, Default)]
pub struct DailyCounterRecord {
    pub date: Option<String>,
    pub seen: Option<i64>,
    pub correct: Option<i64>,
}

impl DailyCounterRecord {
    #[must_use]
    pub fn from_counter(counter: &DailyCounter) -> Self {
        Self {
            date: Some(counter.date().format("%Y-%m-%d").to_string()),
            seen: Some(i64::from(counter.seen())),
            correct: Some(i64::from(counter.correct())),
        }
    }

    /// Convert the record into a domain counter, coercing malformed fields.
    ///
    /// An unparseable date maps to the epoch so the next `ensure_day` call
    /// resets the counter rather than counting against a phantom day.
    #[must_use]
    pub fn normalize(self) -> DailyCounter {
        let date = self
            .date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .unwrap_or(NaiveDate::default());
        DailyCounter::from_persisted(date, coerce_count(self.seen), coerce_count(self.correct))
    }
}

/// Repository contract for per-question progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch one progress entry, `None` when the question was never answered.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_entry(&self, id: &QuestionId) -> Result<Option<ProgressEntry>, StorageError>;

    /// Fetch all progress entries, keyed by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn all_entries(&self) -> Result<HashMap<QuestionId, ProgressEntry>, StorageError>;

    /// Persist or update one progress entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn upsert_entry(&self, id: &QuestionId, entry: &ProgressEntry)
    -> Result<(), StorageError>;
}

/// Repository contract for the daily counter singleton.
#[async_trait]
pub trait DailyCounterRepository: Send + Sync {
    /// Fetch the counter, `None` when nothing was ever recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_counter(&self) -> Result<Option<DailyCounter>, StorageError>;

    /// Persist the counter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counter cannot be stored.
    async fn save_counter(&self, counter: &DailyCounter) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<QuestionId, ProgressEntry>>>,
    daily: Arc<Mutex<Option<DailyCounter>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_entry(&self, id: &QuestionId) -> Result<Option<ProgressEntry>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn all_entries(&self) -> Result<HashMap<QuestionId, ProgressEntry>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn upsert_entry(
        &self,
        id: &QuestionId,
        entry: &ProgressEntry,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id.clone(), entry.clone());
        Ok(())
    }
}

#[async_trait]
impl DailyCounterRepository for InMemoryRepository {
    async fn get_counter(&self) -> Result<Option<DailyCounter>, StorageError> {
        let guard = self
            .daily
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_counter(&self, counter: &DailyCounter) -> Result<(), StorageError> {
        let mut guard = self
            .daily
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(counter.clone());
        Ok(())
    }
}

/// Aggregates the two persistence surfaces behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub daily: Arc<dyn DailyCounterRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let daily: Arc<dyn DailyCounterRepository> = Arc::new(repo);
        Self { progress, daily }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn in_memory_round_trips_progress() {
        let repo = InMemoryRepository::new();
        let id = QuestionId::new("q1");
        let entry = ProgressEntry::first_answer(true, fixed_now());

        assert!(repo.get_entry(&id).await.unwrap().is_none());
        repo.upsert_entry(&id, &entry).await.unwrap();

        let fetched = repo.get_entry(&id).await.unwrap().unwrap();
        assert_eq!(fetched, entry);
        assert_eq!(repo.all_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn in_memory_round_trips_daily_counter() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_counter().await.unwrap().is_none());

        let mut counter = DailyCounter::new(fixed_now().date_naive());
        counter.record(true);
        repo.save_counter(&counter).await.unwrap();

        assert_eq!(repo.get_counter().await.unwrap(), Some(counter));
    }

    #[test]
    fn progress_record_round_trips_entry() {
        let id = QuestionId::new("q1");
        let mut entry = ProgressEntry::first_answer(true, fixed_now());
        entry.record(false, fixed_now());

        let record = ProgressRecord::from_entry(&id, &entry);
        let (restored_id, restored) = record.normalize();

        assert_eq!(restored_id, id);
        assert_eq!(restored, entry);
    }

    #[test]
    fn normalize_coerces_malformed_progress_fields() {
        let record = ProgressRecord {
            question_id: "q1".into(),
            bucket: Some("Z".into()),
            consecutive_correct: Some(-3),
            seen: None,
            correct: Some(i64::MAX),
            wrong: Some(2),
            last_was_correct: None,
            last_seen: None,
        };

        let (_, entry) = record.normalize();
        assert_eq!(entry.bucket(), Bucket::A);
        assert_eq!(entry.consecutive_correct(), 0);
        assert_eq!(entry.seen(), 0);
        assert_eq!(entry.correct(), 0);
        assert_eq!(entry.wrong(), 2);
        assert!(entry.last_was_correct());
        assert_eq!(entry.last_seen(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn normalize_coerces_malformed_daily_counter() {
        let record = DailyCounterRecord {
            date: Some("not-a-date".into()),
            seen: Some(-1),
            correct: None,
        };

        let mut counter = record.normalize();
        assert_eq!(counter.seen(), 0);
        assert_eq!(counter.correct(), 0);

        // The garbage date must read as stale: the next ensure_day resets it.
        assert!(counter.ensure_day(fixed_now().date_naive()));
    }

    #[test]
    fn daily_counter_record_round_trips() {
        let mut counter = DailyCounter::new(fixed_now().date_naive());
        counter.record(false);
        counter.record(true);

        let restored = DailyCounterRecord::from_counter(&counter).normalize();
        assert_eq!(restored, counter);
    }
}
