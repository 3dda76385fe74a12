use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use quiz_core::model::{DailyCounter, ProgressEntry, QuestionId};
use quiz_core::time::Clock;
use storage::repository::{DailyCounterRepository, ProgressRepository};

use crate::error::ProgressServiceError;

//
// ─── RECORDED ANSWER ───────────────────────────────────────────────────────────
//

/// State after recording one answer: the updated entry and today's counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub entry: ProgressEntry,
    pub daily: DailyCounter,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// The single writer path for mastery state and the daily counter.
///
/// Selection and the dashboard only ever read; every mutation of persisted
/// learning state goes through `record_answer`.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    daily: Arc<dyn DailyCounterRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        daily: Arc<dyn DailyCounterRepository>,
    ) -> Self {
        Self {
            clock: Clock::default(),
            progress,
            daily,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current local day according to the service's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Record one binary answer for a question.
    ///
    /// Total over any question id: a missing entry is created on first
    /// answer. The daily counter rolls over to the current day before the
    /// answer is counted, so a session spanning midnight attributes each
    /// answer to the day it was given.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if persistence fails.
    pub async fn record_answer(
        &self,
        id: &QuestionId,
        is_correct: bool,
    ) -> Result<RecordedAnswer, ProgressServiceError> {
        let now = self.clock.now();
        let entry = match self.progress.get_entry(id).await? {
            Some(mut entry) => {
                entry.record(is_correct, now);
                entry
            }
            None => ProgressEntry::first_answer(is_correct, now),
        };
        self.progress.upsert_entry(id, &entry).await?;

        let today = self.clock.today();
        let mut counter = self
            .daily
            .get_counter()
            .await?
            .unwrap_or_else(|| DailyCounter::new(today));
        counter.ensure_day(today);
        counter.record(is_correct);
        self.daily.save_counter(&counter).await?;

        Ok(RecordedAnswer {
            entry,
            daily: counter,
        })
    }

    /// Read-only snapshot of all progress entries, for selection and the
    /// dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the read fails.
    pub async fn snapshot(
        &self,
    ) -> Result<HashMap<QuestionId, ProgressEntry>, ProgressServiceError> {
        Ok(self.progress.all_entries().await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
