//! Read-only aggregation of progress into dashboard numbers.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use quiz_core::model::{Catalog, DailyCounter, ProgressEntry, QuestionId};
use quiz_core::time::Clock;
use storage::repository::{DailyCounterRepository, ProgressRepository};

use crate::error::DashboardError;

/// Aggregate numbers for the stats view. Serializes for `stats --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_questions: usize,
    pub answered: usize,
    pub ever_correct: usize,
    pub ever_wrong: usize,
    pub overall_accuracy: Option<u32>,
    pub today_seen: u32,
    pub today_correct: u32,
    pub today_accuracy: Option<u32>,
    pub per_source: BTreeMap<String, usize>,
}

/// Compute dashboard stats from a progress snapshot.
///
/// Only entries whose id is in the catalog are counted; orphaned entries
/// from retired questions stay in storage but do not skew the numbers.
/// A stored daily counter from an earlier day counts as zero for today.
#[must_use]
pub fn compute_stats(
    catalog: &Catalog,
    progress: &HashMap<QuestionId, ProgressEntry>,
    daily: Option<&DailyCounter>,
    today: NaiveDate,
) -> DashboardStats {
    let mut answered = 0usize;
    let mut ever_correct = 0usize;
    let mut ever_wrong = 0usize;
    let mut seen_sum = 0u64;
    let mut correct_sum = 0u64;

    for question in catalog.questions() {
        let Some(entry) = progress.get(question.id()) else {
            continue;
        };
        if entry.seen() == 0 {
            continue;
        }
        answered += 1;
        if entry.correct() > 0 {
            ever_correct += 1;
        }
        if entry.wrong() > 0 {
            ever_wrong += 1;
        }
        seen_sum += u64::from(entry.seen());
        correct_sum += u64::from(entry.correct());
    }

    let overall_accuracy = if seen_sum == 0 {
        None
    } else {
        #[allow(clippy::cast_possible_truncation)]
        Some(((correct_sum * 100 + seen_sum / 2) / seen_sum) as u32)
    };

    let todays = daily.filter(|counter| counter.date() == today);
    DashboardStats {
        total_questions: catalog.len(),
        answered,
        ever_correct,
        ever_wrong,
        overall_accuracy,
        today_seen: todays.map_or(0, DailyCounter::seen),
        today_correct: todays.map_or(0, DailyCounter::correct),
        today_accuracy: todays.and_then(DailyCounter::accuracy_percent),
        per_source: catalog.source_counts(),
    }
}

/// Async front over `compute_stats` reading straight from the repositories.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    catalog: Arc<Catalog>,
    progress: Arc<dyn ProgressRepository>,
    daily: Arc<dyn DailyCounterRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        progress: Arc<dyn ProgressRepository>,
        daily: Arc<dyn DailyCounterRepository>,
    ) -> Self {
        Self {
            clock: Clock::default(),
            catalog,
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

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if either repository read fails.
    pub async fn stats(&self) -> Result<DashboardStats, DashboardError> {
        let progress = self.progress.all_entries().await?;
        let daily = self.daily.get_counter().await?;
        Ok(compute_stats(
            &self.catalog,
            &progress,
            daily.as_ref(),
            self.clock.today(),
        ))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
