use chrono::NaiveDate;

/// Same-day aggregate of attempts and correct answers.
///
/// A singleton record persisted across sessions; counts reset whenever the
/// stored date differs from the current local day. `ensure_day` must run
/// before any mutation so a session spanning midnight attributes each
/// answer to the day it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCounter {
    date: NaiveDate,
    seen: u32,
    correct: u32,
}

impl DailyCounter {
    /// Fresh counter for the given day.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            seen: 0,
            correct: 0,
        }
    }

    /// Rehydrate a counter from persisted storage.
    ///
    /// Storage adapters coerce malformed values first, so this is infallible;
    /// a stale or nonsense date simply triggers a reset at the next
    /// `ensure_day`.
    #[must_use]
    pub fn from_persisted(date: NaiveDate, seen: u32, correct: u32) -> Self {
        Self {
            date,
            seen,
            correct,
        }
    }

    /// Reset the counter when the stored date is not `today`.
    ///
    /// Returns true when a rollover happened.
    pub fn ensure_day(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        *self = Self::new(today);
        true
    }

    /// Count one answer for the current day.
    pub fn record(&mut self, is_correct: bool) {
        self.seen = self.seen.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn seen(&self) -> u32 {
        self.seen
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Today's accuracy as `round(100 * correct / seen)`, `None` before the
    /// first answer of the day.
    #[must_use]
    pub fn accuracy_percent(&self) -> Option<u32> {
        if self.seen == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some((100.0 * f64::from(self.correct) / f64::from(self.seen)).round() as u32)
    }
}
