use chrono::{DateTime, Utc};

/// Mastery tier driving SRS sampling weight.
///
/// `A` is new/struggling, `B` is learning, `C` is mastered. Questions with
/// no progress entry are treated as `A` by the selection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bucket {
    #[default]
    A,
    B,
    C,
}

impl Bucket {
    /// The bucket reached by one more correct answer. `C` is terminal.
    #[must_use]
    pub fn promoted(self) -> Self {
        match self {
            Bucket::A => Bucket::B,
            Bucket::B | Bucket::C => Bucket::C,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::A => "A",
            Bucket::B => "B",
            Bucket::C => "C",
        }
    }
}

/// Per-question mastery state, created lazily on first answer.
///
/// The transition law is a strict ratchet: each correct answer promotes the
/// bucket one step (A→B→C, C terminal), any wrong answer forces the bucket
/// back to A and zeroes the correct streak. Only answering mutates state;
/// idle time never demotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    bucket: Bucket,
    consecutive_correct: u32,
    seen: u32,
    correct: u32,
    wrong: u32,
    last_was_correct: bool,
    last_seen: DateTime<Utc>,
}

impl ProgressEntry {
    /// State after the very first answer to a question.
    #[must_use]
    pub fn first_answer(is_correct: bool, now: DateTime<Utc>) -> Self {
        let mut entry = Self {
            bucket: Bucket::A,
            consecutive_correct: 0,
            seen: 0,
            correct: 0,
            wrong: 0,
            last_was_correct: false,
            last_seen: now,
        };
        entry.record(is_correct, now);
        entry
    }

    /// Rehydrate an entry from persisted storage.
    ///
    /// Storage adapters coerce malformed values to defaults before calling
    /// this, so rehydration is infallible.
    #[must_use]
    pub fn from_persisted(
        bucket: Bucket,
        consecutive_correct: u32,
        seen: u32,
        correct: u32,
        wrong: u32,
        last_was_correct: bool,
        last_seen: DateTime<Utc>,
    ) -> Self {
        Self {
            bucket,
            consecutive_correct,
            seen,
            correct,
            wrong,
            last_was_correct,
            last_seen,
        }
    }

    /// Apply one answer to the state machine.
    pub fn record(&mut self, is_correct: bool, now: DateTime<Utc>) {
        if is_correct {
            self.bucket = self.bucket.promoted();
            self.consecutive_correct = self.consecutive_correct.saturating_add(1);
            self.correct = self.correct.saturating_add(1);
            self.last_was_correct = true;
        } else {
            self.bucket = Bucket::A;
            self.consecutive_correct = 0;
            self.wrong = self.wrong.saturating_add(1);
            self.last_was_correct = false;
        }
        self.seen = self.seen.saturating_add(1);
        self.last_seen = now;
    }

    #[must_use]
    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    #[must_use]
    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    #[must_use]
    pub fn seen(&self) -> u32 {
        self.seen
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn last_was_correct(&self) -> bool {
        self.last_was_correct
    }

    #[must_use]
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Fraction of answers that were wrong; 0 when never seen.
    #[must_use]
    pub fn wrong_rate(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            f64::from(self.wrong) / f64::from(self.seen)
        }
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.bucket == Bucket::C
    }
}
