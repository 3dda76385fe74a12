//! Question selection: SRS-weighted sampling and wrong-first focus ranking.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use std::collections::HashMap;

use quiz_core::model::{Bucket, ProgressEntry, Question, QuestionId};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Base sampling weights for buckets A, B, C in slot order; renormalized
/// over whichever buckets are non-empty at each draw.
const SRS_WEIGHTS: [f64; 3] = [0.7, 0.2, 0.1];

/// Focus scoring constants.
const SEEN_BONUS: f64 = 1.0;
const EVER_WRONG_BONUS: f64 = 1000.0;
const WRONG_RATE_WEIGHT: f64 = 200.0;
const LAST_WRONG_BONUS: f64 = 250.0;
const RECENCY_WEIGHT: f64 = 50.0;
const RECENCY_WINDOW_DAYS: f64 = 14.0;
/// Upper bound (exclusive) of the uniform jitter tie-breaker.
pub const FOCUS_JITTER_MAX: f64 = 0.5;

fn bucket_slot(bucket: Bucket) -> usize {
    match bucket {
        Bucket::A => 0,
        Bucket::B => 1,
        Bucket::C => 2,
    }
}

fn bucket_of(progress: &HashMap<QuestionId, ProgressEntry>, question: &Question) -> Bucket {
    progress
        .get(question.id())
        .map(ProgressEntry::bucket)
        .unwrap_or_default()
}

fn score_desc(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal)
}

/// Spaced-repetition weighted selection.
///
/// Draws without replacement, one question at a time: pick a bucket by
/// weight among the buckets that still have questions (absent progress means
/// bucket A), then a uniform element from it. When the pool is no larger
/// than `count` the whole pool is returned in uniform random order.
///
/// Returns `min(count, candidates.len())` unique questions.
pub fn select_srs<R: Rng + ?Sized>(
    candidates: &[Question],
    progress: &HashMap<QuestionId, ProgressEntry>,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    if count == 0 || candidates.is_empty() {
        return Vec::new();
    }

    if candidates.len() <= count {
        let mut all: Vec<Question> = candidates.to_vec();
        all.shuffle(rng);
        return all;
    }

    let mut buckets: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (index, question) in candidates.iter().enumerate() {
        buckets[bucket_slot(bucket_of(progress, question))].push(index);
    }

    let mut picked: Vec<Question> = Vec::with_capacity(count);
    let mut taken = vec![false; candidates.len()];

    while picked.len() < count {
        let total: f64 = SRS_WEIGHTS
            .iter()
            .enumerate()
            .filter(|(slot, _)| !buckets[*slot].is_empty())
            .map(|(_, weight)| *weight)
            .sum();
        if total <= 0.0 {
            break;
        }

        let mut draw = rng.random_range(0.0..total);
        let mut chosen = None;
        for (slot, weight) in SRS_WEIGHTS.iter().enumerate() {
            if buckets[slot].is_empty() {
                continue;
            }
            if draw < *weight {
                chosen = Some(slot);
                break;
            }
            draw -= weight;
        }
        // Float rounding at the upper edge: fall back to the last non-empty bucket.
        let Some(slot) = chosen.or_else(|| (0..3).rev().find(|s| !buckets[*s].is_empty())) else {
            break;
        };

        let position = rng.random_range(0..buckets[slot].len());
        let index = buckets[slot].swap_remove(position);
        taken[index] = true;
        picked.push(candidates[index].clone());
    }

    // Defensive backfill: should not trigger under correct bucket bookkeeping.
    if picked.len() < count {
        let mut rest: Vec<Question> = candidates
            .iter()
            .enumerate()
            .filter(|(index, _)| !taken[*index])
            .map(|(_, q)| q.clone())
            .collect();
        rest.shuffle(rng);
        let shortfall = count - picked.len();
        picked.extend(rest.into_iter().take(shortfall));
    }

    picked
}

/// Focus score: a pure function of one question's history.
///
/// Higher means more in need of remediation. `jitter` is a uniform
/// tie-breaker in `[0, FOCUS_JITTER_MAX)` supplied by the caller so the
/// scoring itself stays deterministic and unit-testable.
#[must_use]
pub fn focus_score(entry: Option<&ProgressEntry>, now: DateTime<Utc>, jitter: f64) -> f64 {
    let mut score = jitter;
    let Some(entry) = entry else {
        return score;
    };
    if entry.seen() == 0 {
        return score;
    }

    score += SEEN_BONUS;
    if entry.wrong() > 0 {
        score += EVER_WRONG_BONUS;
    }
    score += WRONG_RATE_WEIGHT * entry.wrong_rate();
    if !entry.last_was_correct() {
        score += LAST_WRONG_BONUS;
    }

    #[allow(clippy::cast_precision_loss)]
    let days_since = now.signed_duration_since(entry.last_seen()).num_seconds() as f64
        / SECONDS_PER_DAY;
    score += RECENCY_WEIGHT * (1.0 - days_since / RECENCY_WINDOW_DAYS).max(0.0);

    score
}

/// Membership test for the focus pool: a wrong-answer history, or a miss on
/// the most recent attempt.
fn in_focus_pool(entry: &ProgressEntry) -> bool {
    (entry.seen() > 0 && entry.wrong() > 0) || (entry.seen() > 0 && !entry.last_was_correct())
}

/// Wrong-first selection.
///
/// Scores every candidate, keeps only the focus pool, takes the top `count`
/// by score, and backfills any shortfall with SRS selection over the
/// remaining candidates.
///
/// Returns `min(count, candidates.len())` unique questions.
pub fn select_focus<R: Rng + ?Sized>(
    candidates: &[Question],
    progress: &HashMap<QuestionId, ProgressEntry>,
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Question> {
    if count == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, usize)> = candidates
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let jitter = rng.random_range(0.0..FOCUS_JITTER_MAX);
            (
                focus_score(progress.get(question.id()), now, jitter),
                index,
            )
        })
        .collect();
    scored.sort_by(score_desc);

    let mut picked: Vec<Question> = Vec::with_capacity(count);
    let mut taken = vec![false; candidates.len()];
    for (_, index) in &scored {
        if picked.len() >= count {
            break;
        }
        let question = &candidates[*index];
        if progress.get(question.id()).is_some_and(in_focus_pool) {
            taken[*index] = true;
            picked.push(question.clone());
        }
    }

    if picked.len() < count {
        let rest: Vec<Question> = candidates
            .iter()
            .enumerate()
            .filter(|(index, _)| !taken[*index])
            .map(|(_, q)| q.clone())
            .collect();
        let shortfall = count - picked.len();
        picked.extend(select_srs(&rest, progress, shortfall, rng));
    }

    picked
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
