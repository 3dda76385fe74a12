//! In-memory state machine for one running quiz session.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuestionId};

use crate::error::SessionError;

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Presentation of the current question: options in shuffled display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub number: usize,
    pub total: usize,
    pub id: QuestionId,
    pub text: String,
    pub option_texts: Vec<String>,
    pub image: Option<String>,
}

/// A display-index answer resolved against the canonical option order.
///
/// Resolution does not mutate the session; callers persist the outcome
/// first and then mark the question answered with `commit_answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAnswer {
    pub question_id: QuestionId,
    pub canonical_index: usize,
    pub is_correct: bool,
    pub correct_display_index: usize,
    pub feedback: String,
    pub explanation: String,
}

/// One answered question, kept for the end-of-session summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub is_correct: bool,
}

/// Totals for a finished (or abandoned) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub answered: usize,
    pub correct: usize,
    pub total: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A quiz session over a planned question list.
///
/// The session owns presentation order only; mastery state lives in the
/// progress store and is written by the caller between `resolve_answer`
/// and `commit_answer`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    display_order: Vec<usize>,
    answered_current: bool,
    answers: Vec<AnswerOutcome>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over a non-empty planned question list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty list.
    pub fn new<R: Rng + ?Sized>(
        questions: Vec<Question>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let display_order = shuffled_order(questions[0].options().len(), rng);
        Ok(Self {
            questions,
            current: 0,
            display_order,
            answered_current: false,
            answers: Vec::new(),
            started_at: now,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// The current question in display order, `None` once complete.
    #[must_use]
    pub fn current_question(&self) -> Option<QuestionView> {
        if self.is_complete() {
            return None;
        }
        let question = &self.questions[self.current];
        Some(QuestionView {
            number: self.current + 1,
            total: self.questions.len(),
            id: question.id().clone(),
            text: question.text().to_owned(),
            option_texts: self
                .display_order
                .iter()
                .map(|&canonical| question.options()[canonical].text.clone())
                .collect(),
            image: question.image().map(str::to_owned),
        })
    }

    /// Resolve a display-index answer for the current question.
    ///
    /// # Errors
    ///
    /// `Completed` when the session is over, `AlreadyAnswered` when the
    /// current question was already graded, `InvalidOption` when the index
    /// is outside the displayed options.
    pub fn resolve_answer(&self, display_index: usize) -> Result<ResolvedAnswer, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.answered_current {
            return Err(SessionError::AlreadyAnswered);
        }
        let Some(&canonical_index) = self.display_order.get(display_index) else {
            return Err(SessionError::InvalidOption {
                index: display_index,
            });
        };

        let question = &self.questions[self.current];
        let option = &question.options()[canonical_index];
        let correct_canonical = question.correct_index();
        let correct_display_index = self
            .display_order
            .iter()
            .position(|&c| c == correct_canonical)
            .unwrap_or(0);

        Ok(ResolvedAnswer {
            question_id: question.id().clone(),
            canonical_index,
            is_correct: canonical_index == correct_canonical,
            correct_display_index,
            feedback: option.feedback.clone(),
            explanation: question.explanation().to_owned(),
        })
    }

    /// Mark the current question answered with an already-resolved outcome.
    pub fn commit_answer(&mut self, resolved: &ResolvedAnswer) {
        if self.is_complete() || self.answered_current {
            return;
        }
        self.answered_current = true;
        self.answers.push(AnswerOutcome {
            question_id: resolved.question_id.clone(),
            is_correct: resolved.is_correct,
        });
    }

    /// Move to the next question, reshuffling its display order, or mark
    /// the session complete after the last one.
    pub fn advance<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) {
        if self.is_complete() {
            return;
        }
        if self.current + 1 >= self.questions.len() {
            self.completed_at = Some(now);
            return;
        }
        self.current += 1;
        self.answered_current = false;
        self.display_order = shuffled_order(self.questions[self.current].options().len(), rng);
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerOutcome] {
        &self.answers
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            answered: self.answers.len(),
            correct: self.answers.iter().filter(|a| a.is_correct).count(),
            total: self.questions.len(),
        }
    }
}

fn shuffled_order<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
