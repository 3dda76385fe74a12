//! Orchestration of a full quiz loop: plan, present, grade, persist.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use quiz_core::model::{Catalog, DailyCounter, ProgressEntry};
use quiz_core::time::Clock;

use crate::error::SessionError;
use crate::progress_service::ProgressService;
use crate::sessions::plan::{SessionRequest, plan_session};
use crate::sessions::runner::{QuestionView, QuizSession, SessionSummary};

/// Everything the interface needs to show after one graded answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAnswerResult {
    pub is_correct: bool,
    pub correct_display_index: usize,
    pub feedback: String,
    pub explanation: String,
    pub entry: ProgressEntry,
    pub daily: DailyCounter,
}

/// Drives quiz sessions against the catalog and the progress store.
///
/// Grading is persisted before the session marks a question answered, so a
/// crash mid-feedback never loses a recorded answer.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    catalog: Arc<Catalog>,
    progress: ProgressService,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: ProgressService) -> Self {
        Self {
            clock: Clock::default(),
            catalog,
            progress,
        }
    }

    /// Override the clock (usually for deterministic testing). The progress
    /// service keeps its own clock; pass the same one to both for coherent
    /// timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Plan and start a new session for the request.
    ///
    /// # Errors
    ///
    /// `SessionError::Empty` when the mode's candidate pool is empty, or a
    /// storage error from reading the progress snapshot.
    pub async fn start_session(
        &self,
        request: &SessionRequest,
    ) -> Result<QuizSession, SessionError> {
        let snapshot = self.progress.snapshot().await.map_err(SessionError::from)?;
        let mut rng = rand::rng();
        let planned = plan_session(&self.catalog, &snapshot, request, self.clock.now(), &mut rng)?;
        QuizSession::new(planned, self.clock.now(), &mut rng)
    }

    /// Current question view, `None` once the session is complete.
    #[must_use]
    pub fn current_question(&self, session: &QuizSession) -> Option<QuestionView> {
        session.current_question()
    }

    /// Grade the current question with a display-index answer.
    ///
    /// The answer is persisted (mastery entry and daily counter) before the
    /// session state is advanced to answered.
    ///
    /// # Errors
    ///
    /// Session-state errors from `QuizSession::resolve_answer`, or a storage
    /// error from persisting the outcome.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        display_index: usize,
    ) -> Result<SessionAnswerResult, SessionError> {
        let resolved = session.resolve_answer(display_index)?;
        let recorded = self
            .progress
            .record_answer(&resolved.question_id, resolved.is_correct)
            .await?;
        session.commit_answer(&resolved);

        Ok(SessionAnswerResult {
            is_correct: resolved.is_correct,
            correct_display_index: resolved.correct_display_index,
            feedback: resolved.feedback,
            explanation: resolved.explanation,
            entry: recorded.entry,
            daily: recorded.daily,
        })
    }

    /// Advance to the next question or complete the session.
    pub fn advance(&self, session: &mut QuizSession) {
        let mut rng = rand::rng();
        session.advance(self.clock.now(), &mut rng);
    }

    #[must_use]
    pub fn summary(&self, session: &QuizSession) -> SessionSummary {
        session.summary()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::plan::SessionMode;
    use quiz_core::model::{Bucket, CatalogDocument};
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn catalog() -> Arc<Catalog> {
        let json = r#"{
            "subjects": {"Anatomi": ["Hjartat"]},
            "questions": [
                {"id": "q1", "source": "Anatomi/Hjartat", "question": "Q1?",
                 "options": [{"text": "a", "correct": true, "feedback": "ja"},
                             {"text": "b", "correct": false, "feedback": "nej"}]},
                {"id": "q2", "source": "Anatomi/Hjartat", "question": "Q2?",
                 "options": [{"text": "a", "correct": false},
                             {"text": "b", "correct": true}]},
                {"id": "q3", "source": "Anatomi/Hjartat", "question": "Q3?",
                 "options": [{"text": "a", "correct": true},
                             {"text": "b", "correct": false}]}
            ]
        }"#;
        let document: CatalogDocument = serde_json::from_str(json).unwrap();
        Arc::new(Catalog::from_document(document).unwrap())
    }

    fn service(repo: &InMemoryRepository) -> SessionLoopService {
        let progress =
            ProgressService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
                .with_clock(fixed_clock());
        SessionLoopService::new(catalog(), progress).with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn full_session_grades_and_persists_every_answer() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let request = SessionRequest::new(SessionMode::Quick5);

        let mut session = service.start_session(&request).await.unwrap();
        assert_eq!(session.total(), 3);

        while let Some(view) = service.current_question(&session) {
            let result = service.answer_current(&mut session, 0).await.unwrap();
            assert!(result.entry.seen() >= 1);
            assert!(view.number <= view.total);
            service.advance(&mut session);
        }

        assert!(session.is_complete());
        let summary = service.summary(&session);
        assert_eq!(summary.answered, 3);

        let snapshot = service.progress.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn correct_answer_promotes_and_counts_the_day() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let request = SessionRequest::new(SessionMode::Quick5).with_count(1);

        let mut session = service.start_session(&request).await.unwrap();
        let view = service.current_question(&session).unwrap();
        let question = catalog()
            .questions()
            .iter()
            .find(|q| q.id() == &view.id)
            .cloned()
            .unwrap();
        let correct_text = &question.options()[question.correct_index()].text;
        let slot = view
            .option_texts
            .iter()
            .position(|t| t == correct_text)
            .unwrap();

        let result = service.answer_current(&mut session, slot).await.unwrap();

        assert!(result.is_correct);
        assert_eq!(result.correct_display_index, slot);
        assert_eq!(result.entry.bucket(), Bucket::B);
        assert_eq!(result.daily.seen(), 1);
        assert_eq!(result.daily.correct(), 1);
    }

    #[tokio::test]
    async fn double_grading_is_rejected_without_touching_storage() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let request = SessionRequest::new(SessionMode::Quick5).with_count(1);

        let mut session = service.start_session(&request).await.unwrap();
        service.answer_current(&mut session, 0).await.unwrap();
        let err = service.answer_current(&mut session, 0).await.unwrap_err();

        assert!(matches!(err, SessionError::AlreadyAnswered));
        let snapshot = service.progress.snapshot().await.unwrap();
        assert_eq!(snapshot.values().map(|e| e.seen()).sum::<u32>(), 1);
    }

    #[tokio::test]
    async fn unknown_source_fails_to_start() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let request = SessionRequest::new(SessionMode::Specific("Kirurgi/Trauma".into()));

        let err = service.start_session(&request).await.unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }
}
