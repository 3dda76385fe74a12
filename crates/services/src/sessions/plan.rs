//! Session planning: turn a mode request into a concrete question list.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;

use quiz_core::model::{Catalog, ProgressEntry, Question, QuestionId};

use crate::error::SessionError;
use crate::sessions::select::{select_focus, select_srs};

/// How a session chooses its questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// Five SRS-weighted questions from the whole catalog.
    Quick5,
    /// Ten SRS-weighted questions from the whole catalog.
    Quick10,
    /// Wrong-first remediation over the whole catalog.
    Focus,
    /// SRS-weighted questions restricted to one subject/topic source.
    Specific(String),
    /// SRS-weighted questions restricted to a set of sources.
    Multi(Vec<String>),
}

impl SessionMode {
    /// Default session length for the mode.
    #[must_use]
    pub fn default_count(&self) -> usize {
        match self {
            Self::Quick5 => 5,
            _ => 10,
        }
    }
}

/// A planned session request: a mode plus an optional length override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub mode: SessionMode,
    pub count_override: Option<usize>,
}

impl SessionRequest {
    #[must_use]
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            count_override: None,
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count_override = Some(count);
        self
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count_override.unwrap_or_else(|| self.mode.default_count())
    }
}

/// Plan the question list for a session.
///
/// Planning is pure over its inputs: the catalog, a progress snapshot and
/// the supplied RNG. Persisted state is not touched.
///
/// # Errors
///
/// Returns `SessionError::Empty` when the candidate pool for the requested
/// mode has no questions, e.g. an unknown source filter.
pub fn plan_session<R: Rng + ?Sized>(
    catalog: &Catalog,
    progress: &HashMap<QuestionId, ProgressEntry>,
    request: &SessionRequest,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<Question>, SessionError> {
    let candidates: Vec<Question> = match &request.mode {
        SessionMode::Quick5 | SessionMode::Quick10 | SessionMode::Focus => {
            catalog.questions().to_vec()
        }
        SessionMode::Specific(source) => catalog.questions_for_source(source),
        SessionMode::Multi(sources) => catalog.questions_for_sources(sources),
    };

    if candidates.is_empty() {
        return Err(SessionError::Empty);
    }

    let count = request.count();
    let selected = match request.mode {
        SessionMode::Focus => select_focus(&candidates, progress, count, now, rng),
        _ => select_srs(&candidates, progress, count, rng),
    };

    if selected.is_empty() {
        return Err(SessionError::Empty);
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::CatalogDocument;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog() -> Catalog {
        let json = r#"{
            "subjects": {"Anatomi": ["Hjartat"], "Farmakologi": ["Antibiotika"]},
            "questions": [
                {"id": "a1", "source": "Anatomi/Hjartat", "question": "Q?",
                 "options": [{"text": "x", "correct": true}, {"text": "y", "correct": false}]},
                {"id": "a2", "source": "Anatomi/Hjartat", "question": "Q?",
                 "options": [{"text": "x", "correct": true}, {"text": "y", "correct": false}]},
                {"id": "f1", "source": "Farmakologi/Antibiotika", "question": "Q?",
                 "options": [{"text": "x", "correct": true}, {"text": "y", "correct": false}]}
            ]
        }"#;
        let document: CatalogDocument = serde_json::from_str(json).unwrap();
        Catalog::from_document(document).unwrap()
    }

    #[test]
    fn quick5_defaults_to_five_and_quick10_to_ten() {
        assert_eq!(SessionMode::Quick5.default_count(), 5);
        assert_eq!(SessionMode::Quick10.default_count(), 10);
        assert_eq!(SessionMode::Focus.default_count(), 10);
        assert_eq!(
            SessionRequest::new(SessionMode::Quick10).with_count(3).count(),
            3
        );
    }

    #[test]
    fn specific_mode_only_draws_from_its_source() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(0);
        let request = SessionRequest::new(SessionMode::Specific("Anatomi/Hjartat".into()));

        let planned =
            plan_session(&catalog, &HashMap::new(), &request, fixed_now(), &mut rng).unwrap();

        assert_eq!(planned.len(), 2);
        assert!(planned.iter().all(|q| q.source() == "Anatomi/Hjartat"));
    }

    #[test]
    fn multi_mode_merges_sources() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(0);
        let request = SessionRequest::new(SessionMode::Multi(vec![
            "Anatomi/Hjartat".into(),
            "Farmakologi/Antibiotika".into(),
        ]));

        let planned =
            plan_session(&catalog, &HashMap::new(), &request, fixed_now(), &mut rng).unwrap();
        assert_eq!(planned.len(), 3);
    }

    #[test]
    fn unknown_source_yields_empty_error() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(0);
        let request = SessionRequest::new(SessionMode::Specific("Kirurgi/Trauma".into()));

        let err =
            plan_session(&catalog, &HashMap::new(), &request, fixed_now(), &mut rng).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }
}
