use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{Question, QuestionDraft, QuestionError, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("duplicate question id {id}")]
    DuplicateId { id: QuestionId },
}

/// Raw content document as emitted by the bundling pipeline:
/// a subject → topic index plus a flat question list. Extra fields such as
/// the bundle `meta` block are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub subjects: BTreeMap<String, Vec<String>>,
    pub questions: Vec<QuestionDraft>,
}

/// The validated, immutable question catalog for one process run.
#[derive(Debug, Clone)]
pub struct Catalog {
    subjects: BTreeMap<String, Vec<String>>,
    questions: Vec<Question>,
}

impl Catalog {
    /// Validate a raw document into a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Question` when any question fails the
    /// exactly-one-correct-option invariant, and `CatalogError::DuplicateId`
    /// when two questions share an id.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut seen_ids: HashSet<QuestionId> = HashSet::with_capacity(document.questions.len());
        let mut questions = Vec::with_capacity(document.questions.len());

        for draft in document.questions {
            let question = draft.validate()?;
            if !seen_ids.insert(question.id().clone()) {
                return Err(CatalogError::DuplicateId {
                    id: question.id().clone(),
                });
            }
            questions.push(question);
        }

        Ok(Self {
            subjects: document.subjects,
            questions,
        })
    }

    /// Subject folder → ordered topic file names, as authored.
    #[must_use]
    pub fn subjects(&self) -> &BTreeMap<String, Vec<String>> {
        &self.subjects
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.questions.iter().any(|q| q.id() == id)
    }

    /// Questions bundled from one subject/topic path.
    #[must_use]
    pub fn questions_for_source(&self, source: &str) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.source() == source)
            .cloned()
            .collect()
    }

    /// Questions bundled from any of the given subject/topic paths.
    #[must_use]
    pub fn questions_for_sources(&self, sources: &[String]) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| sources.iter().any(|s| s == q.source()))
            .cloned()
            .collect()
    }

    /// Question count per source path, for the dashboard.
    #[must_use]
    pub fn source_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for question in &self.questions {
            *counts.entry(question.source().to_owned()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn draft(id: &str, source: &str) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            source: source.into(),
            question: "Q?".into(),
            options: vec![
                AnswerOption {
                    text: "fel".into(),
                    correct: false,
                    feedback: String::new(),
                },
                AnswerOption {
                    text: "rätt".into(),
                    correct: true,
                    feedback: String::new(),
                },
            ],
            tags: Vec::new(),
            explanation: String::new(),
            image: None,
        }
    }

    fn document(drafts: Vec<QuestionDraft>) -> CatalogDocument {
        let mut subjects = BTreeMap::new();
        subjects.insert("Anatomi".to_string(), vec!["Hjartat".to_string()]);
        CatalogDocument {
            subjects,
            questions: drafts,
        }
    }

    #[test]
    fn builds_catalog_and_filters_by_source() {
        let catalog = Catalog::from_document(document(vec![
            draft("q1", "Anatomi/Hjartat"),
            draft("q2", "Anatomi/Hjartat"),
            draft("q3", "Farmakologi/Antibiotika"),
        ]))
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.questions_for_source("Anatomi/Hjartat").len(), 2);
        assert_eq!(
            catalog
                .questions_for_sources(&["Farmakologi/Antibiotika".into()])
                .len(),
            1
        );
        assert!(catalog.contains(&QuestionId::new("q2")));
        assert!(!catalog.contains(&QuestionId::new("q9")));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::from_document(document(vec![
            draft("q1", "Anatomi/Hjartat"),
            draft("q1", "Anatomi/Hjartat"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[test]
    fn propagates_question_validation_failures() {
        let mut bad = draft("q1", "Anatomi/Hjartat");
        for option in &mut bad.options {
            option.correct = false;
        }
        let err = Catalog::from_document(document(vec![bad])).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Question(QuestionError::NoCorrectOption { .. })
        ));
    }

    #[test]
    fn source_counts_cover_every_source() {
        let catalog = Catalog::from_document(document(vec![
            draft("q1", "Anatomi/Hjartat"),
            draft("q2", "Anatomi/Hjartat"),
            draft("q3", "Farmakologi/Antibiotika"),
        ]))
        .unwrap();

        let counts = catalog.source_counts();
        assert_eq!(counts.get("Anatomi/Hjartat"), Some(&2));
        assert_eq!(counts.get("Farmakologi/Antibiotika"), Some(&1));
    }
}
