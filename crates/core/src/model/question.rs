use serde::Deserialize;
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} has no correct option")]
    NoCorrectOption { id: QuestionId },

    #[error("question {id} has {count} correct options, expected exactly one")]
    MultipleCorrectOptions { id: QuestionId, count: usize },
}

/// One selectable answer with per-option feedback text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub correct: bool,
    #[serde(default)]
    pub feedback: String,
}

/// Unvalidated question as it appears in the bundled content document.
///
/// The content pipeline is supposed to emit exactly one correct option per
/// question, but nothing upstream enforces it, so `validate` does.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    #[serde(default)]
    pub source: String,
    pub question: String,
    pub options: Vec<AnswerOption>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the option list is empty or does not
    /// contain exactly one correct option.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions { id: self.id });
        }

        let correct_count = self.options.iter().filter(|o| o.correct).count();
        match correct_count {
            1 => Ok(Question {
                id: self.id,
                source: self.source,
                question: self.question,
                options: self.options,
                tags: self.tags,
                explanation: self.explanation,
                image: self.image,
            }),
            0 => Err(QuestionError::NoCorrectOption { id: self.id }),
            count => Err(QuestionError::MultipleCorrectOptions { id: self.id, count }),
        }
    }
}

/// A validated multiple-choice question, immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    source: String,
    question: String,
    options: Vec<AnswerOption>,
    tags: Vec<String>,
    explanation: String,
    image: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Subject/topic path this question was bundled from, e.g. `Anatomi/Hjartat`.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.question
    }

    /// Options in canonical (authored) order.
    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&AnswerOption> {
        self.options.get(index)
    }

    /// Canonical index of the single correct option.
    ///
    /// Validation guarantees exactly one correct option exists.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.options
            .iter()
            .position(|o| o.correct)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}
