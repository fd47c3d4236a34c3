use thiserror::Error;

use crate::grading;
use crate::model::answer::OptionSet;
use crate::model::ids::{IdError, ModuleId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("a question needs at least one correct option")]
    NoCorrectOption,

    #[error("correct option {index} is out of range for {options} options")]
    CorrectOutOfRange { index: usize, options: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question fields as they arrive from a bank or the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub id: String,
    pub module: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct: Vec<usize>,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for blank ids/text/options, fewer than two options,
    /// an empty correct set, or a correct index outside the option list.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = QuestionId::new(self.id)?;
        let module = ModuleId::new(self.module)?;

        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::BlankOption { index });
        }

        let correct: OptionSet = self.correct.into_iter().collect();
        match correct.max() {
            None => return Err(QuestionError::NoCorrectOption),
            Some(index) if index >= self.options.len() => {
                return Err(QuestionError::CorrectOutOfRange {
                    index,
                    options: self.options.len(),
                });
            }
            Some(_) => {}
        }

        let explanation = self
            .explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Question {
            id,
            module,
            text: text.to_owned(),
            options: self.options,
            correct,
            explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Option identity is its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    module: ModuleId,
    text: String,
    options: Vec<String>,
    correct: OptionSet,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct(&self) -> &OptionSet {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// More than one option must be picked to answer correctly.
    #[must_use]
    pub fn is_multi_select(&self) -> bool {
        self.correct.len() > 1
    }

    /// The question's own explanation, or one listing the correct option letters.
    #[must_use]
    pub fn explanation_or_default(&self) -> String {
        self.explanation
            .clone()
            .unwrap_or_else(|| grading::default_explanation(&self.correct))
    }
}
