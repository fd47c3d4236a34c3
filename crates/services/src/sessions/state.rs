use std::fmt;
use std::str::FromStr;

use quiz_core::model::{GradeResult, OptionSet};

/// When answers are graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradingMode {
    /// Feedback on every toggle; questions lock when the user advances past them.
    #[default]
    Immediate,
    /// Nothing is graded until the whole quiz is submitted.
    Batch,
}

impl GradingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GradingMode::Immediate => "immediate",
            GradingMode::Batch => "batch",
        }
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a grading mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grading mode: {0} (expected immediate or batch)")]
pub struct ParseGradingModeError(String);

impl FromStr for GradingMode {
    type Err = ParseGradingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(GradingMode::Immediate),
            "batch" => Ok(GradingMode::Batch),
            other => Err(ParseGradingModeError(other.to_owned())),
        }
    }
}

/// Tagged per-question record held by the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuestionState {
    #[default]
    Unanswered,
    /// Selection is still editable. `provisional` is only filled in immediate mode.
    Answered {
        selection: OptionSet,
        provisional: Option<GradeResult>,
    },
    /// Locked; the result is final.
    Graded(GradeResult),
}

impl QuestionState {
    /// Current selection; empty when unanswered.
    #[must_use]
    pub fn selection(&self) -> OptionSet {
        match self {
            QuestionState::Unanswered => OptionSet::new(),
            QuestionState::Answered { selection, .. } => selection.clone(),
            QuestionState::Graded(result) => result.selected.clone(),
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        match self {
            QuestionState::Unanswered => false,
            QuestionState::Answered { .. } => true,
            QuestionState::Graded(result) => !result.selected.is_empty(),
        }
    }

    #[must_use]
    pub fn is_graded(&self) -> bool {
        matches!(self, QuestionState::Graded(_))
    }

    /// Final result, if locked.
    #[must_use]
    pub fn final_result(&self) -> Option<&GradeResult> {
        match self {
            QuestionState::Graded(result) => Some(result),
            _ => None,
        }
    }

    /// Final or provisional result, whichever exists.
    #[must_use]
    pub fn feedback(&self) -> Option<&GradeResult> {
        match self {
            QuestionState::Unanswered => None,
            QuestionState::Answered { provisional, .. } => provisional.as_ref(),
            QuestionState::Graded(result) => Some(result),
        }
    }
}
