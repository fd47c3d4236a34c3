//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuestionId;
use storage::repository::StorageError;

use crate::sessions::GradingMode;

/// Errors emitted by `QuizApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("quiz api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How a user recovers from a failed quiz action. No action is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Reload,
    Retry,
    ReturnHome,
}

/// Failures surfaced to the user by the quiz loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("failed to fetch modules: {0}")]
    FetchModulesFailed(#[source] ApiError),
    #[error("failed to fetch questions: {0}")]
    FetchQuestionsFailed(#[source] ApiError),
    #[error("failed to submit answers for grading: {0}")]
    GradeSubmissionFailed(#[source] ApiError),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl QuizError {
    /// Message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            QuizError::FetchModulesFailed(err) => {
                format!("Could not load the module list: {err}")
            }
            QuizError::FetchQuestionsFailed(_) => {
                "Could not load the questions. Please try again.".to_owned()
            }
            QuizError::GradeSubmissionFailed(_) => {
                "Could not submit your answers for grading.".to_owned()
            }
            QuizError::MalformedResponse(_) => {
                "The quiz server sent data that could not be understood.".to_owned()
            }
            QuizError::Session(err) => err.to_string(),
        }
    }

    /// The single recovery action offered with the message.
    #[must_use]
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            QuizError::FetchModulesFailed(_) => RecoveryAction::Reload,
            QuizError::GradeSubmissionFailed(_) => RecoveryAction::Retry,
            QuizError::FetchQuestionsFailed(_)
            | QuizError::MalformedResponse(_)
            | QuizError::Session(_) => RecoveryAction::ReturnHome,
        }
    }

    /// Wrap a question fetch failure, keeping malformed payloads distinct.
    pub(crate) fn from_questions_fetch(err: ApiError) -> Self {
        match err {
            ApiError::Malformed(message) => QuizError::MalformedResponse(message),
            other => QuizError::FetchQuestionsFailed(other),
        }
    }
}

/// Errors emitted by the quiz session state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already finished")]
    Finished,
    #[error("question {index} is out of range for a session of {len}")]
    QuestionOutOfRange { index: usize, len: usize },
    #[error("option {option} is out of range for a question with {options} options")]
    OptionOutOfRange { option: usize, options: usize },
    #[error("question {0} is already graded")]
    Locked(QuestionId),
    #[error("operation is only available in {expected:?} grading mode")]
    WrongMode { expected: GradingMode },
    #[error("grading results do not match the session: {0}")]
    MismatchedResults(String),
}
