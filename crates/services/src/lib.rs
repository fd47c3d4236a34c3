#![forbid(unsafe_code)]

pub mod api;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use api::{GradeReport, GradedQuestion, HealthStatus, HttpQuizApi, HttpQuizConfig, LocalQuizApi, QuizApi};
pub use error::{ApiError, QuizError, RecoveryAction, SessionError};

pub use sessions::{
    GradingMode, QuestionState, QuestionView, QuizLoopService, QuizOutcome, QuizScreen,
    QuizSession, SessionProgress,
};
