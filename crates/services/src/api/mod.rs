//! The quiz collaborator: module list, question sets, batch grading, health.

mod http;
mod local;
pub(crate) mod wire;

use async_trait::async_trait;
use serde_json::Value;

use quiz_core::model::{AnswerSet, GradeResult, Module, ModuleSelector, Question, Seed};

use crate::error::ApiError;

pub use http::{HttpQuizApi, HttpQuizConfig};
pub use local::LocalQuizApi;

/// Batch grading response as reported by the collaborator.
///
/// `score`/`percentage` are informational; sessions recompute them from `results`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub results: Vec<GradedQuestion>,
}

/// One graded question with the display data the collaborator sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedQuestion {
    pub result: GradeResult,
    pub question_text: String,
    pub options: Vec<String>,
}

/// Opaque health payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus(pub Value);

impl HealthStatus {
    /// The `status` field, when present.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }
}

/// Operations the quiz player consumes. Failures are never retried here.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` if the module list cannot be fetched.
    async fn list_modules(&self) -> Result<Vec<Module>, ApiError>;

    /// Questions for `selector`, in the order produced by `seed`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Malformed` if any question fails validation, or another
    /// `ApiError` if the fetch fails.
    async fn get_questions(
        &self,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<Vec<Question>, ApiError>;

    /// Grade a whole answer set for the quiz identified by `selector` and `seed`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if grading fails.
    async fn grade_quiz(
        &self,
        answers: &AnswerSet,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<GradeReport, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the collaborator is unreachable.
    async fn health_check(&self) -> Result<HealthStatus, ApiError>;
}
