use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use quiz_core::Sequencer;
use quiz_core::model::{AnswerSet, GradeResult, Module, ModuleSelector, Question, Seed};
use quiz_core::score::ScoreSummary;
use storage::repository::QuestionBank;

use super::{GradeReport, GradedQuestion, HealthStatus, QuizApi};
use crate::error::ApiError;

/// `QuizApi` served in process from a `QuestionBank`.
#[derive(Clone)]
pub struct LocalQuizApi {
    bank: Arc<dyn QuestionBank>,
}

impl LocalQuizApi {
    #[must_use]
    pub fn new(bank: Arc<dyn QuestionBank>) -> Self {
        Self { bank }
    }

    async fn sequenced(
        &self,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<Vec<Question>, ApiError> {
        let scope = self.bank.questions(selector).await?;
        Ok(Sequencer::new(seed).sequence(scope))
    }
}

#[async_trait]
impl QuizApi for LocalQuizApi {
    async fn list_modules(&self) -> Result<Vec<Module>, ApiError> {
        Ok(self.bank.list_modules().await?)
    }

    async fn get_questions(
        &self,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<Vec<Question>, ApiError> {
        let questions = self.sequenced(selector, seed).await?;
        debug!(%selector, %seed, count = questions.len(), "sequenced questions");
        Ok(questions)
    }

    async fn grade_quiz(
        &self,
        answers: &AnswerSet,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<GradeReport, ApiError> {
        if answers.is_empty() {
            return Err(ApiError::InvalidRequest("no answers provided".into()));
        }

        let questions = self.sequenced(selector, seed).await?;
        let results: Vec<GradedQuestion> = questions
            .iter()
            .map(|question| GradedQuestion {
                result: GradeResult::evaluate(question, &answers.selection(question.id())),
                question_text: question.text().to_owned(),
                options: question.options().to_vec(),
            })
            .collect();

        let summary = ScoreSummary::from_results(results.iter().map(|g| &g.result), results.len());
        debug!(%selector, %seed, score = summary.score, total = summary.total, "graded quiz");
        Ok(GradeReport {
            score: summary.score,
            total: summary.total,
            percentage: f64::from(summary.percentage),
            results,
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let modules = self.bank.list_modules().await?;
        let total_questions = self.bank.question_count().await?;
        Ok(HealthStatus(json!({
            "status": "healthy",
            "totalQuestions": total_questions,
            "modules": modules.len(),
        })))
    }
}
