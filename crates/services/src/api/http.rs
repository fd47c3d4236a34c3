use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use quiz_core::model::{AnswerSet, Module, ModuleSelector, Question, Seed};

use super::wire::{self, GradeRequest, GradeResponse, ModulesResponse, QuestionsResponse};
use super::{GradeReport, HealthStatus, QuizApi};
use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct HttpQuizConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpQuizConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpQuizConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read `QUIZ_API_BASE_URL`, falling back to the local development server.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("QUIZ_API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }
}

/// `QuizApi` over the quiz HTTP backend.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    config: HttpQuizConfig,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: HttpQuizConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(HttpQuizConfig::from_env())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Malformed(err.to_string()))
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn list_modules(&self) -> Result<Vec<Module>, ApiError> {
        let response = self.client.get(self.url("modules")).send().await?;
        let body: ModulesResponse = Self::read_json(response).await?;
        debug!(count = body.modules.len(), "fetched modules");
        Ok(body.modules.iter().map(wire::module_from_value).collect())
    }

    async fn get_questions(
        &self,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<Vec<Question>, ApiError> {
        let response = self
            .client
            .get(self.url("questions"))
            .query(&[
                ("module", selector.to_string()),
                ("seed", seed.value().to_string()),
            ])
            .send()
            .await?;
        let body: QuestionsResponse = Self::read_json(response).await?;
        debug!(%selector, %seed, count = body.questions.len(), "fetched questions");
        body.into_questions()
    }

    async fn grade_quiz(
        &self,
        answers: &AnswerSet,
        selector: &ModuleSelector,
        seed: Seed,
    ) -> Result<GradeReport, ApiError> {
        let payload = GradeRequest {
            answers: GradeRequest::answers_from(answers),
            module: selector.to_string(),
            seed: seed.value(),
        };
        let response = self
            .client
            .post(self.url("grade"))
            .json(&payload)
            .send()
            .await?;
        let body: GradeResponse = Self::read_json(response).await?;
        body.into_report()
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let response = self.client.get(self.url("health")).send().await?;
        let body: Value = Self::read_json(response).await?;
        Ok(HealthStatus(body))
    }
}
