use std::sync::Arc;

use tracing::{info, warn};

use quiz_core::model::{GradeResult, Module, ModuleSelector, Seed};
use quiz_core::score::ScoreSummary;
use quiz_core::{Clock, SeedSource};

use crate::api::{HealthStatus, QuizApi};
use crate::error::{ApiError, QuizError, SessionError};
use super::service::QuizSession;
use super::state::GradingMode;

/// What the player shows around a session.
#[derive(Debug)]
pub enum QuizScreen {
    /// Questions for `selector`/`seed` are being fetched.
    Loading { selector: ModuleSelector, seed: Seed },
    /// The scope was empty; distinct from a failure.
    NoQuestions { selector: ModuleSelector, seed: Seed },
    Ready(QuizSession),
    Failed(QuizError),
}

impl QuizScreen {
    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match self {
            QuizScreen::Ready(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_session(self) -> Option<QuizSession> {
        match self {
            QuizScreen::Ready(session) => Some(session),
            _ => None,
        }
    }
}

/// Orchestrates quiz start, retry and grading against a `QuizApi`.
#[derive(Clone)]
pub struct QuizLoopService {
    api: Arc<dyn QuizApi>,
    seeds: SeedSource,
    mode: GradingMode,
    clock: Clock,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self {
            api,
            seeds: SeedSource::default(),
            mode: GradingMode::default(),
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: GradingMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_seeds(mut self, seeds: SeedSource) -> Self {
        self.seeds = seeds;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn mode(&self) -> GradingMode {
        self.mode
    }

    /// Fetch the module list.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::FetchModulesFailed` if the collaborator fails.
    pub async fn modules(&self) -> Result<Vec<Module>, QuizError> {
        self.api
            .list_modules()
            .await
            .map_err(QuizError::FetchModulesFailed)
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the collaborator is unreachable.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.api.health_check().await
    }

    /// Draw a fresh seed for `selector` and return the loading screen for it.
    #[must_use]
    pub fn loading(&self, selector: ModuleSelector) -> QuizScreen {
        QuizScreen::Loading {
            selector,
            seed: self.seeds.next_seed(),
        }
    }

    /// Start a quiz with a freshly drawn seed.
    pub async fn start(&self, selector: ModuleSelector) -> QuizScreen {
        let seed = self.seeds.next_seed();
        self.start_with_seed(selector, seed).await
    }

    /// Start a quiz with a known seed, reproducing its question order.
    pub async fn start_with_seed(&self, selector: ModuleSelector, seed: Seed) -> QuizScreen {
        let questions = match self.api.get_questions(&selector, seed).await {
            Ok(questions) => questions,
            Err(err) => {
                warn!(%selector, %seed, error = %err, "failed to fetch questions");
                return QuizScreen::Failed(QuizError::from_questions_fetch(err));
            }
        };
        if questions.is_empty() {
            info!(%selector, %seed, "no questions in scope");
            return QuizScreen::NoQuestions { selector, seed };
        }

        let count = questions.len();
        match QuizSession::new(selector, seed, self.mode, questions, self.clock.now()) {
            Ok(session) => {
                info!(
                    selector = %session.selector(),
                    %seed,
                    mode = %self.mode,
                    questions = count,
                    "quiz started"
                );
                QuizScreen::Ready(session)
            }
            Err(err) => QuizScreen::Failed(err.into()),
        }
    }

    /// Resume from a loading screen; other screens are returned unchanged.
    pub async fn resolve(&self, screen: QuizScreen) -> QuizScreen {
        match screen {
            QuizScreen::Loading { selector, seed } => self.start_with_seed(selector, seed).await,
            other => other,
        }
    }

    /// Discard `session` entirely and start over on the same scope with a new seed.
    pub async fn retry(&self, session: QuizSession) -> QuizScreen {
        let selector = session.selector().clone();
        drop(session);
        self.start(selector).await
    }

    /// Send a batch-mode session for grading and install the results.
    ///
    /// On failure the session stays open so the user can retry the submit.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::GradeSubmissionFailed` if the collaborator fails,
    /// `QuizError::MalformedResponse` if the results do not cover the session,
    /// and `QuizError::Session` for mode or state violations.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<ScoreSummary, QuizError> {
        if session.mode() != GradingMode::Batch {
            return Err(SessionError::WrongMode {
                expected: GradingMode::Batch,
            }
            .into());
        }
        if session.is_finished() {
            return Err(SessionError::Finished.into());
        }

        let report = self
            .api
            .grade_quiz(&session.answers(), session.selector(), session.seed())
            .await
            .map_err(|err| {
                warn!(error = %err, "grade submission failed");
                QuizError::GradeSubmissionFailed(err)
            })?;

        let reported = (report.score, report.total);
        let results: Vec<GradeResult> = report.results.into_iter().map(|g| g.result).collect();
        let summary = session
            .apply_batch_results(results, self.clock.now())
            .map_err(|err| match err {
                SessionError::MismatchedResults(message) => QuizError::MalformedResponse(message),
                other => QuizError::Session(other),
            })?;

        if reported != (summary.score, summary.total) {
            warn!(
                reported_score = reported.0,
                reported_total = reported.1,
                score = summary.score,
                total = summary.total,
                "reported score disagrees with local grading"
            );
        }
        Ok(summary)
    }

    /// Finish `session` the way its grading mode requires.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::finish`] and [`QuizLoopService::submit`].
    pub async fn finish(&self, session: &mut QuizSession) -> Result<ScoreSummary, QuizError> {
        match session.mode() {
            GradingMode::Immediate => Ok(session.finish(self.clock.now())?),
            GradingMode::Batch => self.submit(session).await,
        }
    }
}
