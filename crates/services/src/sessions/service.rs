use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use quiz_core::model::{AnswerSet, GradeResult, ModuleSelector, Question, QuestionId, Seed};
use quiz_core::score::ScoreSummary;

use crate::error::SessionError;
use super::progress::SessionProgress;
use super::state::{GradingMode, QuestionState};
use super::view::{QuestionView, QuizOutcome};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz over a sequenced question list.
///
/// The question order is fixed at construction. Each question carries one
/// [`QuestionState`]; the score is always derived from the graded states.
pub struct QuizSession {
    selector: ModuleSelector,
    seed: Seed,
    mode: GradingMode,
    questions: Vec<Question>,
    states: Vec<QuestionState>,
    cursor: usize,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session over already-sequenced questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        selector: ModuleSelector,
        seed: Seed,
        mode: GradingMode,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let states = vec![QuestionState::Unanswered; questions.len()];
        Ok(Self {
            selector,
            seed,
            mode,
            questions,
            states,
            cursor: 0,
            started_at,
            finished_at: None,
        })
    }

    #[must_use]
    pub fn selector(&self) -> &ModuleSelector {
        &self.selector
    }

    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    #[must_use]
    pub fn mode(&self) -> GradingMode {
        self.mode
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false`; an empty session cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    #[must_use]
    pub fn current_state(&self) -> &QuestionState {
        &self.states[self.cursor]
    }

    #[must_use]
    pub fn state(&self, index: usize) -> Option<&QuestionState> {
        self.states.get(index)
    }

    #[must_use]
    pub fn current_view(&self) -> QuestionView {
        QuestionView::build(
            self.cursor,
            self.len(),
            self.current_question(),
            self.current_state(),
        )
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Toggle `option` on the question under the cursor.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::toggle_option_at`].
    pub fn toggle_option(&mut self, option: usize) -> Result<&QuestionState, SessionError> {
        self.toggle_option_at(self.cursor, option)
    }

    /// Toggle `option` on question `index`.
    ///
    /// Single-answer questions keep at most one selection; picking another option
    /// replaces it. In immediate mode the selection is re-graded provisionally.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after the session ended,
    /// `SessionError::QuestionOutOfRange` / `SessionError::OptionOutOfRange` for bad
    /// indexes, and `SessionError::Locked` if the question is already graded.
    pub fn toggle_option_at(
        &mut self,
        index: usize,
        option: usize,
    ) -> Result<&QuestionState, SessionError> {
        self.ensure_open()?;
        let question = self.question_at(index)?;
        if option >= question.option_count() {
            return Err(SessionError::OptionOutOfRange {
                option,
                options: question.option_count(),
            });
        }
        if self.states[index].is_graded() {
            return Err(SessionError::Locked(question.id().clone()));
        }

        let mut selection = self.states[index].selection();
        selection.toggle(option, !question.is_multi_select());
        let next = if selection.is_empty() {
            QuestionState::Unanswered
        } else {
            let provisional = match self.mode {
                GradingMode::Immediate => Some(GradeResult::evaluate(question, &selection)),
                GradingMode::Batch => None,
            };
            QuestionState::Answered {
                selection,
                provisional,
            }
        };
        debug!(question = %question.id(), state = ?next, "option toggled");
        self.states[index] = next;
        Ok(&self.states[index])
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next question. Returns `false` at the last question.
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous question. Returns `false` at the first question.
    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor to `index` without grading anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionOutOfRange` if `index >= len`.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.len() {
            return Err(SessionError::QuestionOutOfRange {
                index,
                len: self.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Advance past the current question.
    ///
    /// In immediate mode an answered question is locked first; an unanswered one
    /// stays open so it can be revisited. Returns whether the cursor moved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after the session ended.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        if self.mode == GradingMode::Immediate {
            self.lock(self.cursor);
        }
        Ok(self.next())
    }

    //
    // ─── FINISHING ─────────────────────────────────────────────────────────────
    //

    /// End an immediate-mode session, locking every question still open.
    ///
    /// Unanswered questions are graded with an empty selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` in batch mode and
    /// `SessionError::Finished` if already finished.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<ScoreSummary, SessionError> {
        self.ensure_mode(GradingMode::Immediate)?;
        self.ensure_open()?;
        self.grade_open_questions();
        Ok(self.mark_finished(now))
    }

    /// Grade every question of a batch-mode session in one pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` in immediate mode and
    /// `SessionError::Finished` if already finished.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<ScoreSummary, SessionError> {
        self.ensure_mode(GradingMode::Batch)?;
        self.ensure_open()?;
        self.grade_open_questions();
        Ok(self.mark_finished(now))
    }

    /// Install results graded elsewhere and finish a batch-mode session.
    ///
    /// Every question is graded against the session's own selection. A result
    /// that echoes a different selection or verdict is logged and otherwise
    /// ignored; only its explanation text is kept. The session stays untouched
    /// unless every question has a result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` in immediate mode, `SessionError::Finished`
    /// if already finished, and `SessionError::MismatchedResults` when a question
    /// has no result.
    pub fn apply_batch_results(
        &mut self,
        results: Vec<GradeResult>,
        now: DateTime<Utc>,
    ) -> Result<ScoreSummary, SessionError> {
        self.ensure_mode(GradingMode::Batch)?;
        self.ensure_open()?;

        let mut by_id: HashMap<QuestionId, GradeResult> = results
            .into_iter()
            .map(|result| (result.question_id.clone(), result))
            .collect();

        let mut graded = Vec::with_capacity(self.len());
        for (question, state) in self.questions.iter().zip(&self.states) {
            let remote = by_id.remove(question.id()).ok_or_else(|| {
                SessionError::MismatchedResults(format!("no result for question {}", question.id()))
            })?;
            let mut local = GradeResult::evaluate(question, &state.selection());
            if remote.selected != local.selected {
                warn!(
                    question = %question.id(),
                    remote = ?remote.selected,
                    local = ?local.selected,
                    "grading result echoes a different selection"
                );
            }
            if remote.is_correct != local.is_correct || remote.correct != local.correct {
                warn!(
                    question = %question.id(),
                    remote = remote.is_correct,
                    local = local.is_correct,
                    "grading result disagrees with local grading"
                );
            }
            if !remote.explanation.trim().is_empty() {
                local.explanation = remote.explanation;
            }
            graded.push(QuestionState::Graded(local));
        }
        if !by_id.is_empty() {
            debug!(extra = by_id.len(), "ignoring results for questions outside the session");
        }

        self.states = graded;
        Ok(self.mark_finished(now))
    }

    //
    // ─── READ MODELS ───────────────────────────────────────────────────────────
    //

    /// Current selections, keyed by question id. Unanswered questions are absent.
    #[must_use]
    pub fn answers(&self) -> AnswerSet {
        self.questions
            .iter()
            .zip(&self.states)
            .map(|(question, state)| (question.id().clone(), state.selection()))
            .filter(|(_, selection)| !selection.is_empty())
            .collect()
    }

    /// Final results of locked questions, in session order.
    pub fn grade_results(&self) -> impl Iterator<Item = &GradeResult> {
        self.states.iter().filter_map(QuestionState::final_result)
    }

    /// Score over locked questions; open questions count as incorrect.
    #[must_use]
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary::from_results(self.grade_results(), self.len())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.len(),
            answered: self.states.iter().filter(|s| s.is_answered()).count(),
            graded: self.states.iter().filter(|s| s.is_graded()).count(),
            cursor: self.cursor,
            is_finished: self.is_finished(),
        }
    }

    /// Outcome of a finished session; `None` while the quiz is running.
    #[must_use]
    pub fn outcome(&self) -> Option<QuizOutcome> {
        let finished_at = self.finished_at?;
        let summary = self.summary();
        Some(QuizOutcome {
            summary,
            verdict: summary.verdict(),
            results: self.grade_results().cloned().collect(),
            selector: self.selector.clone(),
            seed: self.seed,
            started_at: self.started_at,
            finished_at,
        })
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn question_at(&self, index: usize) -> Result<&Question, SessionError> {
        self.questions
            .get(index)
            .ok_or(SessionError::QuestionOutOfRange {
                index,
                len: self.len(),
            })
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            Err(SessionError::Finished)
        } else {
            Ok(())
        }
    }

    fn ensure_mode(&self, expected: GradingMode) -> Result<(), SessionError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(SessionError::WrongMode { expected })
        }
    }

    /// Lock question `index` if it is answered.
    fn lock(&mut self, index: usize) {
        if let QuestionState::Answered { selection, .. } = &self.states[index] {
            let result = GradeResult::evaluate(&self.questions[index], selection);
            debug!(question = %result.question_id, correct = result.is_correct, "question locked");
            self.states[index] = QuestionState::Graded(result);
        }
    }

    /// Lock every question not yet graded; empty selections grade as incorrect.
    fn grade_open_questions(&mut self) {
        for (question, state) in self.questions.iter().zip(self.states.iter_mut()) {
            if !state.is_graded() {
                *state = QuestionState::Graded(GradeResult::evaluate(question, &state.selection()));
            }
        }
    }

    fn mark_finished(&mut self, now: DateTime<Utc>) -> ScoreSummary {
        self.finished_at = Some(now);
        let summary = self.summary();
        info!(
            selector = %self.selector,
            seed = %self.seed,
            score = summary.score,
            total = summary.total,
            percentage = summary.percentage,
            "quiz finished"
        );
        summary
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("selector", &self.selector)
            .field("seed", &self.seed)
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("started_at", &self.started_at)
            .field("finished_at", &self.finished_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{OptionMark, OptionSet, QuestionDraft};
    use quiz_core::time::fixed_now;

    fn question(id: &str, correct: Vec<usize>) -> Question {
        QuestionDraft {
            id: id.into(),
            module: "cds".into(),
            text: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn session(mode: GradingMode) -> QuizSession {
        QuizSession::new(
            ModuleSelector::All,
            Seed::new(7),
            mode,
            vec![
                question("q1", vec![0]),
                question("q2", vec![1, 2]),
                question("q3", vec![3]),
                question("q4", vec![1]),
            ],
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_session_returns_error() {
        let err = QuizSession::new(
            ModuleSelector::All,
            Seed::new(1),
            GradingMode::Immediate,
            Vec::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn single_select_replaces_previous_choice() {
        let mut s = session(GradingMode::Immediate);
        s.toggle_option(0).unwrap();
        s.toggle_option(1).unwrap();
        assert_eq!(s.current_state().selection(), OptionSet::from([1]));

        s.toggle_option(1).unwrap();
        assert_eq!(s.current_state(), &QuestionState::Unanswered);
    }

    #[test]
    fn multi_select_accumulates() {
        let mut s = session(GradingMode::Batch);
        s.jump_to(1).unwrap();
        s.toggle_option(2).unwrap();
        s.toggle_option(1).unwrap();
        assert_eq!(s.current_state().selection(), OptionSet::from([1, 2]));
    }

    #[test]
    fn immediate_mode_grades_provisionally_until_advance() {
        let mut s = session(GradingMode::Immediate);
        let state = s.toggle_option(1).unwrap();
        assert_eq!(state.feedback().map(|r| r.is_correct), Some(false));
        assert!(!state.is_graded());

        s.toggle_option(0).unwrap();
        assert_eq!(s.current_state().feedback().map(|r| r.is_correct), Some(true));

        assert!(s.advance().unwrap());
        assert!(s.state(0).unwrap().is_graded());
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn graded_question_rejects_toggles_and_keeps_result() {
        let mut s = session(GradingMode::Immediate);
        s.toggle_option(0).unwrap();
        s.advance().unwrap();
        let before = s.state(0).unwrap().clone();

        let err = s.toggle_option_at(0, 2).unwrap_err();
        assert!(matches!(err, SessionError::Locked(_)));
        assert_eq!(s.state(0).unwrap(), &before);

        s.jump_to(0).unwrap();
        assert_eq!(s.current_state(), &before);
        assert!(s.current_view().locked);
    }

    #[test]
    fn advance_skips_unanswered_without_locking() {
        let mut s = session(GradingMode::Immediate);
        s.advance().unwrap();
        assert_eq!(s.state(0), Some(&QuestionState::Unanswered));
        s.toggle_option_at(0, 0).unwrap();
    }

    #[test]
    fn navigation_does_not_grade() {
        let mut s = session(GradingMode::Immediate);
        s.toggle_option(0).unwrap();
        assert!(s.next());
        assert!(s.previous());
        assert!(!s.previous());
        s.jump_to(3).unwrap();
        assert!(!s.next());
        assert_eq!(s.progress().graded, 0);

        let err = s.jump_to(4).unwrap_err();
        assert_eq!(err, SessionError::QuestionOutOfRange { index: 4, len: 4 });
    }

    #[test]
    fn finish_scores_three_of_four() {
        let mut s = session(GradingMode::Immediate);
        s.toggle_option_at(0, 0).unwrap();
        s.toggle_option_at(1, 1).unwrap();
        s.toggle_option_at(1, 2).unwrap();
        s.toggle_option_at(2, 0).unwrap();
        s.toggle_option_at(3, 1).unwrap();

        let summary = s.finish(fixed_now()).unwrap();
        assert_eq!((summary.score, summary.total, summary.percentage), (3, 4, 75));
        assert!(s.is_finished());

        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.seed, Seed::new(7));
        assert_eq!(outcome.finished_at, fixed_now());
    }

    #[test]
    fn finish_grades_unanswered_as_incorrect() {
        let mut s = session(GradingMode::Immediate);
        s.toggle_option(0).unwrap();
        let summary = s.finish(fixed_now()).unwrap();
        assert_eq!(summary.score, 1);
        let last = s.state(3).unwrap().final_result().unwrap();
        assert!(last.selected.is_empty());
        assert!(!last.is_correct);
        assert_eq!(last.explanation, "Correct answer: B");
    }

    #[test]
    fn mutation_after_finish_fails() {
        let mut s = session(GradingMode::Batch);
        s.submit(fixed_now()).unwrap();
        assert_eq!(s.toggle_option(0).unwrap_err(), SessionError::Finished);
        assert_eq!(s.advance().unwrap_err(), SessionError::Finished);
        assert_eq!(s.submit(fixed_now()).unwrap_err(), SessionError::Finished);
    }

    #[test]
    fn modes_guard_their_finishing_actions() {
        let mut batch = session(GradingMode::Batch);
        assert_eq!(
            batch.finish(fixed_now()).unwrap_err(),
            SessionError::WrongMode {
                expected: GradingMode::Immediate
            }
        );
        let mut immediate = session(GradingMode::Immediate);
        assert!(matches!(
            immediate.submit(fixed_now()),
            Err(SessionError::WrongMode { .. })
        ));
    }

    #[test]
    fn batch_mode_grades_nothing_before_submit() {
        let mut s = session(GradingMode::Batch);
        s.toggle_option(0).unwrap();
        assert!(s.current_state().feedback().is_none());
        s.advance().unwrap();
        assert_eq!(s.progress().graded, 0);
        assert_eq!(s.summary().score, 0);

        let summary = s.submit(fixed_now()).unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(s.progress().graded, 4);
    }

    #[test]
    fn batch_results_missing_a_question_leave_session_untouched() {
        let mut s = session(GradingMode::Batch);
        s.toggle_option(0).unwrap();
        let partial: Vec<GradeResult> = s.questions()[..3]
            .iter()
            .map(|q| GradeResult::evaluate(q, &OptionSet::new()))
            .collect();

        let err = s.apply_batch_results(partial, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::MismatchedResults(_)));
        assert!(!s.is_finished());
        assert_eq!(s.current_state().selection(), OptionSet::from([0]));
    }

    #[test]
    fn batch_results_are_regraded_locally() {
        let mut s = session(GradingMode::Batch);
        s.toggle_option_at(0, 0).unwrap();
        let mut results: Vec<GradeResult> = s
            .questions()
            .iter()
            .map(|q| GradeResult::evaluate(q, &q.correct().clone()))
            .collect();
        results[0].is_correct = false;
        results[1].explanation = "Because.".into();

        let summary = s.apply_batch_results(results, fixed_now()).unwrap();
        assert_eq!(summary.score, 1);
        assert!(s.state(0).unwrap().final_result().unwrap().is_correct);
        assert_eq!(s.state(1).unwrap().final_result().unwrap().explanation, "Because.");
    }

    #[test]
    fn batch_results_never_replace_the_users_selection() {
        let mut s = session(GradingMode::Batch);
        // q1 expects A; the user picks B.
        s.toggle_option_at(0, 1).unwrap();
        let results: Vec<GradeResult> = s
            .questions()
            .iter()
            .map(|q| GradeResult::evaluate(q, &q.correct().clone()))
            .collect();

        let summary = s.apply_batch_results(results, fixed_now()).unwrap();
        assert_eq!(summary.score, 0);
        let first = s.state(0).unwrap().final_result().unwrap();
        assert_eq!(first.selected, OptionSet::from([1]));
        assert!(!first.is_correct);
        assert_eq!(
            s.answers().selection(&QuestionId::new("q1").unwrap()),
            OptionSet::from([1])
        );
    }

    #[test]
    fn answers_only_include_selections() {
        let mut s = session(GradingMode::Batch);
        s.toggle_option_at(2, 3).unwrap();
        let answers = s.answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(
            answers.selection(&QuestionId::new("q3").unwrap()),
            OptionSet::from([3])
        );
    }

    #[test]
    fn view_marks_options_by_feedback() {
        let mut s = session(GradingMode::Immediate);
        s.toggle_option(2).unwrap();
        let view = s.current_view();
        let marks: Vec<_> = view.options.iter().map(|o| o.mark).collect();
        assert_eq!(
            marks,
            vec![OptionMark::Correct, OptionMark::Neutral, OptionMark::Wrong, OptionMark::Neutral]
        );
        assert_eq!(view.options[2].letter, "C");
        assert_eq!(view.is_correct, Some(false));

        let mut batch = session(GradingMode::Batch);
        batch.toggle_option(2).unwrap();
        let marks: Vec<_> = batch.current_view().options.iter().map(|o| o.mark).collect();
        assert_eq!(marks[2], OptionMark::Selected);
        assert_eq!(batch.current_view().is_correct, None);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut s = session(GradingMode::Immediate);
        assert_eq!(
            s.toggle_option(4).unwrap_err(),
            SessionError::OptionOutOfRange { option: 4, options: 4 }
        );
    }
}
