use chrono::{DateTime, Utc};

use quiz_core::grading::option_letter;
use quiz_core::model::{GradeResult, ModuleSelector, OptionMark, Question, QuestionId, Seed};
use quiz_core::score::{ScoreSummary, Verdict};

use super::state::QuestionState;

/// Final result of a finished session.
///
/// Presentation-agnostic: the UI formats timestamps and messages itself.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub summary: ScoreSummary,
    pub verdict: Verdict,
    pub results: Vec<GradeResult>,
    pub selector: ModuleSelector,
    pub seed: Seed,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One option as the player should render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub letter: String,
    pub text: String,
    pub mark: OptionMark,
}

/// The question under the cursor together with its feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question_id: QuestionId,
    pub text: String,
    pub multi_select: bool,
    pub options: Vec<OptionView>,
    pub locked: bool,
    /// `Some` once a final or provisional result exists.
    pub is_correct: Option<bool>,
    pub explanation: Option<String>,
}

impl QuestionView {
    pub(crate) fn build(index: usize, total: usize, question: &Question, state: &QuestionState) -> Self {
        let marks = match state.feedback() {
            Some(result) => result.marks(question.option_count()),
            None => OptionMark::for_selection(&state.selection(), question.option_count()),
        };
        let options = question
            .options()
            .iter()
            .zip(marks)
            .enumerate()
            .map(|(i, (text, mark))| OptionView {
                letter: option_letter(i),
                text: text.clone(),
                mark,
            })
            .collect();

        Self {
            index,
            total,
            question_id: question.id().clone(),
            text: question.text().to_owned(),
            multi_select: question.is_multi_select(),
            options,
            locked: state.is_graded(),
            is_correct: state.feedback().map(|r| r.is_correct),
            explanation: state.feedback().map(|r| r.explanation.clone()),
        }
    }
}
