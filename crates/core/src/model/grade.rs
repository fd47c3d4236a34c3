use crate::grading;
use crate::model::answer::OptionSet;
use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Outcome of grading one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeResult {
    pub question_id: QuestionId,
    pub selected: OptionSet,
    pub correct: OptionSet,
    pub is_correct: bool,
    pub explanation: String,
}

impl GradeResult {
    /// Grade `selected` against `question`.
    #[must_use]
    pub fn evaluate(question: &Question, selected: &OptionSet) -> Self {
        let grading = grading::grade(question.correct(), selected);
        Self {
            question_id: question.id().clone(),
            selected: selected.clone(),
            correct: question.correct().clone(),
            is_correct: grading.is_correct,
            explanation: question.explanation_or_default(),
        }
    }

    /// How each of `option_count` options should be shown for this result.
    #[must_use]
    pub fn marks(&self, option_count: usize) -> Vec<OptionMark> {
        (0..option_count)
            .map(|index| {
                if self.correct.contains(index) {
                    OptionMark::Correct
                } else if self.selected.contains(index) {
                    OptionMark::Wrong
                } else {
                    OptionMark::Neutral
                }
            })
            .collect()
    }
}

/// Display state of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Part of the correct answer (shown once a result exists).
    Correct,
    /// Picked by the user but not correct.
    Wrong,
    /// Picked by the user, no result yet.
    Selected,
    Neutral,
}

impl OptionMark {
    /// Marks for an ungraded selection.
    #[must_use]
    pub fn for_selection(selected: &OptionSet, option_count: usize) -> Vec<OptionMark> {
        (0..option_count)
            .map(|index| {
                if selected.contains(index) {
                    OptionMark::Selected
                } else {
                    OptionMark::Neutral
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;

    fn question(correct: Vec<usize>, explanation: Option<&str>) -> Question {
        QuestionDraft {
            id: "q1".into(),
            module: "m".into(),
            text: "Pick".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            explanation: explanation.map(str::to_owned),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn evaluate_records_both_sets() {
        let q = question(vec![1, 2], None);
        let result = GradeResult::evaluate(&q, &OptionSet::from([2, 1]));
        assert!(result.is_correct);
        assert_eq!(result.selected.to_vec(), vec![1, 2]);
        assert_eq!(result.correct.to_vec(), vec![1, 2]);
        assert_eq!(result.explanation, "Correct answer: B, C");
    }

    #[test]
    fn evaluate_uses_question_explanation() {
        let q = question(vec![0], Some("A is the only even one."));
        let result = GradeResult::evaluate(&q, &OptionSet::new());
        assert!(!result.is_correct);
        assert_eq!(result.explanation, "A is the only even one.");
    }

    #[test]
    fn marks_highlight_correct_and_wrong() {
        let q = question(vec![1], None);
        let result = GradeResult::evaluate(&q, &OptionSet::from([3]));
        assert_eq!(
            result.marks(4),
            vec![
                OptionMark::Neutral,
                OptionMark::Correct,
                OptionMark::Neutral,
                OptionMark::Wrong
            ]
        );
    }

    #[test]
    fn selection_marks_without_result() {
        assert_eq!(
            OptionMark::for_selection(&OptionSet::from([0]), 2),
            vec![OptionMark::Selected, OptionMark::Neutral]
        );
    }
}
