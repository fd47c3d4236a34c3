use crate::model::GradeResult;

/// Percentage at or above which a quiz counts as passed.
///
/// Only picks the closing message; it never gates finishing.
pub const PASS_THRESHOLD_PERCENT: u32 = 70;

/// Aggregate score derived from grade results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
}

impl ScoreSummary {
    /// Build a summary from `score` correct answers out of `total` questions.
    ///
    /// The percentage is `round(100 * score / total)`, rounding halves up;
    /// an empty quiz scores 0%.
    #[must_use]
    pub fn new(score: u32, total: u32) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            let score = u64::from(score);
            let total = u64::from(total);
            u32::try_from((200 * score + total) / (2 * total)).unwrap_or(u32::MAX)
        };
        Self {
            score,
            total,
            percentage,
        }
    }

    /// Count correct results out of `total` questions.
    ///
    /// Questions without a result count as incorrect.
    #[must_use]
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a GradeResult>, total: usize) -> Self {
        let correct = results.into_iter().filter(|r| r.is_correct).count();
        Self::new(
            u32::try_from(correct).unwrap_or(u32::MAX),
            u32::try_from(total).unwrap_or(u32::MAX),
        )
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.percentage >= PASS_THRESHOLD_PERCENT {
            Verdict::Passed
        } else {
            Verdict::KeepPracticing
        }
    }
}

/// Closing message choice for a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    KeepPracticing,
}

impl Verdict {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Passed => "Congratulations! You passed!",
            Verdict::KeepPracticing => "Keep practicing, you will get there!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OptionSet, QuestionId};

    fn result(id: &str, is_correct: bool) -> GradeResult {
        GradeResult {
            question_id: QuestionId::new(id).unwrap(),
            selected: OptionSet::new(),
            correct: OptionSet::from([0]),
            is_correct,
            explanation: String::new(),
        }
    }

    #[test]
    fn three_of_four_is_seventy_five_percent() {
        let results = vec![
            result("a", true),
            result("b", true),
            result("c", false),
            result("d", true),
        ];
        let summary = ScoreSummary::from_results(&results, results.len());
        assert_eq!(summary, ScoreSummary { score: 3, total: 4, percentage: 75 });
        assert_eq!(summary.verdict(), Verdict::Passed);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(ScoreSummary::new(1, 3).percentage, 33);
        assert_eq!(ScoreSummary::new(2, 3).percentage, 67);
        assert_eq!(ScoreSummary::new(1, 8).percentage, 13);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let summary = ScoreSummary::from_results(std::iter::empty(), 0);
        assert_eq!(summary.percentage, 0);
    }

    #[test]
    fn missing_results_count_as_incorrect() {
        let results = vec![result("a", true)];
        let summary = ScoreSummary::from_results(&results, 2);
        assert_eq!(summary.percentage, 50);
        assert_eq!(summary.verdict(), Verdict::KeepPracticing);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(ScoreSummary::new(7, 10).verdict(), Verdict::Passed);
        assert_eq!(ScoreSummary::new(69, 100).verdict(), Verdict::KeepPracticing);
    }
}
