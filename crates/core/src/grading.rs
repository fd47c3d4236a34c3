//! Pure grading rules.
//!
//! A selection is correct only when it equals the correct set exactly; there is
//! no partial credit. Nothing here depends on question text, so callers may grade
//! speculatively (for live feedback) as often as they like.

use crate::model::OptionSet;

/// Outcome of comparing a selection with the correct options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grading {
    pub is_correct: bool,
}

/// Grade `selected` against `correct`.
///
/// ```
/// # use quiz_core::grading::grade;
/// # use quiz_core::model::OptionSet;
/// assert!(grade(&OptionSet::from([1, 2]), &OptionSet::from([2, 1])).is_correct);
/// assert!(!grade(&OptionSet::from([1, 2]), &OptionSet::from([1])).is_correct);
/// assert!(!grade(&OptionSet::from([0]), &OptionSet::new()).is_correct);
/// ```
#[must_use]
pub fn grade(correct: &OptionSet, selected: &OptionSet) -> Grading {
    Grading {
        is_correct: correct == selected,
    }
}

/// Letter shown for an option: 0 → `A`, 1 → `B`, … 25 → `Z`, then `#27`, `#28`, …
#[must_use]
pub fn option_letter(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("#{}", index + 1),
    }
}

/// Letters of every option in `set`, ascending.
#[must_use]
pub fn option_letters(set: &OptionSet) -> Vec<String> {
    set.iter().map(option_letter).collect()
}

/// Explanation used when a question carries none.
#[must_use]
pub fn default_explanation(correct: &OptionSet) -> String {
    format!("Correct answer: {}", option_letters(correct).join(", "))
}
