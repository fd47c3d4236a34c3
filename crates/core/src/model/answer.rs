use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// A set of option indexes, kept in ascending order.
///
/// Used both for a user's selection and for a question's correct options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionSet(BTreeSet<usize>);

impl OptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn single(index: usize) -> Self {
        Self(BTreeSet::from([index]))
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest index in the set, if any.
    #[must_use]
    pub fn max(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Indexes in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }

    /// Flip `index` in or out of the set.
    ///
    /// With `single_select` the set never holds more than one index: picking a
    /// new option replaces the previous one, picking the same option clears it.
    /// Returns whether `index` is selected afterwards.
    pub fn toggle(&mut self, index: usize, single_select: bool) -> bool {
        if self.0.remove(&index) {
            return false;
        }
        if single_select {
            self.0.clear();
        }
        self.0.insert(index);
        true
    }
}

impl FromIterator<usize> for OptionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[usize; N]> for OptionSet {
    fn from(indexes: [usize; N]) -> Self {
        indexes.into_iter().collect()
    }
}

/// Selected options per question.
///
/// A question is unanswered when it has no entry; empty selections are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet(BTreeMap<QuestionId, OptionSet>);

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Store `selection` for `question`; an empty selection removes the entry.
    pub fn set(&mut self, question: QuestionId, selection: OptionSet) {
        if selection.is_empty() {
            self.0.remove(&question);
        } else {
            self.0.insert(question, selection);
        }
    }

    #[must_use]
    pub fn get(&self, question: &QuestionId) -> Option<&OptionSet> {
        self.0.get(question)
    }

    /// Selection for `question`, empty when unanswered.
    #[must_use]
    pub fn selection(&self, question: &QuestionId) -> OptionSet {
        self.0.get(question).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_answered(&self, question: &QuestionId) -> bool {
        self.0.contains_key(question)
    }

    /// Number of answered questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &OptionSet)> {
        self.0.iter()
    }
}

impl FromIterator<(QuestionId, OptionSet)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (QuestionId, OptionSet)>>(iter: I) -> Self {
        let mut answers = Self::new();
        for (question, selection) in iter {
            answers.set(question, selection);
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(raw: &str) -> QuestionId {
        QuestionId::new(raw).unwrap()
    }

    #[test]
    fn single_select_replaces_previous_choice() {
        let mut selection = OptionSet::new();
        assert!(selection.toggle(0, true));
        assert!(selection.toggle(1, true));
        assert_eq!(selection, OptionSet::single(1));
    }

    #[test]
    fn single_select_toggle_same_option_clears() {
        let mut selection = OptionSet::single(2);
        assert!(!selection.toggle(2, true));
        assert!(selection.is_empty());
    }

    #[test]
    fn multi_select_accumulates_and_removes() {
        let mut selection = OptionSet::new();
        selection.toggle(3, false);
        selection.toggle(1, false);
        assert_eq!(selection.to_vec(), vec![1, 3]);
        selection.toggle(3, false);
        assert_eq!(selection.to_vec(), vec![1]);
    }

    #[test]
    fn option_sets_compare_as_sets() {
        assert_eq!(OptionSet::from([2, 1]), OptionSet::from([1, 2]));
        assert_eq!(OptionSet::from([1, 1, 2]).len(), 2);
    }

    #[test]
    fn empty_selection_means_unanswered() {
        let mut answers = AnswerSet::new();
        answers.set(qid("q1"), OptionSet::from([0]));
        assert!(answers.is_answered(&qid("q1")));

        answers.set(qid("q1"), OptionSet::new());
        assert!(!answers.is_answered(&qid("q1")));
        assert!(answers.is_empty());
        assert!(answers.selection(&qid("q1")).is_empty());
    }
}
