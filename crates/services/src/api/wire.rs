//! JSON shapes exchanged with the quiz collaborator.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use quiz_core::model::{
    AnswerSet, GradeResult, Module, OptionSet, Question, QuestionDraft, QuestionId,
};

use super::{GradeReport, GradedQuestion};
use crate::error::ApiError;

//
// ─── MODULES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ModulesResponse {
    #[serde(default)]
    pub modules: Vec<Value>,
}

/// Normalize one module list entry field by field.
///
/// A bare string is taken as both id and name.
pub(crate) fn module_from_value(value: &Value) -> Module {
    if let Some(name) = value.as_str() {
        return Module::normalized(Some(name), Some(name), None);
    }
    Module::normalized(
        value.get("id").and_then(Value::as_str),
        value.get("name").and_then(Value::as_str),
        value.get("total").and_then(Value::as_i64),
    )
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct QuestionsResponse {
    pub questions: Vec<QuestionWire>,
}

impl QuestionsResponse {
    /// Validate every question; ids must be unique within the set.
    pub(crate) fn into_questions(self) -> Result<Vec<Question>, ApiError> {
        let mut seen = HashSet::with_capacity(self.questions.len());
        let mut questions = Vec::with_capacity(self.questions.len());
        for wire in self.questions {
            let question = wire.into_question()?;
            if !seen.insert(question.id().clone()) {
                return Err(ApiError::Malformed(format!(
                    "question {} appears more than once",
                    question.id()
                )));
            }
            questions.push(question);
        }
        Ok(questions)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionWire {
    pub id: String,
    pub module: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_indexes: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionWire {
    pub(crate) fn into_question(self) -> Result<Question, ApiError> {
        let id = self.id.clone();
        QuestionDraft {
            id: self.id,
            module: self.module,
            text: self.text,
            options: self.options,
            correct: self.correct_indexes,
            explanation: self.explanation,
        }
        .validate()
        .map_err(|err| ApiError::Malformed(format!("question {id}: {err}")))
    }
}

impl From<&Question> for QuestionWire {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id().to_string(),
            module: question.module().to_string(),
            text: question.text().to_owned(),
            options: question.options().to_vec(),
            correct_indexes: question.correct().to_vec(),
            explanation: question.explanation().map(str::to_owned),
        }
    }
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GradeRequest {
    pub answers: BTreeMap<String, Vec<usize>>,
    pub module: String,
    pub seed: u64,
}

impl GradeRequest {
    pub(crate) fn answers_from(set: &AnswerSet) -> BTreeMap<String, Vec<usize>> {
        set.iter()
            .map(|(id, selection)| (id.to_string(), selection.to_vec()))
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GradeResponse {
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub results: Vec<GradeResultWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GradeResultWire {
    pub question_id: String,
    #[serde(default)]
    pub user_answer: Vec<usize>,
    pub correct_answer: Vec<usize>,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl GradeResponse {
    pub(crate) fn into_report(self) -> Result<GradeReport, ApiError> {
        let results = self
            .results
            .into_iter()
            .map(|wire| {
                let question_id = QuestionId::new(wire.question_id)
                    .map_err(|err| ApiError::Malformed(err.to_string()))?;
                Ok(GradedQuestion {
                    result: GradeResult {
                        question_id,
                        selected: wire.user_answer.into_iter().collect::<OptionSet>(),
                        correct: wire.correct_answer.into_iter().collect::<OptionSet>(),
                        is_correct: wire.is_correct,
                        explanation: wire.explanation,
                    },
                    question_text: wire.question_text,
                    options: wire.options,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        Ok(GradeReport {
            score: self.score,
            total: self.total,
            percentage: self.percentage,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn module_entries_are_normalized() {
        let full = module_from_value(&json!({ "id": "cds", "name": "Module CDS", "total": 3 }));
        assert_eq!((full.id.as_str(), full.name.as_str(), full.total), ("cds", "Module CDS", 3));

        let sparse = module_from_value(&json!({ "total": -4 }));
        assert_eq!(sparse.id.as_str(), "unknown");
        assert_eq!(sparse.name, "Unknown Module");
        assert_eq!(sparse.total, 0);

        let bare = module_from_value(&json!("ai"));
        assert_eq!((bare.id.as_str(), bare.name.as_str()), ("ai", "ai"));
    }

    #[test]
    fn question_without_correct_indexes_is_malformed() {
        let wire: QuestionWire = serde_json::from_value(json!({
            "id": "q_1", "module": "cds", "text": "Pick", "options": ["a", "b"]
        }))
        .unwrap();
        assert!(matches!(wire.into_question(), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn repeated_question_ids_are_malformed() {
        let entry = json!({
            "id": "q_1", "module": "cds", "text": "Pick", "options": ["a", "b"],
            "correctIndexes": [0]
        });
        let single: QuestionsResponse =
            serde_json::from_value(json!({ "questions": [entry.clone()] })).unwrap();
        assert_eq!(single.into_questions().unwrap().len(), 1);

        let twice: QuestionsResponse =
            serde_json::from_value(json!({ "questions": [entry.clone(), entry] })).unwrap();
        let err = twice.into_questions().unwrap_err();
        assert!(matches!(err, ApiError::Malformed(message) if message.contains("q_1")));
    }

    #[test]
    fn question_wire_uses_camel_case_keys() {
        let question = QuestionDraft {
            id: "q_2".into(),
            module: "cds".into(),
            text: "Pick".into(),
            options: vec!["a".into(), "b".into()],
            correct: vec![1],
            explanation: None,
        }
        .validate()
        .unwrap();
        let value = serde_json::to_value(QuestionWire::from(&question)).unwrap();
        assert_eq!(value["correctIndexes"], json!([1]));
        assert!(value.get("explanation").is_none());
    }

    #[test]
    fn grade_response_reads_camel_case() {
        let response: GradeResponse = serde_json::from_value(json!({
            "score": 1, "total": 1, "percentage": 100.0,
            "results": [{
                "questionId": "q_1", "userAnswer": [2, 0], "correctAnswer": [0, 2],
                "isCorrect": true, "explanation": "A and C",
                "questionText": "Pick", "options": ["a", "b", "c"]
            }]
        }))
        .unwrap();
        let report = response.into_report().unwrap();
        let graded = &report.results[0];
        assert_eq!(graded.result.selected, OptionSet::from([0, 2]));
        assert!(graded.result.is_correct);
        assert_eq!(graded.options.len(), 3);
    }
}
