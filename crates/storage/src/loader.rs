//! Loads a question bank from a directory of JSON module files.
//!
//! Each `*.json` file is one module:
//!
//! ```json
//! {
//!   "id": "cds",
//!   "name": "Module CDS",
//!   "questions": [
//!     { "text": "…", "options": ["…", "…"], "correct": "1,3", "explanation": "…" }
//!   ]
//! }
//! ```
//!
//! `id` and `name` are optional and otherwise inferred from the file name.
//! `correct` is either a 0-based index array or a token string where digits are
//! 1-based and letters `A`–`F` name options. Bad rows are skipped with a warning,
//! bad files are skipped, and modules left without questions are dropped.

use std::fs;
use std::path::{Path, PathBuf};

use quiz_core::model::{ModuleId, Question, QuestionDraft};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::repository::{InMemoryQuestionBank, ModuleRecord, StorageError};

/// Highest option letter accepted in correct-answer tokens.
const MAX_OPTION_LETTER: char = 'F';

#[derive(Debug, Deserialize)]
struct ModuleFile {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    questions: Vec<QuestionRow>,
}

#[derive(Debug, Deserialize)]
struct QuestionRow {
    #[serde(default)]
    text: String,
    #[serde(default)]
    options: Vec<String>,
    correct: Option<CorrectSpec>,
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorrectSpec {
    Indexes(Vec<usize>),
    Tokens(String),
}

/// Load every `*.json` module file in `dir` into an in-memory bank.
///
/// # Errors
///
/// Returns `StorageError::Io` if the directory cannot be listed. Unreadable or
/// malformed files are skipped with a warning.
pub fn load_bank_dir(dir: impl AsRef<Path>) -> Result<InMemoryQuestionBank, StorageError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let bank = InMemoryQuestionBank::new();
    for path in paths {
        let record = match load_module_file(&path) {
            Ok(record) => record,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping module file");
                continue;
            }
        };
        if record.questions.is_empty() {
            warn!(path = %path.display(), "module has no usable questions; skipping");
            continue;
        }
        info!(module = %record.id, questions = record.questions.len(), "loaded module");
        if let Err(err) = bank.insert_module(record) {
            warn!(path = %path.display(), error = %err, "skipping module file");
        }
    }
    Ok(bank)
}

/// Parse one module file.
///
/// # Errors
///
/// Returns `StorageError::Io` / `StorageError::Parse` for unreadable or invalid JSON,
/// and `StorageError::InvalidId` if the module id is unusable.
pub fn load_module_file(path: &Path) -> Result<ModuleRecord, StorageError> {
    let raw = fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ModuleFile = serde_json::from_str(&raw).map_err(|e| StorageError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (inferred_id, inferred_name) = infer_module(&stem);
    let id = file
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(inferred_id);
    let id = ModuleId::new(id)?;
    let name = file
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(inferred_name);

    let questions = file
        .questions
        .into_iter()
        .enumerate()
        .filter_map(|(row, q)| build_question(&id, row, q))
        .collect();

    Ok(ModuleRecord {
        id,
        name,
        questions,
    })
}

fn build_question(module: &ModuleId, row: usize, q: QuestionRow) -> Option<Question> {
    let mut options: Vec<String> = q.options.into_iter().map(|o| o.trim().to_owned()).collect();
    while options.last().is_some_and(String::is_empty) {
        options.pop();
    }

    let correct = match q.correct {
        Some(CorrectSpec::Indexes(indexes)) => {
            valid_unique(indexes.into_iter().map(Some), options.len())
        }
        Some(CorrectSpec::Tokens(raw)) => parse_correct_tokens(&raw, options.len()),
        None => Vec::new(),
    };

    let draft = QuestionDraft {
        id: format!("{module}_q_{row}"),
        module: module.to_string(),
        text: q.text,
        options,
        correct,
        explanation: q.explanation,
    };
    match draft.validate() {
        Ok(question) => Some(question),
        Err(err) => {
            warn!(module = %module, row, error = %err, "skipping question row");
            None
        }
    }
}

/// Parse tokens like `"1,3"`, `"A; c"` into 0-based option indexes.
///
/// Digits are 1-based; single letters `A`–`F` are case-insensitive. Tokens that
/// do not parse or fall outside `0..option_count` are ignored, as are repeats.
#[must_use]
pub fn parse_correct_tokens(raw: &str, option_count: usize) -> Vec<usize> {
    let candidates = raw
        .split([',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(token_index);
    let parsed = valid_unique(candidates, option_count);
    debug!(raw, ?parsed, "parsed correct option tokens");
    parsed
}

fn token_index(token: &str) -> Option<usize> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse::<usize>().ok()?.checked_sub(1);
    }
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            let upper = c.to_ascii_uppercase();
            ('A'..=MAX_OPTION_LETTER)
                .contains(&upper)
                .then(|| usize::from(upper as u8 - b'A'))
        }
        _ => None,
    }
}

fn valid_unique(candidates: impl Iterator<Item = Option<usize>>, option_count: usize) -> Vec<usize> {
    let mut out = Vec::new();
    for index in candidates.flatten() {
        if index < option_count && !out.contains(&index) {
            out.push(index);
        }
    }
    out
}

/// Infer `(id, name)` from a file stem: `quiz_module_cds` → (`cds`, `Module CDS`).
#[must_use]
pub fn infer_module(stem: &str) -> (String, String) {
    let lower = stem.to_ascii_lowercase();
    let suffix = match lower.rfind("module") {
        Some(at) => &stem[at + "module".len()..],
        None => stem,
    };
    let suffix = suffix.trim_matches(|c: char| c == '_' || c == '-' || c.is_whitespace());
    let suffix = if suffix.is_empty() { stem } else { suffix };

    let id = suffix.to_lowercase();
    let name = if suffix.is_empty() {
        "Module".to_owned()
    } else {
        format!("Module {}", suffix.to_uppercase())
    };
    (id, name)
}
