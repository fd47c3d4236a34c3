use async_trait::async_trait;
use quiz_core::model::{IdError, Module, ModuleId, ModuleSelector, Question};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors surfaced by question bank adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    InvalidId(#[from] IdError),
}

/// One module and the questions it owns, in bank order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub name: String,
    pub questions: Vec<Question>,
}

impl ModuleRecord {
    #[must_use]
    pub fn module(&self) -> Module {
        Module::new(
            self.id.clone(),
            self.name.clone(),
            u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
        )
    }
}

/// Read access to the question bank.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// List every module, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError>;

    /// Questions in scope for `selector`, in bank order.
    ///
    /// An unknown module yields an empty list rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn questions(&self, selector: &ModuleSelector) -> Result<Vec<Question>, StorageError>;

    /// Number of questions across all modules.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn question_count(&self) -> Result<usize, StorageError> {
        Ok(self.questions(&ModuleSelector::All).await?.len())
    }
}

/// Question bank held in memory; loaded once at startup or built in tests.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    modules: Arc<RwLock<BTreeMap<ModuleId, ModuleRecord>>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bank from module records.
    ///
    /// # Errors
    ///
    /// See [`InMemoryQuestionBank::insert_module`].
    pub fn from_records(records: impl IntoIterator<Item = ModuleRecord>) -> Result<Self, StorageError> {
        let bank = Self::new();
        for record in records {
            bank.insert_module(record)?;
        }
        Ok(bank)
    }

    /// Add or replace a module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a question belongs to another module or
    /// its id is already used elsewhere in the bank.
    pub fn insert_module(&self, record: ModuleRecord) -> Result<(), StorageError> {
        if let Some(stray) = record.questions.iter().find(|q| q.module() != &record.id) {
            return Err(StorageError::Conflict(format!(
                "question {} belongs to module {}, not {}",
                stray.id(),
                stray.module(),
                record.id
            )));
        }

        let mut guard = self
            .modules
            .write()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (id, existing) in guard.iter() {
            if id == &record.id {
                continue;
            }
            if let Some(dup) = record
                .questions
                .iter()
                .find(|q| existing.questions.iter().any(|e| e.id() == q.id()))
            {
                return Err(StorageError::Conflict(format!(
                    "question id {} already used by module {id}",
                    dup.id()
                )));
            }
        }

        guard.insert(record.id.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError> {
        let guard = self
            .modules
            .read()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().map(ModuleRecord::module).collect())
    }

    async fn questions(&self, selector: &ModuleSelector) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .modules
            .read()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let questions = match selector {
            ModuleSelector::All => guard
                .values()
                .flat_map(|record| record.questions.iter().cloned())
                .collect(),
            ModuleSelector::Module(id) => guard
                .get(id)
                .map(|record| record.questions.clone())
                .unwrap_or_default(),
        };
        Ok(questions)
    }
}
