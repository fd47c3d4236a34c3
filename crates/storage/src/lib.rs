#![forbid(unsafe_code)]

pub mod loader;
pub mod repository;

pub use loader::load_bank_dir;
pub use repository::{InMemoryQuestionBank, ModuleRecord, QuestionBank, StorageError};
