mod answer;
mod grade;
mod ids;
mod module;
mod question;

pub use answer::{AnswerSet, OptionSet};
pub use grade::{GradeResult, OptionMark};
pub use ids::{ALL_MODULES, IdError, ModuleId, ModuleSelector, QuestionId, Seed};
pub use module::{Module, UNKNOWN_MODULE_ID, UNKNOWN_MODULE_NAME};
pub use question::{Question, QuestionDraft, QuestionError};
