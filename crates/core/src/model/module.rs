use serde::{Deserialize, Serialize};

use crate::model::ids::ModuleId;

/// Placeholder name for a module listed without one.
pub const UNKNOWN_MODULE_NAME: &str = "Unknown Module";
/// Placeholder id for a module listed without one.
pub const UNKNOWN_MODULE_ID: &str = "unknown";

/// A subject grouping a subset of the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    pub total: u32,
}

impl Module {
    #[must_use]
    pub fn new(id: ModuleId, name: impl Into<String>, total: u32) -> Self {
        Self {
            id,
            name: name.into(),
            total,
        }
    }

    /// Build a module from loosely-typed listing fields.
    ///
    /// Missing or unusable fields fall back to placeholders instead of failing:
    /// the name becomes [`UNKNOWN_MODULE_NAME`], the id [`UNKNOWN_MODULE_ID`],
    /// and a missing or negative total becomes 0.
    #[must_use]
    pub fn normalized(id: Option<&str>, name: Option<&str>, total: Option<i64>) -> Self {
        let id = id
            .and_then(|raw| ModuleId::new(raw).ok())
            .unwrap_or_else(|| ModuleId::from_static(UNKNOWN_MODULE_ID));
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_MODULE_NAME)
            .to_owned();
        let total = total
            .and_then(|t| u32::try_from(t).ok())
            .unwrap_or(0);
        Self { id, name, total }
    }
}
