use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reserved selector literal meaning "every module".
pub const ALL_MODULES: &str = "all";

/// Error type for building identifiers from raw strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    #[error("\"all\" is reserved and cannot name a module")]
    ReservedModuleId,

    #[error("failed to parse {kind} from {raw:?}")]
    Parse { kind: &'static str, raw: String },
}

fn non_empty(raw: String, kind: &'static str) -> Result<String, IdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_owned())
    }
}

// ─── Question ──────────────────────────────────────────────────────────────────

/// Unique identifier for a Question
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a new `QuestionId`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        non_empty(id.into(), "QuestionId").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ─── Module ────────────────────────────────────────────────────────────────────

/// Unique identifier for a Module. Never equal to [`ALL_MODULES`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId(String);

impl ModuleId {
    /// Creates a new `ModuleId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for blank input and `IdError::ReservedModuleId`
    /// for the reserved "all" literal.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = non_empty(id.into(), "ModuleId")?;
        if id == ALL_MODULES {
            return Err(IdError::ReservedModuleId);
        }
        Ok(Self(id))
    }

    /// For compile-time placeholders known to be valid.
    pub(crate) fn from_static(id: &'static str) -> Self {
        Self(id.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which questions a quiz draws from: one module or all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleSelector {
    #[default]
    All,
    Module(ModuleId),
}

impl ModuleSelector {
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, ModuleSelector::All)
    }

    /// Returns true when a question owned by `module` is in scope.
    #[must_use]
    pub fn includes(&self, module: &ModuleId) -> bool {
        match self {
            ModuleSelector::All => true,
            ModuleSelector::Module(id) => id == module,
        }
    }
}

impl From<ModuleId> for ModuleSelector {
    fn from(id: ModuleId) -> Self {
        ModuleSelector::Module(id)
    }
}

// ─── Seed ──────────────────────────────────────────────────────────────────────

/// Drives the deterministic ordering of a question set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(u64);

impl Seed {
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

// ─── Debug / Display ───────────────────────────────────────────────────────────

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSelector::All => f.write_str(ALL_MODULES),
            ModuleSelector::Module(id) => f.write_str(id.as_str()),
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Conversions ───────────────────────────────────────────────────────────────

impl FromStr for QuestionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for ModuleId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for ModuleSelector {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ALL_MODULES => Ok(ModuleSelector::All),
            other => ModuleId::new(other).map(ModuleSelector::Module),
        }
    }
}

impl FromStr for Seed {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Seed).map_err(|_| IdError::Parse {
            kind: "Seed",
            raw: s.to_owned(),
        })
    }
}

impl TryFrom<String> for QuestionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ModuleSelector {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.0
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.0
    }
}

impl From<ModuleSelector> for String {
    fn from(selector: ModuleSelector) -> Self {
        selector.to_string()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
