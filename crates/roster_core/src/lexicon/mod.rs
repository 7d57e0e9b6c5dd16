//! Read-only side tables consulted by the resolution engine.
//!
//! # Responsibility
//! - Load the name-token category dictionary, the unit hierarchy directory
//!   and the versioned name override map.
//! - Expose them as immutable configuration objects passed into passes.
//!
//! # Invariants
//! - Side tables are never mutated while a pass runs.
//! - Missing entries are not errors: lookups return `None` and callers
//!   degrade to defaults.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod name_lexicon;
mod overrides;
mod unit_directory;

pub use name_lexicon::{strip_parentheses, NameCategory, NameLexicon};
pub use overrides::NameOverrides;
pub use unit_directory::UnitDirectory;

pub type LexiconResult<T> = Result<T, LexiconError>;

/// Side-table loading error.
#[derive(Debug)]
pub enum LexiconError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidUnitCode { unit: String, message: String },
}

impl Display for LexiconError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid side table json: {err}"),
            Self::InvalidUnitCode { unit, message } => {
                write!(f, "invalid code for unit `{unit}`: {message}")
            }
        }
    }
}

impl Error for LexiconError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidUnitCode { .. } => None,
        }
    }
}

impl From<std::io::Error> for LexiconError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for LexiconError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
