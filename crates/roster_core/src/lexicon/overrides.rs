//! Versioned name override map.
//!
//! Hand-verified corrections that the general algorithm cannot derive live
//! here as data, so they can be audited and tested apart from pass logic.

use super::LexiconResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Known corrections keyed by the misspelled form.
///
/// `fullnames` keys and values use the `SURNAME | GIVEN NAMES` rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOverrides {
    pub version: u32,
    #[serde(default)]
    pub fullnames: BTreeMap<String, String>,
    #[serde(default)]
    pub surnames: BTreeMap<String, String>,
    #[serde(default)]
    pub given_names: BTreeMap<String, String>,
}

impl NameOverrides {
    pub fn from_json_str(raw: &str) -> LexiconResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> LexiconResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn is_empty(&self) -> bool {
        self.fullnames.is_empty() && self.surnames.is_empty() && self.given_names.is_empty()
    }
}
