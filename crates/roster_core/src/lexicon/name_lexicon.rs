//! Name-token category dictionary.

use super::LexiconResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Category of one name token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCategory {
    /// Female given name.
    F,
    /// Male given name.
    M,
    /// Given name of unknown gender.
    Dk,
    /// Token known to be a surname, never a given name.
    Surname,
}

/// Token → category dictionary, loaded once per run.
///
/// The on-disk format is a flat JSON object, e.g.
/// `{"ANA": "f", "ION": "m", "POPESCU": "surname"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameLexicon {
    entries: BTreeMap<String, NameCategory>,
}

impl NameLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, NameCategory)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(token, category)| (token.into(), category))
                .collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> LexiconResult<Self> {
        let entries: BTreeMap<String, NameCategory> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> LexiconResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn insert(&mut self, token: impl Into<String>, category: NameCategory) {
        self.entries.insert(token.into(), category);
    }

    /// Looks up a token, ignoring surrounding parentheses.
    pub fn category(&self, token: &str) -> Option<NameCategory> {
        self.entries.get(strip_parentheses(token)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strips maiden-name parentheses, e.g. `(DUMBRAVĂ)` → `DUMBRAVĂ`.
pub fn strip_parentheses(token: &str) -> &str {
    token.trim_matches(|c| c == '(' || c == ')')
}
