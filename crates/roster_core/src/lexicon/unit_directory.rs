//! Unit name → hierarchy code directory.

use super::{LexiconError, LexiconResult};
use crate::model::unit::UnitCode;
use std::collections::BTreeMap;
use std::path::Path;

/// Directory of known units.
///
/// The on-disk format maps a unit name to its code triple:
/// `{"TRIBUNALUL BUCUREŞTI": ["CA1", "TB5", "-88"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitDirectory {
    units: BTreeMap<String, UnitCode>,
}

impl UnitDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> LexiconResult<Self> {
        let raw_units: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;
        let mut units = BTreeMap::new();
        for (name, parts) in raw_units {
            let [branch, sub_branch, local] = <[String; 3]>::try_from(parts).map_err(|parts| {
                LexiconError::InvalidUnitCode {
                    unit: name.clone(),
                    message: format!("expected 3 code parts, got {}", parts.len()),
                }
            })?;
            units.insert(name, UnitCode::new(branch, sub_branch, local));
        }
        Ok(Self { units })
    }

    pub fn load(path: impl AsRef<Path>) -> LexiconResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn insert(&mut self, unit: impl Into<String>, code: UnitCode) {
        self.units.insert(unit.into(), code);
    }

    /// Resolves a unit by directory name, falling back to a composite code.
    ///
    /// Returns `None` when the unit is unknown and not a composite code.
    pub fn resolve(&self, unit: &str) -> Option<UnitCode> {
        let trimmed = unit.trim();
        self.units
            .get(trimmed)
            .cloned()
            .or_else(|| UnitCode::parse(trimmed))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
