//! Full-name translation map shared by the merge passes.

use crate::audit::ChangeLog;
use crate::model::observation::{split_full_name, Observation};
use std::collections::BTreeMap;

/// Old full name → canonical full name, applied in one rewrite.
///
/// First writer wins per key. A mapping is refused when its target is
/// already a key or its key is already a target, so one application never
/// chains or swaps names.
#[derive(Debug, Default)]
pub(crate) struct TranslationMap {
    entries: BTreeMap<String, String>,
}

impl TranslationMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the mapping was accepted.
    pub(crate) fn insert(&mut self, from: &str, to: &str) -> bool {
        if from == to
            || self.entries.contains_key(from)
            || self.entries.contains_key(to)
            || self.entries.values().any(|target| target == from)
        {
            return false;
        }
        self.entries.insert(from.to_string(), to.to_string());
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rewrites matching rows and change-logs every accepted mapping.
    ///
    /// Returns the number of rewritten rows.
    pub(crate) fn apply(&self, rows: &mut [Observation], pass: &str, log: &mut ChangeLog) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        let mut rewritten = 0;
        for row in rows.iter_mut() {
            let Some(target) = self.entries.get(&row.full_name()) else {
                continue;
            };
            if let Some((surname, given_names)) = split_full_name(target) {
                row.surname = surname.to_string();
                row.given_names = given_names.to_string();
                rewritten += 1;
            }
        }

        for (from, to) in &self.entries {
            log.record(pass, from.as_str(), to.as_str());
        }
        rewritten
    }
}
