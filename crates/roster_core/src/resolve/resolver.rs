//! Review-resolution strategy.
//!
//! The engine never blocks on a human. Every case it cannot settle on its
//! own goes through a [`ReviewResolver`]; the default [`DeferredResolver`]
//! declines everything, which turns each case into a review item.

use crate::audit::ReviewKind;
use crate::lexicon::LexiconResult;
use crate::model::observation::{Gender, PersonId, TimeBucket};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// An overlap the transition and split rules could not settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapCase {
    pub person_id: PersonId,
    /// [`ReviewKind::ResidualOverlap`] or [`ReviewKind::AmbiguousSplit`].
    pub kind: ReviewKind,
    /// The person's whole career, one entry per bucket, units sorted.
    pub sequence: Vec<(TimeBucket, Vec<String>)>,
    /// Inclusive index range into `sequence` of the unresolved run.
    pub run: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlapResolution {
    /// Leave the rows untouched and queue the case for review.
    Flag,
    /// For a residual overlap: keep only this unit in the run.
    /// For an ambiguous split: this unit's rows keep the ID and every other
    /// unit moves to one new ID.
    Keep(String),
}

/// Strategy consulted for ambiguous cases.
pub trait ReviewResolver {
    /// Settles given names that mix female and male tokens.
    ///
    /// Returning [`Gender::Dk`] leaves the contradiction in the review queue.
    fn resolve_ambiguous_gender(&self, given_names: &[String]) -> Gender;

    fn resolve_overlap(&self, case: &OverlapCase) -> OverlapResolution;
}

/// Declines every case.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredResolver;

impl ReviewResolver for DeferredResolver {
    fn resolve_ambiguous_gender(&self, _given_names: &[String]) -> Gender {
        Gender::Dk
    }

    fn resolve_overlap(&self, _case: &OverlapCase) -> OverlapResolution {
        OverlapResolution::Flag
    }
}

/// Replays decisions recorded from an earlier review round.
///
/// Genders are keyed by the space-joined given names; overlap decisions by
/// person ID. Anything unrecorded is deferred.
///
/// On disk: `{"genders": {"MARIA ION": "m"}, "kept_units": {"17": "J1"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedResolver {
    genders: BTreeMap<String, Gender>,
    kept_units: BTreeMap<PersonId, String>,
}

impl RecordedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> LexiconResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> LexiconResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_gender(mut self, given_names: impl Into<String>, gender: Gender) -> Self {
        self.genders.insert(given_names.into(), gender);
        self
    }

    pub fn with_kept_unit(mut self, person_id: PersonId, unit: impl Into<String>) -> Self {
        self.kept_units.insert(person_id, unit.into());
        self
    }

    /// Number of recorded decisions.
    pub fn len(&self) -> usize {
        self.genders.len() + self.kept_units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReviewResolver for RecordedResolver {
    fn resolve_ambiguous_gender(&self, given_names: &[String]) -> Gender {
        self.genders
            .get(&given_names.join(" "))
            .copied()
            .unwrap_or(Gender::Dk)
    }

    fn resolve_overlap(&self, case: &OverlapCase) -> OverlapResolution {
        match self.kept_units.get(&case.person_id) {
            Some(unit) => OverlapResolution::Keep(unit.clone()),
            None => OverlapResolution::Flag,
        }
    }
}
