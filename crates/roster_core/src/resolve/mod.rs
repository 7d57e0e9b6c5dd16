//! Entity-resolution engine.
//!
//! # Responsibility
//! - Clean name variants until the set of distinct full names stops
//!   shrinking, then group rows into person IDs.
//! - Remove or split temporal double-bookings of one person ID.
//!
//! # Invariants
//! - Every pass is a pure, deterministic transformation of the in-memory
//!   table; each pass sorts its own input when it depends on adjacency.
//! - Ambiguity is deferred to a [`ReviewResolver`] or the review queue;
//!   only internal invariant violations surface as [`ResolveError`].

use crate::model::observation::{ObservationValidationError, PersonId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod engine;
pub mod fuzzy;
pub mod gender;
pub mod lengthen;
pub mod misplaced;
pub mod near_duplicate;
pub mod order;
pub mod overlap;
pub mod overrides;
pub mod person_id;
pub mod pipeline;
pub mod resolver;
pub mod sample;
pub mod shared_component;
pub mod units;

mod translate;

pub use engine::{Engine, Resolution};
pub use resolver::{
    DeferredResolver, OverlapCase, OverlapResolution, RecordedResolver, ReviewResolver,
};

/// Pass names as they appear in the change log.
pub mod pass {
    pub const APPLY_OVERRIDES: &str = "apply_overrides";
    pub const MOVE_SURNAME: &str = "move_surname";
    pub const LENGTHEN_SURNAME: &str = "lengthen_surname";
    pub const LENGTHEN_GIVEN_NAMES: &str = "lengthen_given_names";
    pub const MERGE_NEAR_DUPLICATES: &str = "merge_near_duplicates";
    pub const MERGE_SHARED_COMPONENTS: &str = "merge_shared_components";
    pub const REMOVE_TRANSITION_OVERLAP: &str = "remove_transition_overlap";
    pub const SPLIT_OVERLAPPING_CAREERS: &str = "split_overlapping_careers";
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Fatal engine error: bad input or a broken internal invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    InvalidObservation {
        index: usize,
        source: ObservationValidationError,
    },
    RowCountDrift {
        pass: &'static str,
        expected: usize,
        actual: usize,
    },
    SplitNotDisjoint {
        person_id: PersonId,
    },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidObservation { index, source } => {
                write!(f, "invalid observation at row {index}: {source}")
            }
            Self::RowCountDrift {
                pass,
                expected,
                actual,
            } => write!(
                f,
                "pass `{pass}` changed the row count from {expected} to {actual}"
            ),
            Self::SplitNotDisjoint { person_id } => write!(
                f,
                "career split for person {person_id} produced overlapping groups"
            ),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidObservation { source, .. } => Some(source),
            Self::RowCountDrift { .. } | Self::SplitNotDisjoint { .. } => None,
        }
    }
}
