//! Person-period observation model.
//!
//! # Responsibility
//! - Define the atomic row of the roster panel.
//! - Provide full-name rendering, time bucketing and exact-duplicate removal.
//!
//! # Invariants
//! - `surname` and `given_names` are uppercase, space-separated tokens.
//! - `month`, when set, lies in `1..=12`.
//! - Derived fields (`gender`, `person_id`, `level`) start as `None` and are
//!   only filled by the resolution engine.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator between surname and given names in rendered full names.
pub const FULL_NAME_SEPARATOR: &str = " | ";

/// Integer person identifier; reassignable by the overlap resolver.
pub type PersonId = u64;

/// Gender label derived from given-name tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    F,
    M,
    /// Unknown or gender-neutral given names.
    Dk,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F => "f",
            Self::M => "m",
            Self::Dk => "dk",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "f" => Some(Self::F),
            "m" => Some(Self::M),
            "dk" => Some(Self::Dk),
            _ => None,
        }
    }
}

/// Time granularity of a person-period table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Year,
    Month,
}

impl Granularity {
    /// Month granularity when every row carries a month, year otherwise.
    ///
    /// An empty table is treated as year-level.
    pub fn detect(rows: &[Observation]) -> Self {
        if !rows.is_empty() && rows.iter().all(|row| row.month.is_some()) {
            Self::Month
        } else {
            Self::Year
        }
    }
}

/// One year (or year-month) slot of a career sequence.
///
/// Ordering is chronological: year first, then month (`None` sorts first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeBucket {
    pub year: i32,
    pub month: Option<u32>,
}

impl Display for TimeBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{:02}", self.year, month),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Validation failures for raw observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationValidationError {
    EmptyName,
    EmptyUnit,
    MonthOutOfRange(u32),
}

impl Display for ObservationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "observation has neither surname nor given names"),
            Self::EmptyUnit => write!(f, "observation has an empty unit"),
            Self::MonthOutOfRange(month) => write!(f, "month {month} is outside 1..=12"),
        }
    }
}

impl Error for ObservationValidationError {}

/// One person-period row of the roster panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Zero or more surnames, space-separated.
    pub surname: String,
    /// Given names, space-separated.
    pub given_names: String,
    /// Opaque unit name or composite hierarchy code.
    pub unit: String,
    pub year: i32,
    pub month: Option<u32>,
    pub gender: Option<Gender>,
    pub person_id: Option<PersonId>,
    /// Hierarchy level of `unit` (1 = local court .. 4 = national body).
    pub level: Option<u8>,
}

impl Observation {
    /// Creates a raw row with derived fields unset.
    pub fn new(
        surname: impl Into<String>,
        given_names: impl Into<String>,
        unit: impl Into<String>,
        year: i32,
        month: Option<u32>,
    ) -> Self {
        Self {
            surname: surname.into(),
            given_names: given_names.into(),
            unit: unit.into(),
            year,
            month,
            gender: None,
            person_id: None,
            level: None,
        }
    }

    /// Copies unit and time from `self` onto a row carrying a different name.
    pub fn with_name(&self, surname: impl Into<String>, given_names: impl Into<String>) -> Self {
        Self::new(
            surname,
            given_names,
            self.unit.clone(),
            self.year,
            self.month,
        )
    }

    /// Returns `SURNAME | GIVEN NAMES`.
    pub fn full_name(&self) -> String {
        full_name(&self.surname, &self.given_names)
    }

    pub fn bucket(&self) -> TimeBucket {
        TimeBucket {
            year: self.year,
            month: self.month,
        }
    }

    /// Bucket at `granularity`; year granularity drops the month.
    pub fn bucket_at(&self, granularity: Granularity) -> TimeBucket {
        match granularity {
            Granularity::Year => TimeBucket {
                year: self.year,
                month: None,
            },
            Granularity::Month => self.bucket(),
        }
    }

    /// Validates raw-row invariants.
    pub fn validate(&self) -> Result<(), ObservationValidationError> {
        if self.surname.trim().is_empty() && self.given_names.trim().is_empty() {
            return Err(ObservationValidationError::EmptyName);
        }
        if self.unit.trim().is_empty() {
            return Err(ObservationValidationError::EmptyUnit);
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ObservationValidationError::MonthOutOfRange(month));
            }
        }
        Ok(())
    }
}

/// Renders a full name from its two fields.
pub fn full_name(surname: &str, given_names: &str) -> String {
    format!("{surname}{FULL_NAME_SEPARATOR}{given_names}")
}

/// Splits a rendered full name back into `(surname, given_names)`.
pub fn split_full_name(value: &str) -> Option<(&str, &str)> {
    value.split_once(FULL_NAME_SEPARATOR)
}

/// Number of whitespace-separated tokens in a name field.
pub fn token_count(field: &str) -> usize {
    field.split_whitespace().count()
}

/// Number of distinct full names in the table.
pub fn distinct_full_names(rows: &[Observation]) -> usize {
    rows.iter()
        .map(|row| (row.surname.as_str(), row.given_names.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

/// Removes rows identical on name, unit and time, keeping the first.
///
/// Returns the number of removed rows.
pub fn dedup_exact(rows: &mut Vec<Observation>) -> usize {
    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| {
        seen.insert((
            row.surname.clone(),
            row.given_names.clone(),
            row.unit.clone(),
            row.year,
            row.month,
        ))
    });
    before - rows.len()
}
