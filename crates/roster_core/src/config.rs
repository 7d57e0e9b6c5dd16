//! Engine tuning parameters.
//!
//! # Responsibility
//! - Hold every bound the resolution passes consult.
//! - Load overrides from JSON while defaulting omitted fields.
//!
//! # Invariants
//! - `max_iterations` is at least 1 so the convergence loop always runs.
//! - Overlap transition bounds are at least one bucket.

use crate::model::observation::Granularity;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid engine config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid engine config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Bounds and thresholds for the resolution passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `None` detects granularity from the input rows.
    pub granularity: Option<Granularity>,
    /// Ceiling for the name-cleaning convergence loop.
    pub max_iterations: usize,
    pub near_duplicate_max_distance: usize,
    pub near_duplicate_min_components: usize,
    pub near_duplicate_min_chars: usize,
    /// Both surnames must be this long before an edit-distance merge.
    pub near_duplicate_min_surname_chars: usize,
    pub shared_component_min_shared: usize,
    /// Longest double-booking treated as a transition artifact, in months.
    pub max_transition_months: usize,
    /// Longest double-booking treated as a transition artifact, in years.
    pub max_transition_years: usize,
    /// Lengthener search window in rows; `None` uses the dataset's year span
    /// (times 12 at month granularity).
    pub lengthen_window: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            granularity: None,
            max_iterations: 16,
            near_duplicate_max_distance: 2,
            near_duplicate_min_components: 3,
            near_duplicate_min_chars: 20,
            near_duplicate_min_surname_chars: 4,
            shared_component_min_shared: 3,
            max_transition_months: 5,
            max_transition_years: 2,
            lengthen_window: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.max_transition_months == 0 || self.max_transition_years == 0 {
            return Err(ConfigError::Invalid(
                "transition bounds must be at least one bucket".to_string(),
            ));
        }
        if self.shared_component_min_shared == 0 {
            return Err(ConfigError::Invalid(
                "shared_component_min_shared must be at least 1".to_string(),
            ));
        }
        if self.lengthen_window == Some(0) {
            return Err(ConfigError::Invalid(
                "lengthen_window must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlap transition bound for the given granularity.
    pub fn max_transition_buckets(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Year => self.max_transition_years,
            Granularity::Month => self.max_transition_months,
        }
    }
}
