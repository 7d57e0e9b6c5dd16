//! Resolution use-case service.
//!
//! # Responsibility
//! - Run the engine and persist the run's audit trail.
//! - Expose read-back of earlier runs for review tooling.
//!
//! # Invariants
//! - A resolution is only returned once its audit trail is recorded.
//! - The service stays storage-agnostic; persistence goes through
//!   [`AuditRepository`].

use crate::audit::{ChangeEntry, ReviewItem};
use crate::model::observation::Observation;
use crate::repo::audit_repo::{AuditRepository, RepoError, RunSummary};
use crate::resolve::{Engine, Resolution, ResolveError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Resolve(ResolveError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resolve(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ResolveError> for ServiceError {
    fn from(value: ResolveError) -> Self {
        Self::Resolve(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Engine plus audit repository.
pub struct ResolutionService<R: AuditRepository> {
    engine: Engine,
    repo: R,
}

impl<R: AuditRepository> ResolutionService<R> {
    pub fn new(engine: Engine, repo: R) -> Self {
        Self { engine, repo }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Resolves `rows` and records the run.
    pub fn resolve(&self, rows: Vec<Observation>) -> ServiceResult<Resolution> {
        let resolution = self.engine.run(rows)?;
        self.repo.record_run(
            &RunSummary::from_resolution(&resolution),
            &resolution.change_log,
            &resolution.review,
        )?;
        Ok(resolution)
    }

    pub fn recent_runs(&self, limit: Option<u32>) -> ServiceResult<Vec<RunSummary>> {
        Ok(self.repo.list_runs(limit)?)
    }

    pub fn run_changes(&self, run_id: Uuid) -> ServiceResult<Vec<ChangeEntry>> {
        Ok(self.repo.list_changes(run_id)?)
    }

    pub fn run_review_items(&self, run_id: Uuid) -> ServiceResult<Vec<ReviewItem>> {
        Ok(self.repo.list_review_items(run_id)?)
    }
}
