//! Entity resolution for noisy magistrate rosters.
//!
//! Turns OCR'd person-period rows into a panel where one `person_id` is one
//! human being, with an audit trail of every rewrite and a queue of the
//! cases left for manual review.

pub mod audit;
pub mod config;
pub mod db;
pub mod lexicon;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resolve;
pub mod service;

pub use audit::{ChangeEntry, ChangeLog, ReviewItem, ReviewKind, ReviewQueue};
pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use lexicon::{LexiconError, LexiconResult, NameCategory, NameLexicon, NameOverrides, UnitDirectory};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::observation::{Gender, Granularity, Observation, PersonId, TimeBucket};
pub use model::unit::{HierarchyDepth, UnitCode};
pub use repo::audit_repo::{
    AuditRepository, RepoError, RepoResult, RunSummary, SqliteAuditRepository,
};
pub use resolve::pipeline::Termination;
pub use resolve::sample::{person_years, Quarter};
pub use resolve::{
    DeferredResolver, Engine, OverlapCase, OverlapResolution, RecordedResolver, Resolution,
    ResolveError, ResolveResult, ReviewResolver,
};
pub use service::resolution_service::{ResolutionService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
