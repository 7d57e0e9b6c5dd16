//! Audit repository contract and SQLite implementation.

use crate::audit::{ChangeEntry, ChangeLog, ReviewItem, ReviewKind, ReviewQueue};
use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::observation::{Granularity, Observation, PersonId};
use crate::resolve::pipeline::Termination;
use crate::resolve::Resolution;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Json(serde_json::Error),
    /// The connection's schema is behind this build; open it through `open_db`.
    SchemaNotReady { db_version: u32, expected: u32 },
    DuplicateRun(Uuid),
    /// The change log belongs to another run than the summary.
    RunMismatch { summary: Uuid, change_log: Uuid },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid review rows json: {err}"),
            Self::SchemaNotReady {
                db_version,
                expected,
            } => write!(
                f,
                "audit schema version {db_version} does not match expected {expected}"
            ),
            Self::DuplicateRun(id) => write!(f, "run already recorded: {id}"),
            Self::RunMismatch {
                summary,
                change_log,
            } => write!(
                f,
                "run summary {summary} does not match change log run {change_log}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted audit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::SchemaNotReady { .. }
            | Self::DuplicateRun(_)
            | Self::RunMismatch { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Header row of one recorded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at_ms: i64,
    pub granularity: Granularity,
    pub iterations: usize,
    pub termination: Termination,
    pub row_count: usize,
    pub person_count: usize,
}

impl RunSummary {
    pub fn from_resolution(resolution: &Resolution) -> Self {
        Self {
            run_id: resolution.change_log.run_id(),
            started_at_ms: resolution.change_log.started_at_ms(),
            granularity: resolution.granularity,
            iterations: resolution.iterations,
            termination: resolution.termination,
            row_count: resolution.rows.len(),
            person_count: resolution.person_count,
        }
    }
}

/// Repository interface for the persistent run log.
pub trait AuditRepository {
    fn record_run(
        &self,
        run: &RunSummary,
        changes: &ChangeLog,
        review: &ReviewQueue,
    ) -> RepoResult<()>;
    /// Most recent runs first.
    fn list_runs(&self, limit: Option<u32>) -> RepoResult<Vec<RunSummary>>;
    /// Change-log entries in recording order.
    fn list_changes(&self, run_id: Uuid) -> RepoResult<Vec<ChangeEntry>>;
    /// Review items in recording order.
    fn list_review_items(&self, run_id: Uuid) -> RepoResult<Vec<ReviewItem>>;
}

/// SQLite-backed audit repository.
pub struct SqliteAuditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditRepository<'conn> {
    /// Wraps a connection whose schema is fully migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let db_version = current_version(conn)?;
        let expected = latest_version();
        if db_version != expected {
            return Err(RepoError::SchemaNotReady {
                db_version,
                expected,
            });
        }
        Ok(Self { conn })
    }
}

impl AuditRepository for SqliteAuditRepository<'_> {
    fn record_run(
        &self,
        run: &RunSummary,
        changes: &ChangeLog,
        review: &ReviewQueue,
    ) -> RepoResult<()> {
        if run.run_id != changes.run_id() {
            return Err(RepoError::RunMismatch {
                summary: run.run_id,
                change_log: changes.run_id(),
            });
        }

        let tx = self.conn.unchecked_transaction()?;
        let run_id = run.run_id.to_string();

        let exists = tx
            .query_row(
                "SELECT 1 FROM pipeline_runs WHERE run_id = ?1;",
                [run_id.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(RepoError::DuplicateRun(run.run_id));
        }

        tx.execute(
            "INSERT INTO pipeline_runs (
                run_id,
                started_at,
                granularity,
                iterations,
                termination,
                row_count,
                person_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                run_id.as_str(),
                run.started_at_ms,
                granularity_to_db(run.granularity),
                to_db_int(run.iterations, "iterations")?,
                run.termination.as_str(),
                to_db_int(run.row_count, "row_count")?,
                to_db_int(run.person_count, "person_count")?,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO change_log (run_id, seq, pass, before_value, after_value)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (seq, entry) in changes.entries().iter().enumerate() {
                stmt.execute(params![
                    run_id.as_str(),
                    to_db_int(seq, "seq")?,
                    entry.pass.as_str(),
                    entry.before.as_str(),
                    entry.after.as_str(),
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO review_items (run_id, seq, kind, person_id, detail, rows_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            for (seq, item) in review.items().iter().enumerate() {
                let person_id = item
                    .person_id
                    .map(|id| {
                        i64::try_from(id).map_err(|_| {
                            RepoError::InvalidData(format!("person id {id} exceeds i64"))
                        })
                    })
                    .transpose()?;
                stmt.execute(params![
                    run_id.as_str(),
                    to_db_int(seq, "seq")?,
                    item.kind.as_str(),
                    person_id,
                    item.detail.as_str(),
                    serde_json::to_string(&item.rows)?,
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "event=audit_record module=repo status=ok run_id={run_id} changes={} review_items={}",
            changes.len(),
            review.len()
        );
        Ok(())
    }

    fn list_runs(&self, limit: Option<u32>) -> RepoResult<Vec<RunSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                run_id,
                started_at,
                granularity,
                iterations,
                termination,
                row_count,
                person_count
             FROM pipeline_runs
             ORDER BY started_at DESC, run_id ASC
             LIMIT ?1;",
        )?;
        let limit = limit.map_or(-1, i64::from);
        let mut rows = stmt.query([limit])?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next()? {
            runs.push(parse_run_row(row)?);
        }
        Ok(runs)
    }

    fn list_changes(&self, run_id: Uuid) -> RepoResult<Vec<ChangeEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT pass, before_value, after_value
             FROM change_log
             WHERE run_id = ?1
             ORDER BY seq ASC;",
        )?;
        let entries = stmt
            .query_map([run_id.to_string()], |row| {
                Ok(ChangeEntry {
                    pass: row.get("pass")?,
                    before: row.get("before_value")?,
                    after: row.get("after_value")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn list_review_items(&self, run_id: Uuid) -> RepoResult<Vec<ReviewItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, person_id, detail, rows_json
             FROM review_items
             WHERE run_id = ?1
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([run_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_review_row(row)?);
        }
        Ok(items)
    }
}

fn parse_run_row(row: &Row<'_>) -> RepoResult<RunSummary> {
    let run_id_text: String = row.get("run_id")?;
    let run_id = Uuid::parse_str(&run_id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{run_id_text}` in pipeline_runs.run_id"
        ))
    })?;

    let granularity_text: String = row.get("granularity")?;
    let granularity = parse_granularity(&granularity_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid granularity `{granularity_text}` in pipeline_runs.granularity"
        ))
    })?;

    let termination_text: String = row.get("termination")?;
    let termination = Termination::parse(&termination_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid termination `{termination_text}` in pipeline_runs.termination"
        ))
    })?;

    Ok(RunSummary {
        run_id,
        started_at_ms: row.get("started_at")?,
        granularity,
        iterations: from_db_int(row.get("iterations")?, "iterations")?,
        termination,
        row_count: from_db_int(row.get("row_count")?, "row_count")?,
        person_count: from_db_int(row.get("person_count")?, "person_count")?,
    })
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<ReviewItem> {
    let kind_text: String = row.get("kind")?;
    let kind = ReviewKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid review kind `{kind_text}` in review_items.kind"))
    })?;

    let person_id = row
        .get::<_, Option<i64>>("person_id")?
        .map(|id| {
            PersonId::try_from(id).map_err(|_| {
                RepoError::InvalidData(format!("negative person id {id} in review_items"))
            })
        })
        .transpose()?;

    let rows_json: String = row.get("rows_json")?;
    let rows: Vec<Observation> = serde_json::from_str(&rows_json)?;

    let mut item = ReviewItem::new(kind, row.get::<_, String>("detail")?).with_rows(rows);
    item.person_id = person_id;
    Ok(item)
}

fn granularity_to_db(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Year => "year",
        Granularity::Month => "month",
    }
}

fn parse_granularity(value: &str) -> Option<Granularity> {
    match value {
        "year" => Some(Granularity::Year),
        "month" => Some(Granularity::Month),
        _ => None,
    }
}

fn to_db_int(value: usize, column: &str) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("{column} value {value} exceeds i64")))
}

fn from_db_int(value: i64, column: &str) -> RepoResult<usize> {
    usize::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid {column} value `{value}`")))
}
