//! End-to-end resolution run.

use super::gender::assign_genders;
use super::overlap::{resolve_overlaps, OverlapPolicy, OverlapReport};
use super::overrides::apply_overrides;
use super::person_id::assign_person_ids;
use super::pipeline::{clean_names, Termination};
use super::resolver::{DeferredResolver, ReviewResolver};
use super::units::annotate_units;
use super::{ResolveError, ResolveResult};
use crate::audit::{ChangeLog, ReviewQueue};
use crate::config::EngineConfig;
use crate::lexicon::{NameLexicon, NameOverrides, UnitDirectory};
use crate::model::observation::{Granularity, Observation};
use log::info;
use std::collections::BTreeSet;
use std::time::Instant;

/// Output of one run: the resolved panel plus its audit trail.
#[derive(Debug)]
pub struct Resolution {
    /// Rows sorted by (person ID, time, unit).
    pub rows: Vec<Observation>,
    pub change_log: ChangeLog,
    pub review: ReviewQueue,
    pub granularity: Granularity,
    pub iterations: usize,
    pub termination: Termination,
    pub person_count: usize,
    pub overlaps: OverlapReport,
}

/// Resolution engine over immutable side tables.
pub struct Engine {
    lexicon: NameLexicon,
    units: UnitDirectory,
    overrides: NameOverrides,
    config: EngineConfig,
    resolver: Box<dyn ReviewResolver>,
}

impl Engine {
    /// Creates an engine that defers every ambiguous case to review.
    pub fn new(lexicon: NameLexicon, units: UnitDirectory, config: EngineConfig) -> Self {
        Self {
            lexicon,
            units,
            overrides: NameOverrides::default(),
            config,
            resolver: Box::new(DeferredResolver),
        }
    }

    pub fn with_overrides(mut self, overrides: NameOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_resolver(mut self, resolver: impl ReviewResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every pass under a fresh run ID.
    pub fn run(&self, rows: Vec<Observation>) -> ResolveResult<Resolution> {
        self.run_with_log(rows, ChangeLog::new())
    }

    /// Runs every pass, appending to a caller-provided change log.
    ///
    /// # Errors
    /// - [`ResolveError::InvalidObservation`] for an empty name, empty unit
    ///   or out-of-range month.
    /// - Internal invariant violations raised by individual passes.
    pub fn run_with_log(
        &self,
        mut rows: Vec<Observation>,
        mut log: ChangeLog,
    ) -> ResolveResult<Resolution> {
        let started = Instant::now();
        for (index, row) in rows.iter().enumerate() {
            row.validate()
                .map_err(|source| ResolveError::InvalidObservation { index, source })?;
        }

        let input_rows = rows.len();
        let granularity = self
            .config
            .granularity
            .unwrap_or_else(|| Granularity::detect(&rows));
        let mut review = ReviewQueue::new();
        info!(
            "event=resolve_start module=resolve run_id={} rows={input_rows} granularity={granularity:?}",
            log.run_id()
        );

        apply_overrides(&mut rows, &self.overrides, &mut log);
        let cleaned = clean_names(
            rows,
            &self.lexicon,
            &self.config,
            granularity,
            &mut log,
            &mut review,
        )?;
        let mut rows = cleaned.rows;

        assign_genders(&mut rows, &self.lexicon, self.resolver.as_ref(), &mut review);
        annotate_units(&mut rows, &self.units, &mut review);
        assign_person_ids(&mut rows);

        let policy = OverlapPolicy {
            granularity,
            max_transition_buckets: self.config.max_transition_buckets(granularity),
        };
        let overlaps = resolve_overlaps(
            &mut rows,
            &self.units,
            policy,
            self.resolver.as_ref(),
            &mut log,
            &mut review,
        )?;

        rows.sort_by(|a, b| {
            a.person_id
                .cmp(&b.person_id)
                .then_with(|| a.bucket().cmp(&b.bucket()))
                .then_with(|| a.unit.cmp(&b.unit))
        });
        let person_count = rows
            .iter()
            .filter_map(|row| row.person_id)
            .collect::<BTreeSet<_>>()
            .len();

        info!(
            "event=resolve_finish module=resolve run_id={} rows_in={input_rows} rows_out={} persons={person_count} iterations={} termination={} changes={} review_items={} elapsed_ms={}",
            log.run_id(),
            rows.len(),
            cleaned.iterations,
            cleaned.termination.as_str(),
            log.len(),
            review.len(),
            started.elapsed().as_millis()
        );

        Ok(Resolution {
            rows,
            change_log: log,
            review,
            granularity,
            iterations: cleaned.iterations,
            termination: cleaned.termination,
            person_count,
            overlaps,
        })
    }
}
