//! Name-cleaning convergence loop.
//!
//! One iteration runs every cleaning pass in a fixed order and removes
//! exact duplicates after each pass. Iterations repeat until the number of
//! distinct full names stops changing, or the configured ceiling is hit.

use super::lengthen::{default_window, lengthen_names, NameField};
use super::misplaced::move_misplaced_surnames;
use super::near_duplicate::{merge_near_duplicates, NearDuplicateRules};
use super::order::normalize_order;
use super::shared_component::merge_shared_components;
use super::ResolveResult;
use crate::audit::{ChangeLog, ReviewQueue};
use crate::config::EngineConfig;
use crate::lexicon::NameLexicon;
use crate::model::observation::{dedup_exact, distinct_full_names, Granularity, Observation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How the convergence loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    CeilingHit,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::CeilingHit => "ceiling_hit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "converged" => Some(Self::Converged),
            "ceiling_hit" => Some(Self::CeilingHit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningOutcome {
    /// Cleaned rows sorted by (surname, given names, time, unit).
    pub rows: Vec<Observation>,
    pub iterations: usize,
    pub termination: Termination,
}

/// Runs the cleaning passes to a fixed point.
pub fn clean_names(
    rows: Vec<Observation>,
    lexicon: &NameLexicon,
    config: &EngineConfig,
    granularity: Granularity,
    log: &mut ChangeLog,
    review: &mut ReviewQueue,
) -> ResolveResult<CleaningOutcome> {
    let window = config
        .lengthen_window
        .unwrap_or_else(|| default_window(&rows, granularity));
    let rules = NearDuplicateRules::from(config);

    let mut rows = rows;
    dedup_exact(&mut rows);
    let mut termination = Termination::CeilingHit;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;
        let names_before = distinct_full_names(&rows);

        let outcome = move_misplaced_surnames(rows, lexicon, log, review);
        rows = outcome.rows;
        dedup_exact(&mut rows);

        normalize_order(&mut rows);
        dedup_exact(&mut rows);

        lengthen_names(&mut rows, NameField::Surname, window, log)?;
        dedup_exact(&mut rows);

        lengthen_names(&mut rows, NameField::GivenNames, window, log)?;
        dedup_exact(&mut rows);

        merge_near_duplicates(&mut rows, &rules, log);
        dedup_exact(&mut rows);

        merge_shared_components(&mut rows, config.shared_component_min_shared, log);
        dedup_exact(&mut rows);

        let names_after = distinct_full_names(&rows);
        info!(
            "event=clean_iteration module=resolve iteration={iterations} names_before={names_before} names_after={names_after} rows={} splits={}",
            rows.len(),
            outcome.splits
        );

        if names_after == names_before {
            termination = Termination::Converged;
            break;
        }
    }

    let names = rows.iter().map(Observation::full_name).collect::<HashSet<_>>();
    let stale = review.retain_ambiguous_surnames(|name| names.contains(name));
    if stale > 0 {
        debug!("event=review_pruned module=resolve kind=ambiguous_surname_tokens count={stale}");
    }

    if termination == Termination::CeilingHit {
        warn!(
            "event=clean_ceiling module=resolve max_iterations={} status=not_converged",
            config.max_iterations
        );
    }

    rows.sort_by(|a, b| {
        a.surname
            .cmp(&b.surname)
            .then_with(|| a.given_names.cmp(&b.given_names))
            .then_with(|| a.bucket().cmp(&b.bucket()))
            .then_with(|| a.unit.cmp(&b.unit))
    });

    Ok(CleaningOutcome {
        rows,
        iterations,
        termination,
    })
}

