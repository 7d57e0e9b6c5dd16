//! Truncated-name lengthening.
//!
//! OCR and clerical truncation drop trailing name components. Within a run
//! of time-adjacent rows that agree on the other name field and share a
//! token with a multi-token seed, the shorter variants are rewritten to the
//! longest one.
//!
//! # Invariants
//! - Rows are rewritten in place; the row count never changes.
//! - The backward search never crosses the start of the current search,
//!   so a row belongs to at most one run per pass.
//! - A row is only rewritten when its token count differs from the
//!   longest variant; equal-count variants are left to the other passes.

use super::{pass, ResolveError, ResolveResult};
use crate::audit::ChangeLog;
use crate::model::observation::{token_count, Granularity, Observation};
use log::debug;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Name field a lengthening pass rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Surname,
    GivenNames,
}

impl NameField {
    pub fn pass_name(self) -> &'static str {
        match self {
            Self::Surname => pass::LENGTHEN_SURNAME,
            Self::GivenNames => pass::LENGTHEN_GIVEN_NAMES,
        }
    }

    fn target(self, row: &Observation) -> &str {
        match self {
            Self::Surname => &row.surname,
            Self::GivenNames => &row.given_names,
        }
    }

    fn fixed(self, row: &Observation) -> &str {
        match self {
            Self::Surname => &row.given_names,
            Self::GivenNames => &row.surname,
        }
    }

    fn set(self, row: &mut Observation, value: &str) {
        match self {
            Self::Surname => row.surname = value.to_string(),
            Self::GivenNames => row.given_names = value.to_string(),
        }
    }
}

/// Default search window: the dataset's span in buckets.
pub fn default_window(rows: &[Observation], granularity: Granularity) -> usize {
    let years = rows.iter().map(|row| row.year);
    let span = match (years.clone().min(), years.max()) {
        (Some(min), Some(max)) => usize::try_from(max - min + 1).unwrap_or(1),
        _ => 1,
    };
    match granularity {
        Granularity::Year => span,
        Granularity::Month => span * 12,
    }
}

/// Sorts by (fixed field, target field, time) and lengthens `field`.
///
/// `window` is a row count, not a time span: a run reaches at most
/// `window` rows before and after its seed in sort order.
/// Returns the number of rewritten rows.
pub fn lengthen_names(
    rows: &mut [Observation],
    field: NameField,
    window: usize,
    log: &mut ChangeLog,
) -> ResolveResult<usize> {
    let expected = rows.len();
    rows.sort_by(|a, b| lengthen_order(field, a, b));

    let mut rewritten = 0;
    let mut changes = BTreeSet::new();
    let mut start = 0;
    while start < rows.len() {
        let Some(seed) = (start..rows.len()).find(|&idx| token_count(field.target(&rows[idx])) >= 2)
        else {
            break;
        };

        let (low, high) = run_bounds(rows, field, seed, start, window);
        let longest = longest_variant(&rows[low..high], field);
        let longest_tokens = token_count(&longest);

        for row in &mut rows[low..high] {
            if token_count(field.target(row)) == longest_tokens {
                continue;
            }
            let before = row.full_name();
            field.set(row, &longest);
            changes.insert((before, row.full_name()));
            rewritten += 1;
        }

        start = high;
    }

    if rows.len() != expected {
        return Err(ResolveError::RowCountDrift {
            pass: field.pass_name(),
            expected,
            actual: rows.len(),
        });
    }

    for (before, after) in changes {
        log.record(field.pass_name(), before, after);
    }
    debug!(
        "event=lengthen module=resolve pass={} rewritten={rewritten}",
        field.pass_name()
    );
    Ok(rewritten)
}

fn lengthen_order(field: NameField, a: &Observation, b: &Observation) -> Ordering {
    field
        .fixed(a)
        .cmp(field.fixed(b))
        .then_with(|| field.target(a).cmp(field.target(b)))
        .then_with(|| a.bucket().cmp(&b.bucket()))
        .then_with(|| a.unit.cmp(&b.unit))
}

/// Half-open `[low, high)` run around `seed`, with `low >= start`.
fn run_bounds(
    rows: &[Observation],
    field: NameField,
    seed: usize,
    start: usize,
    window: usize,
) -> (usize, usize) {
    let seed_row = &rows[seed];
    let seed_tokens = field
        .target(seed_row)
        .split_whitespace()
        .collect::<HashSet<_>>();
    let fixed = field.fixed(seed_row);
    let joins_run = |row: &Observation| {
        field.fixed(row) == fixed
            && field
                .target(row)
                .split_whitespace()
                .any(|token| seed_tokens.contains(token))
    };

    let mut high = seed + 1;
    while high < rows.len() && high - seed <= window && joins_run(&rows[high]) {
        high += 1;
    }

    let mut low = seed;
    while low > start && seed - (low - 1) <= window && joins_run(&rows[low - 1]) {
        low -= 1;
    }

    (low, high)
}

/// Longest value by character count; the first one wins ties.
fn longest_variant(run: &[Observation], field: NameField) -> String {
    let mut best = "";
    let mut best_len = 0;
    for row in run {
        let value = field.target(row);
        let len = value.chars().count();
        if len > best_len {
            best = value;
            best_len = len;
        }
    }
    best.to_string()
}
