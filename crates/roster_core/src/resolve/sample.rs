//! Person-month to person-year sampling.
//!
//! A resolved monthly panel is first reduced to person-quarters by keeping
//! the earliest observed month of every quarter, so a one-month blip does not
//! decide where someone worked. A person-year is then the person-quarter of
//! one chosen quarter; years in which that quarter was never observed are
//! skipped.

use crate::model::observation::{Observation, PersonId};
use log::{debug, info};
use std::collections::BTreeMap;

/// Calendar quarter, 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quarter(u8);

impl Quarter {
    pub fn new(value: u8) -> Option<Self> {
        (1..=4).contains(&value).then_some(Self(value))
    }

    /// Quarter containing `month`, or `None` outside 1..=12.
    pub fn of_month(month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        u8::try_from((month - 1) / 3 + 1).ok().map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

type QuarterKey = (Option<PersonId>, i32, Quarter);

/// One row per (person, year, quarter): the earliest month observed in it.
///
/// Rows without a month are skipped. Output is sorted by person, year and
/// quarter.
pub fn person_quarters(rows: &[Observation]) -> Vec<Observation> {
    let mut monthly = rows
        .iter()
        .filter_map(|row| {
            let quarter = row.month.and_then(Quarter::of_month)?;
            Some((quarter, row))
        })
        .collect::<Vec<_>>();
    let skipped = rows.len() - monthly.len();
    monthly.sort_by(|(_, a), (_, b)| {
        (a.person_id, a.year, a.month, &a.unit).cmp(&(b.person_id, b.year, b.month, &b.unit))
    });

    let mut first = BTreeMap::<QuarterKey, &Observation>::new();
    for (quarter, row) in monthly {
        first.entry((row.person_id, row.year, quarter)).or_insert(row);
    }

    if skipped > 0 {
        debug!("event=sample_skip module=resolve reason=no_month rows={skipped}");
    }
    first.into_values().cloned().collect()
}

/// One row per (person, year), taken from `quarter`.
pub fn person_years(rows: &[Observation], quarter: Quarter) -> Vec<Observation> {
    let quarters = person_quarters(rows);
    let quarter_rows = quarters.len();
    let years = quarters
        .into_iter()
        .filter(|row| row.month.and_then(Quarter::of_month) == Some(quarter))
        .collect::<Vec<_>>();

    info!(
        "event=person_year_sample module=resolve quarter={} rows_in={} person_quarters={quarter_rows} person_years={}",
        quarter.get(),
        rows.len(),
        years.len()
    );
    years
}
