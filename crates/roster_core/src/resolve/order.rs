//! Name-component order normalization.

use crate::model::observation::Observation;

/// Sorts the whitespace-separated tokens of one field by codepoint order.
///
/// Diacritic letters sort after `Z`; only consistency matters here.
pub fn canonical_order(field: &str) -> String {
    let mut tokens = field.split_whitespace().collect::<Vec<_>>();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Rewrites both name fields of every row into canonical order.
///
/// Returns the number of rows whose name changed. Idempotent.
pub fn normalize_order(rows: &mut [Observation]) -> usize {
    let mut changed = 0;
    for row in rows.iter_mut() {
        let surname = canonical_order(&row.surname);
        let given_names = canonical_order(&row.given_names);
        if surname != row.surname || given_names != row.given_names {
            row.surname = surname;
            row.given_names = given_names;
            changed += 1;
        }
    }
    changed
}
