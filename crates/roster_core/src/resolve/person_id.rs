//! Initial person-ID assignment.

use crate::model::observation::{Observation, PersonId};
use std::collections::BTreeMap;

/// Gives every distinct full name its own ID, numbered from 1 in
/// (surname, given names) order.
///
/// Returns the number of IDs assigned.
pub fn assign_person_ids(rows: &mut [Observation]) -> usize {
    let mut ids = BTreeMap::<(String, String), PersonId>::new();
    for row in rows.iter() {
        ids.entry((row.surname.clone(), row.given_names.clone()))
            .or_default();
    }
    for (next, id) in (1..).zip(ids.values_mut()) {
        *id = next;
    }

    for row in rows.iter_mut() {
        row.person_id = ids
            .get(&(row.surname.clone(), row.given_names.clone()))
            .copied();
    }
    ids.len()
}

/// Largest ID present, or 0 for a table without IDs.
pub fn max_person_id(rows: &[Observation]) -> PersonId {
    rows.iter().filter_map(|row| row.person_id).max().unwrap_or(0)
}
