//! Hand-maintained name corrections applied before automatic cleaning.

use super::pass;
use crate::audit::ChangeLog;
use crate::lexicon::NameOverrides;
use crate::model::observation::{split_full_name, Observation};
use std::collections::BTreeSet;

/// Applies full-name, then given-name, then surname overrides.
///
/// Returns the number of rewritten rows.
pub fn apply_overrides(
    rows: &mut [Observation],
    overrides: &NameOverrides,
    log: &mut ChangeLog,
) -> usize {
    if overrides.is_empty() {
        return 0;
    }

    let mut changes = BTreeSet::new();
    let mut rewritten = 0;
    for row in rows.iter_mut() {
        let before = row.full_name();
        if let Some((surname, given_names)) = overrides
            .fullnames
            .get(&before)
            .and_then(|target| split_full_name(target))
        {
            row.surname = surname.to_string();
            row.given_names = given_names.to_string();
        }
        if let Some(given_names) = overrides.given_names.get(&row.given_names) {
            row.given_names = given_names.clone();
        }
        if let Some(surname) = overrides.surnames.get(&row.surname) {
            row.surname = surname.clone();
        }

        let after = row.full_name();
        if after != before {
            rewritten += 1;
            changes.insert((before, after));
        }
    }

    for (before, after) in changes {
        log.record(pass::APPLY_OVERRIDES, before, after);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::apply_overrides;
    use crate::audit::ChangeLog;
    use crate::lexicon::NameOverrides;
    use crate::model::observation::Observation;

    #[test]
    fn overrides_apply_in_order_and_are_logged_once_per_name() {
        let mut overrides = NameOverrides::default();
        overrides
            .fullnames
            .insert("POPSECU | IOM".to_string(), "POPESCU | ION".to_string());
        overrides
            .given_names
            .insert("MRIA".to_string(), "MARIA".to_string());
        overrides
            .surnames
            .insert("IONSCU".to_string(), "IONESCU".to_string());

        let mut rows = vec![
            Observation::new("POPSECU", "IOM", "A", 2010, None),
            Observation::new("POPSECU", "IOM", "A", 2011, None),
            Observation::new("IONSCU", "MRIA", "A", 2010, None),
            Observation::new("STAN", "DAN", "A", 2010, None),
        ];
        let mut log = ChangeLog::new();
        assert_eq!(apply_overrides(&mut rows, &overrides, &mut log), 3);
        assert_eq!(rows[0].full_name(), "POPESCU | ION");
        assert_eq!(rows[2].full_name(), "IONESCU | MARIA");
        assert_eq!(log.len(), 2);
    }
}
