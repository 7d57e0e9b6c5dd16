//! Edit-distance merging of long full names.
//!
//! Long names are rarely shared by two real people, so a small edit
//! distance between them is almost always an OCR or diacritic slip.

use super::fuzzy::pairs_within_distance;
use super::pass;
use super::translate::TranslationMap;
use crate::audit::ChangeLog;
use crate::config::EngineConfig;
use crate::model::observation::{split_full_name, token_count, Observation};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

static DIACRITIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[ŞŢĂÂÎȘȚ]").expect("valid diacritic regex"));

/// Eligibility and distance bounds for near-duplicate merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearDuplicateRules {
    pub max_distance: usize,
    pub min_components: usize,
    pub min_chars: usize,
    pub min_surname_chars: usize,
}

impl From<&EngineConfig> for NearDuplicateRules {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_distance: config.near_duplicate_max_distance,
            min_components: config.near_duplicate_min_components,
            min_chars: config.near_duplicate_min_chars,
            min_surname_chars: config.near_duplicate_min_surname_chars,
        }
    }
}

impl NearDuplicateRules {
    fn eligible(&self, row: &Observation) -> bool {
        let components = token_count(&row.surname) + token_count(&row.given_names);
        let chars = row.surname.chars().count() + row.given_names.chars().count();
        components >= self.min_components || chars >= self.min_chars
    }
}

/// Number of Romanian diacritic letters in `value`.
pub fn diacritic_count(value: &str) -> usize {
    DIACRITIC_RE.find_iter(value).count()
}

/// Merges eligible full names within the edit-distance bound.
///
/// Returns the number of rewritten rows.
pub fn merge_near_duplicates(
    rows: &mut [Observation],
    rules: &NearDuplicateRules,
    log: &mut ChangeLog,
) -> usize {
    let mut row_counts = BTreeMap::<String, usize>::new();
    for row in rows.iter().filter(|row| rules.eligible(row)) {
        *row_counts.entry(row.full_name()).or_default() += 1;
    }

    let pairs = pairs_within_distance(
        row_counts.keys().map(String::as_str),
        rules.max_distance,
    );

    let mut translations = TranslationMap::new();
    for (a, b) in &pairs {
        if !surnames_long_enough(a, b, rules.min_surname_chars) {
            continue;
        }
        let (loser, winner) = match pick_winner(a, b, &row_counts) {
            Ordering::Less | Ordering::Equal => (b, a),
            Ordering::Greater => (a, b),
        };
        translations.insert(loser, winner);
    }

    let rewritten = translations.apply(rows, pass::MERGE_NEAR_DUPLICATES, log);
    debug!(
        "event=near_duplicates module=resolve candidates={} pairs={} mappings={} rewritten={rewritten}",
        row_counts.len(),
        pairs.len(),
        translations.len()
    );
    rewritten
}

fn surnames_long_enough(a: &str, b: &str, min_chars: usize) -> bool {
    [a, b].iter().all(|name| {
        split_full_name(name)
            .map(|(surname, _)| surname.chars().count() >= min_chars)
            .unwrap_or(false)
    })
}

/// `Less` when `a` is the canonical form, `Greater` when `b` is.
///
/// More diacritics wins outright; otherwise more rows, then the longer
/// name, then the codepoint-smaller one.
fn pick_winner(a: &str, b: &str, row_counts: &BTreeMap<String, usize>) -> Ordering {
    let rows_of = |name: &str| row_counts.get(name).copied().unwrap_or(0);
    diacritic_count(b)
        .cmp(&diacritic_count(a))
        .then_with(|| rows_of(b).cmp(&rows_of(a)))
        .then_with(|| b.chars().count().cmp(&a.chars().count()))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::{diacritic_count, merge_near_duplicates, NearDuplicateRules};
    use crate::audit::ChangeLog;
    use crate::config::EngineConfig;
    use crate::model::observation::Observation;

    fn rules() -> NearDuplicateRules {
        NearDuplicateRules::from(&EngineConfig::default())
    }

    #[test]
    fn counts_both_cedilla_and_comma_forms() {
        assert_eq!(diacritic_count("ŞTEFĂNESCU ȘTEFAN"), 3);
        assert_eq!(diacritic_count("POPESCU"), 0);
    }

    #[test]
    fn diacritic_variant_wins_over_more_frequent_plain_variant() {
        let mut rows = vec![
            Observation::new("ŞERBAN", "ANA MARIA", "A", 2010, None),
            Observation::new("SERBAN", "ANA MARIA", "A", 2011, None),
            Observation::new("SERBAN", "ANA MARIA", "A", 2012, None),
        ];
        let mut log = ChangeLog::new();
        assert_eq!(merge_near_duplicates(&mut rows, &rules(), &mut log), 2);
        assert!(rows.iter().all(|row| row.surname == "ŞERBAN"));
        assert_eq!(log.entries()[0].after, "ŞERBAN | ANA MARIA");
    }

    #[test]
    fn more_rows_wins_when_diacritics_tie() {
        let mut rows = vec![
            Observation::new("POPESCU", "ANA MARIA", "A", 2010, None),
            Observation::new("POPESCU", "ANA MARIA", "A", 2011, None),
            Observation::new("POPESCUU", "ANA MARIA", "A", 2012, None),
        ];
        let mut log = ChangeLog::new();
        merge_near_duplicates(&mut rows, &rules(), &mut log);
        assert!(rows.iter().all(|row| row.surname == "POPESCU"));
    }

    #[test]
    fn short_names_and_short_surnames_are_left_alone() {
        let mut rows = vec![
            Observation::new("POP", "ANA", "A", 2010, None),
            Observation::new("POPA", "ANA", "A", 2011, None),
            Observation::new("BAN", "ANA MARIA", "A", 2010, None),
            Observation::new("BAN", "ANA MARIE", "A", 2011, None),
        ];
        let mut log = ChangeLog::new();
        assert_eq!(merge_near_duplicates(&mut rows, &rules(), &mut log), 0);
        assert!(log.is_empty());
    }
}
