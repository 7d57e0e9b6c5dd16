//! Merging of long names that share most of their components.

use super::pass;
use super::translate::TranslationMap;
use crate::audit::ChangeLog;
use crate::model::observation::Observation;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Maps a name to the other name when they share at least `min_shared`
/// tokens (surname and given names pooled) and differ in token-set size;
/// the smaller set maps to the larger one.
///
/// Returns the number of rewritten rows.
pub fn merge_shared_components(
    rows: &mut [Observation],
    min_shared: usize,
    log: &mut ChangeLog,
) -> usize {
    let mut bags = BTreeMap::<String, BTreeSet<String>>::new();
    for row in rows.iter() {
        let name = row.full_name();
        if bags.contains_key(&name) {
            continue;
        }
        let tokens = row
            .surname
            .split_whitespace()
            .chain(row.given_names.split_whitespace())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        if tokens.len() >= min_shared {
            bags.insert(name, tokens);
        }
    }

    let names = bags.keys().cloned().collect::<Vec<_>>();
    let mut postings = BTreeMap::<&str, Vec<usize>>::new();
    for (idx, name) in names.iter().enumerate() {
        for token in &bags[name] {
            postings.entry(token.as_str()).or_default().push(idx);
        }
    }

    let mut translations = TranslationMap::new();
    for (idx, name) in names.iter().enumerate() {
        let mut shared = BTreeMap::<usize, usize>::new();
        for token in &bags[name] {
            for &other in &postings[token.as_str()] {
                if other > idx {
                    *shared.entry(other).or_default() += 1;
                }
            }
        }

        let size = bags[name].len();
        for (other, count) in shared {
            if count < min_shared {
                continue;
            }
            let other_name = &names[other];
            let other_size = bags[other_name].len();
            if size < other_size {
                translations.insert(name, other_name);
            } else if other_size < size {
                translations.insert(other_name, name);
            }
        }
    }

    let rewritten = translations.apply(rows, pass::MERGE_SHARED_COMPONENTS, log);
    debug!(
        "event=shared_components module=resolve candidates={} mappings={} rewritten={rewritten}",
        names.len(),
        translations.len()
    );
    rewritten
}
