//! Edit-distance pairing over a set of strings.
//!
//! Levenshtein distance is bounded below by the difference in character
//! counts, so strings are sorted by length and each one is only compared
//! with the following strings at most `max_distance` characters longer.

use std::collections::BTreeSet;

/// Returns every unordered pair whose Levenshtein distance is in
/// `(0, max_distance]`.
///
/// Duplicate inputs are collapsed. Each pair is `(smaller, larger)` in
/// codepoint order and the list is sorted.
pub fn pairs_within_distance<'a, I>(strings: I, max_distance: usize) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    if max_distance == 0 {
        return Vec::new();
    }

    let unique = strings.into_iter().collect::<BTreeSet<_>>();
    let mut by_length = unique
        .into_iter()
        .map(|value| (value.chars().count(), value))
        .collect::<Vec<_>>();
    by_length.sort_unstable();

    let mut pairs = Vec::new();
    for (idx, (len_a, a)) in by_length.iter().enumerate() {
        for (len_b, b) in &by_length[idx + 1..] {
            if len_b - len_a > max_distance {
                break;
            }
            let distance = strsim::levenshtein(a, b);
            if distance > 0 && distance <= max_distance {
                let pair = if a <= b {
                    (a.to_string(), b.to_string())
                } else {
                    (b.to_string(), a.to_string())
                };
                pairs.push(pair);
            }
        }
    }

    pairs.sort_unstable();
    pairs
}
