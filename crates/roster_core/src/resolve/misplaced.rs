//! Surname tokens recorded inside the given-names field.
//!
//! Each given-name token is looked up in the [`NameLexicon`]. One contiguous
//! run of surname tokens is moved into the surname field when it sits at
//! either edge of the given names or is parenthesized (a maiden name). A run
//! in the middle marks two people fused into one row; the row is split and
//! the copy inherits unit and time.

use super::pass;
use crate::audit::{ChangeLog, ReviewQueue};
use crate::lexicon::{strip_parentheses, NameCategory, NameLexicon};
use crate::model::observation::Observation;
use log::{debug, warn};

/// Where the surname run sat inside the given names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Prefix,
    Suffix,
    Parenthesized,
    Embedded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MisplacementOutcome {
    pub rows: Vec<Observation>,
    /// Rows whose surname run was moved into the surname field.
    pub moved: usize,
    /// Rows split into two people. `rows.len()` grew by exactly this much.
    pub splits: usize,
    /// Rows left unchanged because their surname tokens were not one run.
    pub ambiguous: usize,
}

/// Moves misplaced surname tokens and strips parentheses from surnames.
///
/// Unknown tokens are treated as `dk` given names and flagged once per run.
pub fn move_misplaced_surnames(
    rows: Vec<Observation>,
    lexicon: &NameLexicon,
    log: &mut ChangeLog,
    review: &mut ReviewQueue,
) -> MisplacementOutcome {
    let mut outcome = MisplacementOutcome {
        rows: Vec::with_capacity(rows.len()),
        ..MisplacementOutcome::default()
    };

    for mut row in rows {
        let before = row.full_name();
        row.surname = clean_surname(&row.surname);

        let tokens = row.given_names.split_whitespace().collect::<Vec<_>>();
        let flagged = surname_positions(&tokens, lexicon, review);

        let Some((start, end)) = contiguous_run(&flagged) else {
            if !flagged.is_empty() {
                outcome.ambiguous += 1;
                review.flag_ambiguous_surname(&row.full_name(), &row);
            }
            if row.full_name() != before {
                log.record(pass::MOVE_SURNAME, before.as_str(), row.full_name());
            }
            outcome.rows.push(row);
            continue;
        };

        if end - start + 1 == tokens.len() {
            // Nothing would be left as a given name.
            outcome.ambiguous += 1;
            review.flag_ambiguous_surname(&row.full_name(), &row);
            if row.full_name() != before {
                log.record(pass::MOVE_SURNAME, before.as_str(), row.full_name());
            }
            outcome.rows.push(row);
            continue;
        }

        let run = tokens[start..=end]
            .iter()
            .map(|token| strip_parentheses(token))
            .collect::<Vec<_>>()
            .join(" ");
        let leading = tokens[..start].join(" ");
        let trailing = tokens[end + 1..].join(" ");

        match placement(&tokens, start, end) {
            Placement::Embedded => {
                let fused = row.with_name(run, trailing);
                row.given_names = leading;
                log.record(pass::MOVE_SURNAME, before.as_str(), row.full_name());
                log.record(pass::MOVE_SURNAME, before.as_str(), fused.full_name());
                outcome.rows.push(row);
                outcome.rows.push(fused);
                outcome.splits += 1;
            }
            found => {
                debug!(
                    "event=surname_moved module=resolve pass={} placement={found:?}",
                    pass::MOVE_SURNAME
                );
                row.surname = join_nonempty(&row.surname, &run);
                row.given_names = join_nonempty(&leading, &trailing);
                log.record(pass::MOVE_SURNAME, before.as_str(), row.full_name());
                outcome.rows.push(row);
                outcome.moved += 1;
            }
        }
    }

    outcome
}

fn surname_positions(tokens: &[&str], lexicon: &NameLexicon, review: &mut ReviewQueue) -> Vec<usize> {
    let mut positions = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        match lexicon.category(token) {
            Some(NameCategory::Surname) => positions.push(idx),
            Some(_) => {}
            None => {
                let bare = strip_parentheses(token);
                if review.flag_unknown_token(bare) {
                    warn!(
                        "event=unknown_token module=resolve pass={} status=deferred",
                        pass::MOVE_SURNAME
                    );
                    debug!("event=unknown_token module=resolve token={bare}");
                }
            }
        }
    }
    positions
}

/// `Some((first, last))` when `positions` is one non-empty contiguous run.
fn contiguous_run(positions: &[usize]) -> Option<(usize, usize)> {
    let (&first, &last) = (positions.first()?, positions.last()?);
    (last - first + 1 == positions.len()).then_some((first, last))
}

fn placement(tokens: &[&str], start: usize, end: usize) -> Placement {
    if start == 0 {
        Placement::Prefix
    } else if end + 1 == tokens.len() {
        Placement::Suffix
    } else if tokens[start].starts_with('(') && tokens[end].ends_with(')') {
        Placement::Parenthesized
    } else {
        Placement::Embedded
    }
}

fn clean_surname(surname: &str) -> String {
    surname
        .split_whitespace()
        .map(strip_parentheses)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left} {right}"),
    }
}

#[cfg(test)]
mod tests {
    use super::move_misplaced_surnames;
    use crate::audit::{ChangeLog, ReviewKind, ReviewQueue};
    use crate::lexicon::{NameCategory, NameLexicon};
    use crate::model::observation::Observation;

    fn lexicon() -> NameLexicon {
        NameLexicon::from_entries([
            ("ANA", NameCategory::F),
            ("MARIA", NameCategory::F),
            ("ION", NameCategory::M),
            ("DUMBRAVĂ", NameCategory::Surname),
            ("POPESCU", NameCategory::Surname),
            ("STAN", NameCategory::Surname),
        ])
    }

    fn run(rows: Vec<Observation>) -> (super::MisplacementOutcome, ChangeLog, ReviewQueue) {
        let mut log = ChangeLog::new();
        let mut review = ReviewQueue::new();
        let outcome = move_misplaced_surnames(rows, &lexicon(), &mut log, &mut review);
        (outcome, log, review)
    }

    #[test]
    fn prefix_and_suffix_runs_move_into_surname() {
        let (outcome, log, _) = run(vec![
            Observation::new("IONESCU", "POPESCU ANA", "A", 2010, None),
            Observation::new("IONESCU", "ANA POPESCU", "A", 2011, None),
        ]);
        assert_eq!(outcome.moved, 2);
        assert!(outcome
            .rows
            .iter()
            .all(|row| row.full_name() == "IONESCU POPESCU | ANA"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn parenthesized_maiden_name_is_unwrapped() {
        let (outcome, _, _) = run(vec![Observation::new(
            "IONESCU",
            "ANA (DUMBRAVĂ) MARIA",
            "A",
            2010,
            None,
        )]);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].surname, "IONESCU DUMBRAVĂ");
        assert_eq!(outcome.rows[0].given_names, "ANA MARIA");
    }

    #[test]
    fn embedded_run_splits_into_two_people() {
        let (outcome, log, _) = run(vec![Observation::new(
            "IONESCU", "ANA STAN ION", "J1", 2012, Some(6),
        )]);
        assert_eq!(outcome.splits, 1);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].full_name(), "IONESCU | ANA");
        assert_eq!(outcome.rows[1].full_name(), "STAN | ION");
        assert_eq!(outcome.rows[1].unit, "J1");
        assert_eq!(outcome.rows[1].month, Some(6));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn scattered_surname_tokens_are_flagged_not_moved() {
        let (outcome, _, review) = run(vec![Observation::new(
            "IONESCU",
            "STAN ANA POPESCU",
            "A",
            2010,
            None,
        )]);
        assert_eq!(outcome.ambiguous, 1);
        assert_eq!(outcome.rows[0].given_names, "STAN ANA POPESCU");
        assert_eq!(review.of_kind(ReviewKind::AmbiguousSurnameTokens).count(), 1);
    }

    #[test]
    fn unknown_tokens_are_flagged_once_and_surname_parentheses_stripped() {
        let (outcome, log, review) = run(vec![
            Observation::new("(POP)", "ZORELIA", "A", 2010, None),
            Observation::new("POP", "ZORELIA", "A", 2011, None),
        ]);
        assert_eq!(outcome.rows[0].surname, "POP");
        assert_eq!(review.unknown_tokens().collect::<Vec<_>>(), vec!["ZORELIA"]);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].after, "POP | ZORELIA");
    }
}
