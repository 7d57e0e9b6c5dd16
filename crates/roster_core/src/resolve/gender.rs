//! Gender labeling from given-name tokens.

use super::resolver::ReviewResolver;
use crate::audit::{ReviewItem, ReviewKind, ReviewQueue};
use crate::lexicon::{strip_parentheses, NameCategory, NameLexicon};
use crate::model::observation::{Gender, Observation};
use log::warn;
use std::collections::HashMap;

/// Labels every row and returns the number of unresolved contradictions.
///
/// Given names are classified once per distinct string:
/// - all tokens agree → that label;
/// - one clear label mixed with `dk` tokens → the clear label;
/// - no classifiable tokens → `dk`;
/// - female and male tokens together → the resolver decides, and a `dk`
///   answer leaves a [`ReviewKind::GenderContradiction`] item.
pub fn assign_genders(
    rows: &mut [Observation],
    lexicon: &NameLexicon,
    resolver: &dyn ReviewResolver,
    review: &mut ReviewQueue,
) -> usize {
    let mut memo = HashMap::<String, Gender>::new();
    let mut contradictions = 0;

    for row in rows.iter_mut() {
        if let Some(gender) = memo.get(&row.given_names) {
            row.gender = Some(*gender);
            continue;
        }

        let gender = match classify(&row.given_names, lexicon, review) {
            Classification::Clear(gender) => gender,
            Classification::Contradiction => {
                let tokens = row
                    .given_names
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                let decided = resolver.resolve_ambiguous_gender(&tokens);
                if decided == Gender::Dk {
                    contradictions += 1;
                    review.push(
                        ReviewItem::new(ReviewKind::GenderContradiction, row.given_names.as_str())
                            .with_rows(vec![row.clone()]),
                    );
                }
                decided
            }
        };

        memo.insert(row.given_names.clone(), gender);
        row.gender = Some(gender);
    }

    if contradictions > 0 {
        warn!("event=gender_contradictions module=resolve count={contradictions} status=deferred");
    }
    contradictions
}

enum Classification {
    Clear(Gender),
    Contradiction,
}

fn classify(given_names: &str, lexicon: &NameLexicon, review: &mut ReviewQueue) -> Classification {
    let (mut female, mut male) = (false, false);
    for token in given_names.split_whitespace() {
        match lexicon.category(token) {
            Some(NameCategory::F) => female = true,
            Some(NameCategory::M) => male = true,
            Some(NameCategory::Dk) | Some(NameCategory::Surname) => {}
            None => {
                review.flag_unknown_token(strip_parentheses(token));
            }
        }
    }

    match (female, male) {
        (true, true) => Classification::Contradiction,
        (true, false) => Classification::Clear(Gender::F),
        (false, true) => Classification::Clear(Gender::M),
        (false, false) => Classification::Clear(Gender::Dk),
    }
}

#[cfg(test)]
mod tests {
    use super::assign_genders;
    use crate::audit::{ReviewKind, ReviewQueue};
    use crate::lexicon::{NameCategory, NameLexicon};
    use crate::model::observation::{Gender, Observation};
    use crate::resolve::resolver::{DeferredResolver, RecordedResolver};

    fn lexicon() -> NameLexicon {
        NameLexicon::from_entries([
            ("ANA", NameCategory::F),
            ("MARIA", NameCategory::F),
            ("ION", NameCategory::M),
            ("ALEX", NameCategory::Dk),
        ])
    }

    fn row(given_names: &str) -> Observation {
        Observation::new("POP", given_names, "A", 2010, None)
    }

    #[test]
    fn clear_labels_win_over_neutral_tokens() {
        let mut rows = vec![row("ANA MARIA"), row("ION ALEX"), row("ALEX"), row("")];
        let mut review = ReviewQueue::new();
        assign_genders(&mut rows, &lexicon(), &DeferredResolver, &mut review);
        let genders = rows.iter().map(|row| row.gender).collect::<Vec<_>>();
        assert_eq!(
            genders,
            vec![
                Some(Gender::F),
                Some(Gender::M),
                Some(Gender::Dk),
                Some(Gender::Dk)
            ]
        );
        assert!(review.is_empty());
    }

    #[test]
    fn contradictions_are_flagged_once_per_distinct_given_names() {
        let mut rows = vec![row("MARIA ION"), row("MARIA ION")];
        let mut review = ReviewQueue::new();
        let unresolved = assign_genders(&mut rows, &lexicon(), &DeferredResolver, &mut review);
        assert_eq!(unresolved, 1);
        assert_eq!(review.of_kind(ReviewKind::GenderContradiction).count(), 1);
        assert!(rows.iter().all(|row| row.gender == Some(Gender::Dk)));
    }

    #[test]
    fn resolver_settles_contradictions() {
        let resolver = RecordedResolver::new().with_gender("MARIA ION", Gender::M);
        let mut rows = vec![row("MARIA ION")];
        let mut review = ReviewQueue::new();
        assert_eq!(assign_genders(&mut rows, &lexicon(), &resolver, &mut review), 0);
        assert_eq!(rows[0].gender, Some(Gender::M));
    }
}
