use roster_core::audit::{ChangeLog, ReviewKind, ReviewQueue};
use roster_core::lexicon::UnitDirectory;
use roster_core::model::observation::{Granularity, Observation, PersonId, TimeBucket};
use roster_core::resolve::overlap::{resolve_overlaps, OverlapPolicy, OverlapReport};
use roster_core::resolve::pass;
use roster_core::{
    DeferredResolver, Engine, EngineConfig, NameLexicon, RecordedResolver, ReviewResolver,
};
use std::collections::{BTreeMap, BTreeSet};

const YEAR_POLICY: OverlapPolicy = OverlapPolicy {
    granularity: Granularity::Year,
    max_transition_buckets: 2,
};
const MONTH_POLICY: OverlapPolicy = OverlapPolicy {
    granularity: Granularity::Month,
    max_transition_buckets: 5,
};

fn booked(person_id: PersonId, unit: &str, year: i32, month: Option<u32>) -> Observation {
    let mut row = Observation::new("POPESCU", "ION", unit, year, month);
    row.person_id = Some(person_id);
    row
}

fn career(person_id: PersonId, buckets: &[(i32, &[&str])]) -> Vec<Observation> {
    buckets
        .iter()
        .flat_map(|(year, units)| {
            units
                .iter()
                .map(move |unit| booked(person_id, unit, *year, None))
        })
        .collect()
}

struct Run {
    rows: Vec<Observation>,
    report: OverlapReport,
    log: ChangeLog,
    review: ReviewQueue,
}

fn resolve_with(
    mut rows: Vec<Observation>,
    policy: OverlapPolicy,
    resolver: &dyn ReviewResolver,
) -> Run {
    let mut log = ChangeLog::new();
    let mut review = ReviewQueue::new();
    let report = resolve_overlaps(
        &mut rows,
        &UnitDirectory::new(),
        policy,
        resolver,
        &mut log,
        &mut review,
    )
    .unwrap();
    Run {
        rows,
        report,
        log,
        review,
    }
}

fn resolve(rows: Vec<Observation>, policy: OverlapPolicy) -> Run {
    resolve_with(rows, policy, &DeferredResolver)
}

fn units_of(rows: &[Observation], person_id: PersonId) -> BTreeMap<TimeBucket, Vec<&str>> {
    let mut units = BTreeMap::<TimeBucket, Vec<&str>>::new();
    for row in rows.iter().filter(|row| row.person_id == Some(person_id)) {
        units.entry(row.bucket()).or_default().push(row.unit.as_str());
    }
    units
}

/// Every (person, bucket) holds one unit unless the person was flagged.
fn assert_no_double_booking(run: &Run) {
    let flagged = run
        .review
        .items()
        .iter()
        .filter_map(|item| item.person_id)
        .collect::<BTreeSet<_>>();
    let mut seen = BTreeMap::<(PersonId, TimeBucket), BTreeSet<&str>>::new();
    for row in &run.rows {
        let id = row.person_id.unwrap();
        seen.entry((id, row.bucket()))
            .or_default()
            .insert(row.unit.as_str());
    }
    for ((id, bucket), units) in seen {
        assert!(
            units.len() <= 1 || flagged.contains(&id),
            "person {id} double-booked in {bucket}: {units:?}"
        );
    }
}

#[test]
fn interior_transition_keeps_the_destination_unit() {
    let run = resolve(
        career(7, &[(2012, &["A"]), (2013, &["A", "B"]), (2014, &["B"])]),
        YEAR_POLICY,
    );

    let units = units_of(&run.rows, 7);
    assert_eq!(units.values().cloned().collect::<Vec<_>>(), vec![
        vec!["A"],
        vec!["B"],
        vec!["B"],
    ]);
    assert_eq!(run.report.removed_rows, 1);
    let removal = run
        .log
        .entries_for(pass::REMOVE_TRANSITION_OVERLAP)
        .next()
        .unwrap();
    assert_eq!(removal.before, "7 | 2013 | A");
    assert_eq!(removal.after, "removed");
    assert!(run.review.is_empty());
}

#[test]
fn full_span_overlap_splits_by_branch_into_new_ids() {
    let mut directory = UnitDirectory::new();
    directory.insert("JUDECĂTORIA A", roster_core::UnitCode::new("CA1", "TB1", "J1"));
    directory.insert("JUDECĂTORIA B", roster_core::UnitCode::new("CA2", "TB5", "J7"));

    let mut rows = career(
        9,
        &[
            (2010, &["JUDECĂTORIA A", "JUDECĂTORIA B"]),
            (2011, &["JUDECĂTORIA A", "JUDECĂTORIA B"]),
            (2012, &["JUDECĂTORIA A", "JUDECĂTORIA B"]),
        ],
    );
    rows.push(booked(3, "JUDECĂTORIA A", 2010, None));
    let mut log = ChangeLog::new();
    let mut review = ReviewQueue::new();

    let report = resolve_overlaps(
        &mut rows,
        &directory,
        YEAR_POLICY,
        &DeferredResolver,
        &mut log,
        &mut review,
    )
    .unwrap();

    assert_eq!(report.splits, vec![(9, vec![10, 11])]);
    let units_of_id = |id: PersonId| {
        rows.iter()
            .filter(|row| row.person_id == Some(id))
            .map(|row| row.unit.as_str())
            .collect::<Vec<_>>()
    };
    assert_eq!(units_of_id(10), vec!["JUDECĂTORIA A"; 3]);
    assert_eq!(units_of_id(11), vec!["JUDECĂTORIA B"; 3]);
    assert!(rows.iter().all(|row| row.person_id != Some(9)));
    assert_eq!(rows.iter().filter(|row| row.person_id == Some(3)).count(), 1);
    assert_eq!(log.entries_for(pass::SPLIT_OVERLAPPING_CAREERS).count(), 2);
    assert!(review.is_empty());
}

#[test]
fn split_falls_back_to_finer_hierarchy_levels() {
    let mut directory = UnitDirectory::new();
    directory.insert("TRIB X", roster_core::UnitCode::new("CA1", "TB1", "-88"));
    directory.insert("TRIB Y", roster_core::UnitCode::new("CA1", "TB2", "-88"));

    let mut rows = career(1, &[(2010, &["TRIB X", "TRIB Y"]), (2011, &["TRIB X", "TRIB Y"])]);
    let mut log = ChangeLog::new();
    let mut review = ReviewQueue::new();
    let report = resolve_overlaps(
        &mut rows,
        &directory,
        YEAR_POLICY,
        &DeferredResolver,
        &mut log,
        &mut review,
    )
    .unwrap();

    assert_eq!(report.splits, vec![(1, vec![2, 3])]);
}

#[test]
fn start_of_sequence_keeps_the_continuing_unit() {
    let run = resolve(
        career(2, &[(2010, &["A", "B"]), (2011, &["B"]), (2012, &["B"])]),
        YEAR_POLICY,
    );
    assert_eq!(units_of(&run.rows, 2)[&TimeBucket { year: 2010, month: None }], vec!["B"]);
    assert_eq!(run.report.removed_rows, 1);
}

#[test]
fn end_of_sequence_keeps_the_previous_unit() {
    let run = resolve(
        career(2, &[(2010, &["A"]), (2011, &["A"]), (2012, &["A", "B"])]),
        YEAR_POLICY,
    );
    assert_eq!(units_of(&run.rows, 2)[&TimeBucket { year: 2012, month: None }], vec!["A"]);
}

#[test]
fn returning_to_the_same_unit_drops_the_blip() {
    let run = resolve(
        career(4, &[(2010, &["A"]), (2011, &["A", "B"]), (2012, &["A"])]),
        YEAR_POLICY,
    );
    assert!(run.rows.iter().all(|row| row.unit == "A"));
}

#[test]
fn single_month_typo_is_removed_with_the_departure_unit() {
    let rows = vec![
        booked(5, "CA8.TB28.J103", 2010, Some(4)),
        booked(5, "CA8.TB28.-88", 2010, Some(5)),
        booked(5, "CA6.TB20.-88", 2010, Some(5)),
        booked(5, "CA8.TB28.J103", 2010, Some(5)),
        booked(5, "CA8.TB28.-88", 2010, Some(6)),
    ];
    let run = resolve(rows, MONTH_POLICY);

    let may = TimeBucket {
        year: 2010,
        month: Some(5),
    };
    assert_eq!(units_of(&run.rows, 5)[&may], vec!["CA8.TB28.-88"]);
    assert_eq!(run.report.removed_rows, 2);
    assert_no_double_booking(&run);
}

#[test]
fn long_overlaps_are_left_untouched_and_flagged() {
    let rows = career(
        6,
        &[
            (2010, &["A"]),
            (2011, &["A", "B"]),
            (2012, &["A", "B"]),
            (2013, &["A", "B"]),
            (2014, &["B"]),
        ],
    );
    let input_len = rows.len();
    let run = resolve(rows, YEAR_POLICY);

    assert_eq!(run.rows.len(), input_len);
    let flagged = run.review.of_kind(ReviewKind::LongOverlap).collect::<Vec<_>>();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].person_id, Some(6));
    assert_eq!(flagged[0].rows.len(), 6);
    assert!(run.report.flagged.contains(&6));
}

#[test]
fn unsplittable_full_span_overlap_is_flagged_not_guessed() {
    let rows = career(8, &[(2010, &["X", "Y"]), (2011, &["X", "Y"])]);
    let run = resolve(rows.clone(), YEAR_POLICY);

    assert_eq!(run.rows, rows);
    assert_eq!(run.review.of_kind(ReviewKind::AmbiguousSplit).count(), 1);
    assert_no_double_booking(&run);
}

#[test]
fn residual_overlap_goes_to_review_unless_the_resolver_decides() {
    let rows = career(
        12,
        &[(2010, &["A"]), (2011, &["B", "C"]), (2012, &["D"])],
    );

    let deferred = resolve(rows.clone(), YEAR_POLICY);
    assert_eq!(deferred.rows, rows);
    assert_eq!(deferred.review.of_kind(ReviewKind::ResidualOverlap).count(), 1);

    let resolver = RecordedResolver::new().with_kept_unit(12, "C");
    let decided = resolve_with(rows, YEAR_POLICY, &resolver);
    assert!(decided.review.is_empty());
    assert_eq!(
        units_of(&decided.rows, 12)[&TimeBucket { year: 2011, month: None }],
        vec!["C"]
    );
    assert_no_double_booking(&decided);
}

#[test]
fn resolver_can_settle_an_ambiguous_split() {
    let rows = career(8, &[(2010, &["X", "Y"]), (2011, &["X", "Y"])]);
    let resolver = RecordedResolver::new().with_kept_unit(8, "X");
    let run = resolve_with(rows, YEAR_POLICY, &resolver);

    assert!(run.review.is_empty());
    assert!(run
        .rows
        .iter()
        .all(|row| (row.unit == "X") == (row.person_id == Some(8))));
    assert!(run
        .rows
        .iter()
        .filter(|row| row.unit == "Y")
        .all(|row| row.person_id == Some(9)));
    assert_eq!(run.report.splits, vec![(8, vec![8, 9])]);
}

#[test]
fn clean_careers_pass_through() {
    let rows = career(1, &[(2010, &["A"]), (2011, &["B"]), (2012, &["C"])]);
    let run = resolve(rows.clone(), YEAR_POLICY);
    assert_eq!(run.rows, rows);
    assert!(run.log.is_empty());
    assert_eq!(run.report, OverlapReport::default());
}

/// Units per (person, year), ignoring months.
fn units_per_year(rows: &[Observation]) -> BTreeMap<(PersonId, i32), BTreeSet<&str>> {
    let mut units = BTreeMap::<(PersonId, i32), BTreeSet<&str>>::new();
    for row in rows {
        units
            .entry((row.person_id.unwrap(), row.year))
            .or_default()
            .insert(row.unit.as_str());
    }
    units
}

#[test]
fn year_policy_ignores_months_when_building_careers() {
    let rows = vec![
        booked(1, "CA1.TB1.J1", 2012, None),
        booked(1, "CA1.TB1.J1", 2013, None),
        booked(1, "CA1.TB1.J2", 2013, Some(6)),
        booked(1, "CA1.TB1.J2", 2014, Some(6)),
    ];
    let run = resolve(rows, YEAR_POLICY);

    let years = units_per_year(&run.rows);
    assert_eq!(years[&(1, 2013)], BTreeSet::from(["CA1.TB1.J2"]));
    assert!(years.values().all(|units| units.len() == 1));
    assert_eq!(run.report.removed_rows, 1);
}

#[test]
fn mixed_month_roster_resolves_at_year_granularity() {
    let rows = vec![
        Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2012, None),
        Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2013, None),
        Observation::new("POPESCU", "ION", "CA1.TB1.J2", 2013, Some(6)),
        Observation::new("POPESCU", "ION", "CA1.TB1.J2", 2014, Some(6)),
    ];
    let engine = Engine::new(NameLexicon::new(), UnitDirectory::new(), EngineConfig::default());
    let resolution = engine.run(rows).unwrap();

    assert_eq!(resolution.granularity, Granularity::Year);
    assert!(units_per_year(&resolution.rows)
        .values()
        .all(|units| units.len() == 1));
}

#[test]
fn forced_year_granularity_applies_to_monthly_rows() {
    let rows = vec![
        Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2012, Some(3)),
        Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2013, Some(2)),
        Observation::new("POPESCU", "ION", "CA1.TB1.J2", 2013, Some(6)),
        Observation::new("POPESCU", "ION", "CA1.TB1.J2", 2014, Some(6)),
    ];
    let config = EngineConfig {
        granularity: Some(Granularity::Year),
        ..EngineConfig::default()
    };
    let engine = Engine::new(NameLexicon::new(), UnitDirectory::new(), config);
    let resolution = engine.run(rows).unwrap();

    assert_eq!(resolution.granularity, Granularity::Year);
    let years = units_per_year(&resolution.rows);
    assert_eq!(years[&(1, 2013)], BTreeSet::from(["CA1.TB1.J2"]));
    assert!(years.values().all(|units| units.len() == 1));
}
