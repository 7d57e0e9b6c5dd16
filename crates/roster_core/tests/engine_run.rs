use roster_core::resolve::pass;
use roster_core::{
    Engine, EngineConfig, Gender, Granularity, NameCategory, NameLexicon, NameOverrides,
    Observation, RecordedResolver, ResolveError, ReviewKind, Termination, UnitCode, UnitDirectory,
};
use roster_core::model::observation::ObservationValidationError;

fn lexicon() -> NameLexicon {
    NameLexicon::from_entries([
        ("ANA", NameCategory::F),
        ("MARIA", NameCategory::F),
        ("ION", NameCategory::M),
        ("MIHAI", NameCategory::M),
    ])
}

fn directory() -> UnitDirectory {
    let mut directory = UnitDirectory::new();
    directory.insert("CURTEA DE APEL ALBA IULIA", UnitCode::new("CA1", "-88", "-88"));
    directory
}

fn overrides() -> NameOverrides {
    let mut overrides = NameOverrides::default();
    overrides
        .surnames
        .insert("POPESCUU".to_string(), "POPESCU".to_string());
    overrides
}

fn row(surname: &str, given_names: &str, unit: &str, year: i32) -> Observation {
    Observation::new(surname, given_names, unit, year, None)
}

fn roster() -> Vec<Observation> {
    vec![
        row("POPESCU", "ION MIHAI", "CA1.TB1.J1", 2010),
        row("POPESCU", "ION MIHAI", "CA1.TB1.J1", 2011),
        row("POPESCU", "MIHAI ION", "CA1.TB1.J1", 2012),
        row("POPESCUU", "ION MIHAI", "CA1.TB1.J1", 2013),
        row("IONESCU", "ANA", "CA1.TB1.-88", 2010),
        row("IONESCU", "ANA", "CA1.TB1.-88", 2011),
        row("VLAD", "MARIA ION", "CURTEA DE APEL ALBA IULIA", 2010),
        row("ZAMFIR", "XENIA", "TRIBUNALUL NICĂIERI", 2010),
        row("MUNTEANU", "ION", "CA1.TB1.J1", 2010),
        row("MUNTEANU", "ION", "CA2.TB2.J2", 2010),
        row("MUNTEANU", "ION", "CA1.TB1.J1", 2011),
        row("MUNTEANU", "ION", "CA2.TB2.J2", 2011),
    ]
}

fn engine() -> Engine {
    Engine::new(lexicon(), directory(), EngineConfig::default()).with_overrides(overrides())
}

#[test]
fn run_produces_a_panel_sorted_by_person_and_time() {
    let resolution = engine().run(roster()).unwrap();

    assert_eq!(resolution.granularity, Granularity::Year);
    assert_eq!(resolution.termination, Termination::Converged);
    assert_eq!(resolution.rows.len(), 12);
    assert!(resolution.rows.windows(2).all(|pair| {
        (pair[0].person_id, pair[0].bucket()) <= (pair[1].person_id, pair[1].bucket())
    }));

    let popescu = resolution
        .rows
        .iter()
        .filter(|row| row.surname == "POPESCU")
        .collect::<Vec<_>>();
    assert_eq!(popescu.len(), 4);
    assert!(popescu
        .iter()
        .all(|row| row.given_names == "ION MIHAI" && row.person_id == Some(3)));
}

#[test]
fn ids_are_assigned_in_name_order_and_fused_careers_are_split() {
    let resolution = engine().run(roster()).unwrap();

    let id_of = |surname: &str, unit: &str| {
        resolution
            .rows
            .iter()
            .find(|row| row.surname == surname && row.unit == unit)
            .and_then(|row| row.person_id)
    };
    assert_eq!(id_of("IONESCU", "CA1.TB1.-88"), Some(1));
    assert_eq!(id_of("VLAD", "CURTEA DE APEL ALBA IULIA"), Some(4));
    assert_eq!(id_of("ZAMFIR", "TRIBUNALUL NICĂIERI"), Some(5));
    assert_eq!(id_of("MUNTEANU", "CA1.TB1.J1"), Some(6));
    assert_eq!(id_of("MUNTEANU", "CA2.TB2.J2"), Some(7));
    assert!(resolution.rows.iter().all(|row| row.person_id != Some(2)));
    assert_eq!(resolution.person_count, 6);
    assert_eq!(resolution.overlaps.splits, vec![(2, vec![6, 7])]);
}

#[test]
fn genders_and_levels_are_annotated() {
    let resolution = engine().run(roster()).unwrap();
    let first = |surname: &str| {
        resolution
            .rows
            .iter()
            .find(|row| row.surname == surname)
            .unwrap()
    };

    assert_eq!(first("IONESCU").gender, Some(Gender::F));
    assert_eq!(first("POPESCU").gender, Some(Gender::M));
    assert_eq!(first("VLAD").gender, Some(Gender::Dk));
    assert_eq!(first("ZAMFIR").gender, Some(Gender::Dk));

    assert_eq!(first("POPESCU").level, Some(1));
    assert_eq!(first("IONESCU").level, Some(2));
    assert_eq!(first("VLAD").level, Some(3));
    assert_eq!(first("ZAMFIR").level, None);
}

#[test]
fn deferred_cases_land_in_the_review_queue() {
    let resolution = engine().run(roster()).unwrap();
    let review = &resolution.review;

    assert_eq!(review.unknown_tokens().collect::<Vec<_>>(), vec!["XENIA"]);
    assert_eq!(review.of_kind(ReviewKind::UnmappedUnit).count(), 1);
    let contradictions = review
        .of_kind(ReviewKind::GenderContradiction)
        .collect::<Vec<_>>();
    assert_eq!(contradictions.len(), 1);
    assert_eq!(contradictions[0].detail, "MARIA ION");
    assert_eq!(review.len(), 3);
}

#[test]
fn change_log_records_overrides_and_splits_under_the_run_id() {
    let resolution = engine().run(roster()).unwrap();
    let log = &resolution.change_log;

    let overridden = log.entries_for(pass::APPLY_OVERRIDES).collect::<Vec<_>>();
    assert_eq!(overridden.len(), 1);
    assert_eq!(overridden[0].before, "POPESCUU | ION MIHAI");
    assert_eq!(overridden[0].after, "POPESCU | ION MIHAI");
    assert_eq!(log.entries_for(pass::SPLIT_OVERLAPPING_CAREERS).count(), 2);
    assert!(!log.run_id().is_nil());
}

#[test]
fn recorded_decisions_settle_gender_contradictions() {
    let engine = engine().with_resolver(RecordedResolver::new().with_gender("MARIA ION", Gender::M));
    let resolution = engine.run(roster()).unwrap();

    let vlad = resolution
        .rows
        .iter()
        .find(|row| row.surname == "VLAD")
        .unwrap();
    assert_eq!(vlad.gender, Some(Gender::M));
    assert_eq!(
        resolution
            .review
            .of_kind(ReviewKind::GenderContradiction)
            .count(),
        0
    );
}

#[test]
fn invalid_rows_are_rejected_before_any_pass_runs() {
    let mut rows = roster();
    rows.push(Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2014, Some(13)));

    let err = engine().run(rows).unwrap_err();
    match err {
        ResolveError::InvalidObservation { index, source } => {
            assert_eq!(index, 12);
            assert_eq!(source, ObservationValidationError::MonthOutOfRange(13));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn month_rosters_use_month_buckets() {
    let rows = vec![
        Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2010, Some(1)),
        Observation::new("POPESCU", "ION", "CA1.TB1.J1", 2010, Some(2)),
    ];
    let resolution = engine().run(rows).unwrap();
    assert_eq!(resolution.granularity, Granularity::Month);
    assert_eq!(resolution.person_count, 1);
}
