//! Temporal double-booking resolution.
//!
//! After name cleaning, one person ID may be booked in several units in the
//! same bucket. Short overlaps around a move are transition artifacts and
//! are trimmed. An overlap spanning the whole career means two people share
//! the name; their rows are split into two IDs along the unit hierarchy.
//! Anything else goes to the [`ReviewResolver`] and, if it declines, to the
//! review queue with the rows untouched.
//!
//! # Invariants
//! - After this pass every (person, bucket) holds at most one unit, except
//!   for rows referenced by a queued review item.
//! - New IDs are allocated above the current maximum in person-ID order.

use super::person_id::max_person_id;
use super::resolver::{OverlapCase, OverlapResolution, ReviewResolver};
use super::{pass, ResolveError, ResolveResult};
use crate::audit::{ChangeLog, ReviewItem, ReviewKind, ReviewQueue};
use crate::lexicon::UnitDirectory;
use crate::model::observation::{Granularity, Observation, PersonId, TimeBucket};
use crate::model::unit::HierarchyDepth;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Bucket size for careers and the longest overlap, in those buckets,
/// still treated as a transition artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapPolicy {
    /// At year granularity a row's month is ignored.
    pub granularity: Granularity,
    pub max_transition_buckets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapReport {
    pub removed_rows: usize,
    /// Original ID → IDs its rows were split into.
    pub splits: Vec<(PersonId, Vec<PersonId>)>,
    /// IDs with at least one overlap left for review.
    pub flagged: BTreeSet<PersonId>,
}

type Sequence = Vec<(TimeBucket, Vec<String>)>;

#[derive(Debug, Default)]
struct Decisions {
    removals: HashSet<(PersonId, TimeBucket, String)>,
    reassign: HashMap<(PersonId, String), PersonId>,
}

/// Trims transition overlaps and splits fused careers in place.
pub fn resolve_overlaps(
    rows: &mut Vec<Observation>,
    directory: &UnitDirectory,
    policy: OverlapPolicy,
    resolver: &dyn ReviewResolver,
    log: &mut ChangeLog,
    review: &mut ReviewQueue,
) -> ResolveResult<OverlapReport> {
    let next_id = max_person_id(rows) + 1;
    let (decisions, mut report) = {
        let mut careers = CareerPass {
            rows: rows.as_slice(),
            directory,
            policy,
            resolver,
            log,
            review,
            next_id,
            decisions: Decisions::default(),
            report: OverlapReport::default(),
        };
        careers.run()?;
        (careers.decisions, careers.report)
    };

    let before = rows.len();
    rows.retain(|row| match row.person_id {
        Some(id) => !decisions.removals.contains(&(
            id,
            row.bucket_at(policy.granularity),
            row.unit.clone(),
        )),
        None => true,
    });
    report.removed_rows = before - rows.len();

    for row in rows.iter_mut() {
        let Some(id) = row.person_id else {
            continue;
        };
        if let Some(new_id) = decisions.reassign.get(&(id, row.unit.clone())) {
            row.person_id = Some(*new_id);
        }
    }

    info!(
        "event=overlaps_resolved module=resolve removed_rows={} splits={} flagged={}",
        report.removed_rows,
        report.splits.len(),
        report.flagged.len()
    );
    Ok(report)
}

/// Maximal index runs of consecutive buckets holding more than one unit.
fn overlap_runs(sequence: &Sequence) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;
    for (idx, (_, units)) in sequence.iter().enumerate() {
        match (units.len() > 1, open) {
            (true, None) => open = Some(idx),
            (false, Some(start)) => {
                runs.push((start, idx - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push((start, sequence.len() - 1));
    }
    runs
}

/// `true` when no bucket holds two units of `group`.
fn overlap_free(sequence: &Sequence, group: &BTreeSet<&str>) -> bool {
    sequence.iter().all(|(_, units)| {
        units
            .iter()
            .filter(|unit| group.contains(unit.as_str()))
            .count()
            <= 1
    })
}

/// Units to keep in one bucket of an interior run.
///
/// A one-bucket run first drops units matching neither neighbour, as long
/// as something is left. Then the unit being left is dropped in favour of
/// the destination; a return to the same unit keeps only that unit.
fn interior_keep<'u>(
    units: &BTreeSet<&'u str>,
    before: &str,
    after: &str,
    single_bucket: bool,
) -> BTreeSet<&'u str> {
    let mut keep = units.clone();
    if single_bucket {
        let strays = keep
            .iter()
            .copied()
            .filter(|unit| *unit != before && *unit != after)
            .collect::<Vec<_>>();
        if !strays.is_empty() && strays.len() < keep.len() {
            for stray in strays {
                keep.remove(stray);
            }
        }
    }

    if keep.len() > 1 {
        if before == after {
            if keep.contains(before) {
                keep.retain(|unit| *unit == before);
            }
        } else if keep.contains(after) {
            keep.remove(before);
        }
    }
    keep
}

/// Keeps only `anchor` when the bucket contains it.
fn boundary_keep<'u>(units: &BTreeSet<&'u str>, anchor: &str) -> BTreeSet<&'u str> {
    let mut keep = units.clone();
    if keep.contains(anchor) {
        keep.retain(|unit| *unit == anchor);
    }
    keep
}

struct CareerPass<'a> {
    rows: &'a [Observation],
    directory: &'a UnitDirectory,
    policy: OverlapPolicy,
    resolver: &'a dyn ReviewResolver,
    log: &'a mut ChangeLog,
    review: &'a mut ReviewQueue,
    next_id: PersonId,
    decisions: Decisions,
    report: OverlapReport,
}

impl CareerPass<'_> {
    fn run(&mut self) -> ResolveResult<()> {
        let mut careers = BTreeMap::<PersonId, BTreeMap<TimeBucket, BTreeSet<String>>>::new();
        for row in self.rows {
            if let Some(id) = row.person_id {
                careers
                    .entry(id)
                    .or_default()
                    .entry(row.bucket_at(self.policy.granularity))
                    .or_default()
                    .insert(row.unit.clone());
            }
        }

        for (id, career) in careers {
            let sequence = career
                .into_iter()
                .map(|(bucket, units)| (bucket, units.into_iter().collect::<Vec<_>>()))
                .collect::<Sequence>();
            let runs = overlap_runs(&sequence);
            if runs.is_empty() {
                continue;
            }

            let last = sequence.len() - 1;
            if runs == [(0, last)] {
                self.split_career(id, &sequence)?;
                continue;
            }
            for run in runs {
                self.trim_transition(id, &sequence, run);
            }
        }
        Ok(())
    }

    fn trim_transition(&mut self, id: PersonId, sequence: &Sequence, (start, end): (usize, usize)) {
        let width = end - start + 1;
        if width > self.policy.max_transition_buckets {
            self.flag(ReviewKind::LongOverlap, id, sequence, (start, end));
            return;
        }

        let before = start
            .checked_sub(1)
            .map(|idx| sequence[idx].1[0].as_str());
        let after = sequence.get(end + 1).map(|(_, units)| units[0].as_str());

        let mut keeps = sequence[start..=end]
            .iter()
            .map(|(_, units)| {
                let units = units.iter().map(String::as_str).collect::<BTreeSet<_>>();
                match (before, after) {
                    (Some(before), Some(after)) => {
                        interior_keep(&units, before, after, width == 1)
                    }
                    (None, Some(after)) => boundary_keep(&units, after),
                    (Some(before), None) => boundary_keep(&units, before),
                    (None, None) => units,
                }
            })
            .collect::<Vec<_>>();

        if keeps.iter().any(|keep| keep.len() > 1) {
            let case = OverlapCase {
                person_id: id,
                kind: ReviewKind::ResidualOverlap,
                sequence: sequence.clone(),
                run: (start, end),
            };
            let chosen = match self.resolver.resolve_overlap(&case) {
                OverlapResolution::Keep(unit) => sequence[start..=end]
                    .iter()
                    .all(|(_, units)| units.contains(&unit))
                    .then_some(unit),
                OverlapResolution::Flag => None,
            };
            let Some(chosen) = chosen else {
                self.flag(ReviewKind::ResidualOverlap, id, sequence, (start, end));
                return;
            };
            for keep in &mut keeps {
                keep.retain(|unit| *unit == chosen);
            }
        }

        for ((bucket, units), keep) in sequence[start..=end].iter().zip(&keeps) {
            for unit in units.iter().filter(|unit| !keep.contains(unit.as_str())) {
                self.log.record(
                    pass::REMOVE_TRANSITION_OVERLAP,
                    format!("{id} | {bucket} | {unit}"),
                    "removed",
                );
                self.decisions
                    .removals
                    .insert((id, *bucket, unit.clone()));
            }
        }
    }

    fn split_career(&mut self, id: PersonId, sequence: &Sequence) -> ResolveResult<()> {
        let units = sequence
            .iter()
            .flat_map(|(_, units)| units.iter().map(String::as_str))
            .collect::<BTreeSet<_>>();

        if let Some((depth, groups)) = self.split_by_hierarchy(sequence, &units) {
            debug!(
                "event=career_split module=resolve person_id={id} depth={}",
                depth.as_str()
            );
            return self.apply_split(id, &units, groups, false);
        }

        let case = OverlapCase {
            person_id: id,
            kind: ReviewKind::AmbiguousSplit,
            sequence: sequence.clone(),
            run: (0, sequence.len() - 1),
        };
        if let OverlapResolution::Keep(unit) = self.resolver.resolve_overlap(&case) {
            if units.contains(unit.as_str()) {
                let kept = BTreeSet::from([unit.as_str()]);
                let rest = units
                    .iter()
                    .copied()
                    .filter(|other| *other != unit)
                    .collect::<BTreeSet<_>>();
                if overlap_free(sequence, &rest) {
                    return self.apply_split(id, &units, vec![kept, rest], true);
                }
            }
        }

        self.flag(
            ReviewKind::AmbiguousSplit,
            id,
            sequence,
            (0, sequence.len() - 1),
        );
        Ok(())
    }

    /// First hierarchy depth that bins the units into exactly two
    /// overlap-free groups.
    fn split_by_hierarchy<'u>(
        &self,
        sequence: &Sequence,
        units: &BTreeSet<&'u str>,
    ) -> Option<(HierarchyDepth, Vec<BTreeSet<&'u str>>)> {
        let codes = units
            .iter()
            .map(|unit| self.directory.resolve(unit).map(|code| (*unit, code)))
            .collect::<Option<Vec<_>>>()?;

        HierarchyDepth::ALL.into_iter().find_map(|depth| {
            let mut bins = BTreeMap::<String, BTreeSet<&'u str>>::new();
            for (unit, code) in &codes {
                bins.entry(code.prefix(depth)).or_default().insert(*unit);
            }
            let groups = bins.into_values().collect::<Vec<_>>();
            (groups.len() == 2 && groups.iter().all(|group| overlap_free(sequence, group)))
                .then_some((depth, groups))
        })
    }

    /// Reassigns each group's units to a fresh ID. With `keep_first`, the
    /// first group stays on `id`.
    fn apply_split(
        &mut self,
        id: PersonId,
        units: &BTreeSet<&str>,
        groups: Vec<BTreeSet<&str>>,
        keep_first: bool,
    ) -> ResolveResult<()> {
        let covered = groups.iter().map(BTreeSet::len).sum::<usize>();
        let union = groups.iter().flatten().copied().collect::<BTreeSet<_>>();
        if covered != union.len() || &union != units {
            return Err(ResolveError::SplitNotDisjoint { person_id: id });
        }

        let mut new_ids = Vec::with_capacity(groups.len());
        for (idx, group) in groups.iter().enumerate() {
            if keep_first && idx == 0 {
                new_ids.push(id);
                continue;
            }
            let new_id = self.next_id;
            self.next_id += 1;
            new_ids.push(new_id);
            for unit in group {
                self.log.record(
                    pass::SPLIT_OVERLAPPING_CAREERS,
                    format!("{id} | {unit}"),
                    new_id.to_string(),
                );
                self.decisions
                    .reassign
                    .insert((id, (*unit).to_string()), new_id);
            }
        }

        info!(
            "event=career_split module=resolve person_id={id} new_ids={new_ids:?}"
        );
        self.report.splits.push((id, new_ids));
        Ok(())
    }

    fn flag(&mut self, kind: ReviewKind, id: PersonId, sequence: &Sequence, (start, end): (usize, usize)) {
        let (first, last) = (sequence[start].0, sequence[end].0);
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.person_id == Some(id)
                    && (first..=last).contains(&row.bucket_at(self.policy.granularity))
            })
            .cloned()
            .collect::<Vec<_>>();
        debug!(
            "event=overlap_flagged module=resolve person_id={id} kind={} from={first} to={last}",
            kind.as_str()
        );
        self.review.push(
            ReviewItem::new(kind, format!("{first}..{last}"))
                .for_person(id)
                .with_rows(rows),
        );
        self.report.flagged.insert(id);
    }
}
