//! Deferred-review queue for ambiguous cases.

use crate::model::observation::{Observation, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;

/// Why an item needs manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    /// Name token missing from the lexicon; treated as `dk`.
    UnknownToken,
    /// Surname-flagged tokens in given names that do not form one run.
    AmbiguousSurnameTokens,
    /// Given names mixing female and male tokens, left unresolved.
    GenderContradiction,
    /// Unit absent from the directory and not a composite code.
    UnmappedUnit,
    /// Full-span overlap that no hierarchy level splits into two careers.
    AmbiguousSplit,
    /// Overlap longer than the transition bound, left untouched.
    LongOverlap,
    /// Overlap the transition policy could not reduce to one unit.
    ResidualOverlap,
}

impl ReviewKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownToken => "unknown_token",
            Self::AmbiguousSurnameTokens => "ambiguous_surname_tokens",
            Self::GenderContradiction => "gender_contradiction",
            Self::UnmappedUnit => "unmapped_unit",
            Self::AmbiguousSplit => "ambiguous_split",
            Self::LongOverlap => "long_overlap",
            Self::ResidualOverlap => "residual_overlap",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unknown_token" => Some(Self::UnknownToken),
            "ambiguous_surname_tokens" => Some(Self::AmbiguousSurnameTokens),
            "gender_contradiction" => Some(Self::GenderContradiction),
            "unmapped_unit" => Some(Self::UnmappedUnit),
            "ambiguous_split" => Some(Self::AmbiguousSplit),
            "long_overlap" => Some(Self::LongOverlap),
            "residual_overlap" => Some(Self::ResidualOverlap),
            _ => None,
        }
    }
}

/// One deferred case with the rows it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub kind: ReviewKind,
    pub person_id: Option<PersonId>,
    pub detail: String,
    pub rows: Vec<Observation>,
}

impl ReviewItem {
    pub fn new(kind: ReviewKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            person_id: None,
            detail: detail.into(),
            rows: Vec::new(),
        }
    }

    pub fn for_person(mut self, person_id: PersonId) -> Self {
        self.person_id = Some(person_id);
        self
    }

    pub fn with_rows(mut self, rows: Vec<Observation>) -> Self {
        self.rows = rows;
        self
    }
}

/// Review items collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQueue {
    items: Vec<ReviewItem>,
    unknown_tokens: BTreeSet<String>,
    unmapped_units: BTreeSet<String>,
    ambiguous_names: BTreeSet<String>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ReviewItem) {
        self.items.push(item);
    }

    /// Records an unknown lexicon token once per run.
    ///
    /// Returns `true` when the token was not seen before.
    pub fn flag_unknown_token(&mut self, token: &str) -> bool {
        if !self.unknown_tokens.insert(token.to_string()) {
            return false;
        }
        self.items
            .push(ReviewItem::new(ReviewKind::UnknownToken, token));
        true
    }

    /// Records an unmapped unit once per run.
    ///
    /// Returns `true` when the unit was not seen before.
    pub fn flag_unmapped_unit(&mut self, unit: &str) -> bool {
        if !self.unmapped_units.insert(unit.to_string()) {
            return false;
        }
        self.items
            .push(ReviewItem::new(ReviewKind::UnmappedUnit, unit));
        true
    }

    /// Records a row whose surname tokens could not be placed.
    ///
    /// Keeps one item per full name; a row already attached is not added
    /// again. Returns `true` when the name was not flagged before.
    pub fn flag_ambiguous_surname(&mut self, full_name: &str, row: &Observation) -> bool {
        if self.ambiguous_names.insert(full_name.to_string()) {
            self.items.push(
                ReviewItem::new(ReviewKind::AmbiguousSurnameTokens, full_name)
                    .with_rows(vec![row.clone()]),
            );
            return true;
        }
        if let Some(item) = self.items.iter_mut().find(|item| {
            item.kind == ReviewKind::AmbiguousSurnameTokens && item.detail == full_name
        }) {
            if !item.rows.contains(row) {
                item.rows.push(row.clone());
            }
        }
        false
    }

    /// Drops ambiguous-surname items whose full name a later pass rewrote.
    ///
    /// Returns the number of dropped items.
    pub fn retain_ambiguous_surnames(&mut self, mut still_present: impl FnMut(&str) -> bool) -> usize {
        let before = self.items.len();
        let names = &mut self.ambiguous_names;
        self.items.retain(|item| {
            if item.kind != ReviewKind::AmbiguousSurnameTokens || still_present(&item.detail) {
                return true;
            }
            names.remove(&item.detail);
            false
        });
        before - self.items.len()
    }

    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn of_kind(&self, kind: ReviewKind) -> impl Iterator<Item = &ReviewItem> + '_ {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    /// Unknown tokens seen so far, sorted.
    pub fn unknown_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.unknown_tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Writes the flagged-rows side table.
    ///
    /// Items without rows produce a single line with empty row columns.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "kind",
            "person_id",
            "detail",
            "surname",
            "given_names",
            "unit",
            "year",
            "month",
        ])?;
        for item in &self.items {
            let person_id = item.person_id.map(|id| id.to_string()).unwrap_or_default();
            if item.rows.is_empty() {
                csv_writer.write_record([
                    item.kind.as_str(),
                    person_id.as_str(),
                    item.detail.as_str(),
                    "",
                    "",
                    "",
                    "",
                    "",
                ])?;
                continue;
            }
            for row in &item.rows {
                let year = row.year.to_string();
                let month = row.month.map(|month| month.to_string()).unwrap_or_default();
                csv_writer.write_record([
                    item.kind.as_str(),
                    person_id.as_str(),
                    item.detail.as_str(),
                    row.surname.as_str(),
                    row.given_names.as_str(),
                    row.unit.as_str(),
                    year.as_str(),
                    month.as_str(),
                ])?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}
