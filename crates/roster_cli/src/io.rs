//! CSV boundary: raw roster rows in, resolved panel out.

use anyhow::{Context, Result};
use roster_core::{Observation, UnitDirectory};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const PANEL_HEADER: [&str; 11] = [
    "cod persoană",
    "nume",
    "prenume",
    "sex",
    "instituţie",
    "an",
    "lună",
    "ca cod",
    "trib cod",
    "jud cod",
    "nivel",
];

#[derive(Debug, Deserialize)]
struct InputRecord {
    #[serde(rename = "nume")]
    surname: String,
    #[serde(rename = "prenume")]
    given_names: String,
    #[serde(rename = "instituţie")]
    unit: String,
    #[serde(rename = "an")]
    year: i32,
    #[serde(rename = "lună", default)]
    month: Option<u32>,
}

/// Reads `nume,prenume,instituţie,an,lună` rows; `lună` may be empty.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening input {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<InputRecord>().enumerate() {
        let record = record.with_context(|| format!("reading input row {}", idx + 1))?;
        rows.push(Observation::new(
            record.surname,
            record.given_names,
            record.unit,
            record.year,
            record.month,
        ));
    }
    Ok(rows)
}

/// Writes the resolved panel with unit codes looked up in `directory`.
pub fn write_panel(path: &Path, rows: &[Observation], directory: &UnitDirectory) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(PANEL_HEADER)?;
    for row in rows {
        let code = directory.resolve(&row.unit);
        let (branch, sub_branch, local) = code
            .as_ref()
            .map(|code| (code.branch.as_str(), code.sub_branch.as_str(), code.local.as_str()))
            .unwrap_or(("", "", ""));
        let person_id = row.person_id.map(|id| id.to_string()).unwrap_or_default();
        let month = row.month.map(|month| month.to_string()).unwrap_or_default();
        let level = row.level.map(|level| level.to_string()).unwrap_or_default();
        writer.write_record([
            person_id.as_str(),
            row.surname.as_str(),
            row.given_names.as_str(),
            row.gender.map(|gender| gender.as_str()).unwrap_or(""),
            row.unit.as_str(),
            row.year.to_string().as_str(),
            month.as_str(),
            branch,
            sub_branch,
            local,
            level.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates `path`, and its parent directories when missing.
pub fn create_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::File::create(path).with_context(|| format!("creating {}", path.display()))
}

fn create_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    Ok(csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(create_file(path)?))
}
