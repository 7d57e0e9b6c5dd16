//! Per-run change log of name rewrites.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// One before → after rewrite performed by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub pass: String,
    pub before: String,
    pub after: String,
}

/// Ordered change log for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLog {
    run_id: Uuid,
    started_at_ms: i64,
    entries: Vec<ChangeEntry>,
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeLog {
    /// Starts a log for a fresh run stamped with the current time.
    pub fn new() -> Self {
        Self::with_run(Uuid::new_v4(), now_epoch_ms())
    }

    /// Starts a log for a caller-provided run identity.
    pub fn with_run(run_id: Uuid, started_at_ms: i64) -> Self {
        Self {
            run_id,
            started_at_ms,
            entries: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Unix epoch milliseconds at which the run started.
    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    pub fn record(&mut self, pass: &str, before: impl Into<String>, after: impl Into<String>) {
        self.entries.push(ChangeEntry {
            pass: pass.to_string(),
            before: before.into(),
            after: after.into(),
        });
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    /// Entries written by one pass, in recording order.
    pub fn entries_for<'a>(&'a self, pass: &'a str) -> impl Iterator<Item = &'a ChangeEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.pass == pass)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes `time,function,before,after` rows, one per entry.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["time", "function", "before", "after"])?;
        let time = self.started_at_ms.to_string();
        for entry in &self.entries {
            csv_writer.write_record([
                time.as_str(),
                entry.pass.as_str(),
                entry.before.as_str(),
                entry.after.as_str(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
