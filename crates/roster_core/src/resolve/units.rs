//! Unit hierarchy annotation.

use crate::audit::ReviewQueue;
use crate::lexicon::UnitDirectory;
use crate::model::observation::Observation;
use log::warn;

/// Sets `level` from the unit directory.
///
/// Unmapped units keep `level = None` and are flagged once per run.
/// Returns the number of rows left unmapped.
pub fn annotate_units(
    rows: &mut [Observation],
    directory: &UnitDirectory,
    review: &mut ReviewQueue,
) -> usize {
    let mut unmapped = 0;
    for row in rows.iter_mut() {
        match directory.resolve(&row.unit) {
            Some(code) => row.level = Some(code.level()),
            None => {
                row.level = None;
                unmapped += 1;
                if review.flag_unmapped_unit(&row.unit) {
                    warn!(
                        "event=unmapped_unit module=resolve unit={} status=deferred",
                        row.unit
                    );
                }
            }
        }
    }
    unmapped
}
