use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::RecordStore;

/// Checks the index of a collection against its records and repairs it.
pub fn run<S: RecordStore>(store: &mut S, collection: &str) -> Result<CmdResult> {
    let report = store.doctor(collection)?;
    let mut result = CmdResult::default();

    if report.is_clean() {
        result.add_message(CmdMessage::success(format!(
            "Collection '{}' is consistent",
            collection
        )));
    } else {
        if report.pruned_entries > 0 {
            result.add_message(CmdMessage::info(format!(
                "Removed {} orphaned index entries",
                report.pruned_entries
            )));
        }
        if report.rebuilt_entries > 0 {
            result.add_message(CmdMessage::info(format!(
                "Rebuilt {} missing index entries",
                report.rebuilt_entries
            )));
        }
        if report.healed_entries > 0 {
            result.add_message(CmdMessage::info(format!(
                "Repaired {} stale index entries",
                report.healed_entries
            )));
        }
        if report.unreadable_records > 0 {
            result.add_message(CmdMessage::warning(format!(
                "{} records could not be read",
                report.unreadable_records
            )));
        }
    }

    result.report = Some(report);
    Ok(result)
}
