use crate::commands::helpers::{next_sort_in, require_folder};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PresetError, Result};
use crate::model::{new_id, PresetRecord};
use crate::progress::ProgressTracker;
use crate::sort::step_sort;
use crate::store::RecordStore;
use crate::tags::normalize_tags;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Imports presets from JSON text: one record object or an array of them.
///
/// Every imported preset gets a fresh id and lands in `folder`, appended
/// after what is already there. Records that fail validation are skipped
/// with a warning; store failures abort the import. Presets imported before
/// an abort or a cancellation stay imported.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &str,
    json: &str,
    folder: Option<&str>,
    tracker: &mut ProgressTracker,
    stride: i64,
) -> Result<CmdResult> {
    require_folder(store, collection, folder)?;
    let candidates = parse_records(json)?;
    tracker.set_total(candidates.len());

    let mut result = CmdResult::default();
    let mut sort = next_sort_in(store, collection, folder, stride)?;

    for (position, candidate) in candidates.into_iter().enumerate() {
        if tracker.is_cancelled() {
            result.add_message(CmdMessage::warning(format!(
                "Import cancelled after {} presets",
                result.affected_presets.len()
            )));
            break;
        }

        match prepare(candidate) {
            Ok(mut record) => {
                record.folder = folder.map(String::from);
                record.sort = sort;
                store.create_record(collection, &record)?;
                sort = step_sort(sort, stride)?;
                result.affected_presets.push(record);
            }
            Err(err) => {
                tracing::warn!(%collection, position, error = %err, "skipping preset on import");
                result.add_message(CmdMessage::warning(format!(
                    "Skipped entry {}: {}",
                    position + 1,
                    err
                )));
            }
        }
        tracker.step();
    }
    tracker.finish();

    result.add_message(CmdMessage::success(format!(
        "Total imported: {}",
        result.affected_presets.len()
    )));
    Ok(result)
}

/// Imports the JSON file at `path`.
pub fn run_file<S: RecordStore>(
    store: &mut S,
    collection: &str,
    path: &Path,
    folder: Option<&str>,
    tracker: &mut ProgressTracker,
    stride: i64,
) -> Result<CmdResult> {
    let json = fs::read_to_string(path)?;
    let mut result = run(store, collection, &json, folder, tracker, stride)?;
    result.add_message(CmdMessage::info(format!("Imported: {}", path.display())));
    Ok(result)
}

/// Splits import JSON into per-record values.
fn parse_records(json: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        _ => Err(PresetError::Validation(
            "Import expects a preset object or an array of presets".into(),
        )),
    }
}

fn prepare(mut value: Value) -> Result<PresetRecord> {
    let Some(object) = value.as_object_mut() else {
        return Err(PresetError::Validation("Entry is not an object".into()));
    };
    // Incoming ids are replaced anyway.
    object.insert("id".into(), Value::String(new_id()));
    object.remove("folder");

    let mut record: PresetRecord = serde_json::from_value(value)?;
    record.tags = normalize_tags(&record.tags)?;
    record.validate()?;
    Ok(record)
}
