use crate::commands::helpers::{next_sort_in, require_folder};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PresetError, Result};
use crate::model::PresetUpdate;
use crate::store::RecordStore;
use crate::tags::normalize_tags;

/// Applies a partial update to one preset.
///
/// Tags are normalized. Moving the preset to another folder without an
/// explicit sort value appends it to the end of that folder.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    mut update: PresetUpdate,
    stride: i64,
) -> Result<CmdResult> {
    if update.is_empty() {
        return Err(PresetError::Validation("Nothing to update".into()));
    }
    if let Some(tags) = update.tags.take() {
        update.tags = Some(normalize_tags(&tags)?);
    }
    if let Some(folder) = update.folder.clone() {
        require_folder(store, collection, folder.as_deref())?;
        let current = store.get_full_record(collection, id)?;
        if update.sort.is_none() && current.folder != folder {
            update.sort = Some(next_sort_in(store, collection, folder.as_deref(), stride)?);
        }
    }

    let record = store.update_record(collection, id, &update)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Preset updated: {}",
        record.name
    )));
    result.affected_presets.push(record);
    Ok(result)
}

/// Renames one preset.
pub fn rename<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    name: &str,
) -> Result<CmdResult> {
    let name = name.trim();
    run(store, collection, id, PresetUpdate::new().name(name), 1)
}
