use crate::commands::helpers::require_folder;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PresetError, Result};
use crate::model::PresetUpdate;
use crate::sort::{reorder, ReorderTarget, SortItem};
use crate::store::RecordStore;
use std::collections::{BTreeMap, HashMap};

/// Where a drop lands.
#[derive(Debug, Clone, Default)]
pub struct DropTarget {
    /// Destination folder, `None` for the top level.
    pub folder: Option<String>,
    /// Sibling to drop next to. `None` appends at the end of the folder.
    pub target: Option<String>,
    pub insert_before: bool,
}

impl DropTarget {
    pub fn into_folder(folder: Option<&str>) -> Self {
        Self {
            folder: folder.map(String::from),
            ..Default::default()
        }
    }

    pub fn before(folder: Option<&str>, target: &str) -> Self {
        Self {
            folder: folder.map(String::from),
            target: Some(target.to_string()),
            insert_before: true,
        }
    }

    pub fn after(folder: Option<&str>, target: &str) -> Self {
        Self {
            folder: folder.map(String::from),
            target: Some(target.to_string()),
            insert_before: false,
        }
    }
}

/// Moves presets into a folder and places them relative to a sibling.
///
/// The moved presets keep the order in which `ids` lists them. Siblings are
/// only rewritten when the destination has to be renumbered.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &str,
    ids: &[String],
    to: &DropTarget,
    stride: i64,
) -> Result<CmdResult> {
    let dest = to.folder.as_deref();
    require_folder(store, collection, dest)?;

    let entries = store.list_index_entries(collection)?;
    let by_id: HashMap<&str, _> = entries.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut moved = Vec::with_capacity(ids.len());
    let mut changes: BTreeMap<String, PresetUpdate> = BTreeMap::new();
    for id in ids {
        let entry = by_id
            .get(id.as_str())
            .ok_or_else(|| PresetError::RecordNotFound(id.clone()))?;
        moved.push(SortItem::new(id.clone(), entry.sort));
        if entry.folder.as_deref() != dest {
            changes.insert(id.clone(), PresetUpdate::new().folder(to.folder.clone()));
        }
    }

    let siblings: Vec<SortItem> = entries
        .iter()
        .filter(|e| e.folder.as_deref() == dest)
        .map(|e| SortItem::new(e.id.clone(), e.sort))
        .collect();
    let placement = ReorderTarget {
        target: to.target.as_deref(),
        siblings: &siblings,
        insert_before: to.insert_before,
    };

    for update in reorder(&moved, &placement, stride)? {
        let change = changes.remove(&update.id).unwrap_or_default();
        changes.insert(update.id, change.sort(update.sort));
    }

    if changes.is_empty() {
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::info("Presets already in place"));
        return Ok(result);
    }

    let batch: Vec<(String, PresetUpdate)> = changes.into_iter().collect();
    let updated = store.update_many_records(collection, &batch)?;
    tracing::debug!(%collection, moved = ids.len(), written = updated.len(), "presets moved");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{} presets moved",
        ids.len()
    )));
    result.affected_presets = updated;
    Ok(result)
}
