use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PresetError, Result};
use crate::model::PresetUpdate;
use crate::store::RecordStore;
use crate::tags::{normalize_tags, tag_counts};
use std::collections::BTreeSet;

/// Adds tags to presets. Presets that already carry every tag are left alone.
pub fn add_tags<S: RecordStore>(
    store: &mut S,
    collection: &str,
    ids: &[String],
    tags: &[String],
) -> Result<CmdResult> {
    let tags = normalize_tags(tags)?;
    if tags.is_empty() {
        return Err(PresetError::Validation("No tags given".into()));
    }
    retag(store, collection, ids, |current| current.extend(tags.iter().cloned()))
        .map(|mut result| {
            result.add_message(CmdMessage::success(format!(
                "Tagged {} presets with {}",
                result.affected_presets.len(),
                join(&tags)
            )));
            result
        })
}

/// Removes tags from presets.
pub fn remove_tags<S: RecordStore>(
    store: &mut S,
    collection: &str,
    ids: &[String],
    tags: &[String],
) -> Result<CmdResult> {
    let tags = normalize_tags(tags)?;
    retag(store, collection, ids, |current| {
        current.retain(|t| !tags.contains(t));
    })
    .map(|mut result| {
        result.add_message(CmdMessage::success(format!(
            "Removed {} from {} presets",
            join(&tags),
            result.affected_presets.len()
        )));
        result
    })
}

/// Every tag used in the collection with the number of presets carrying it.
pub fn list_tags<S: RecordStore>(store: &S, collection: &str) -> Result<CmdResult> {
    let entries = store.list_index_entries(collection)?;
    Ok(CmdResult {
        tags: tag_counts(&entries),
        ..Default::default()
    })
}

fn retag<S, F>(store: &mut S, collection: &str, ids: &[String], mut edit: F) -> Result<CmdResult>
where
    S: RecordStore,
    F: FnMut(&mut BTreeSet<String>),
{
    let entries = store.list_index_entries(collection)?;
    let mut batch = Vec::new();
    for id in ids {
        let entry = entries
            .iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| PresetError::RecordNotFound(id.clone()))?;
        let mut tags = entry.tags.clone();
        edit(&mut tags);
        if tags != entry.tags {
            batch.push((id.clone(), PresetUpdate::new().tags(tags)));
        }
    }

    let mut result = CmdResult::default();
    if !batch.is_empty() {
        result.affected_presets = store.update_many_records(collection, &batch)?;
    }
    Ok(result)
}

fn join(tags: &BTreeSet<String>) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}
