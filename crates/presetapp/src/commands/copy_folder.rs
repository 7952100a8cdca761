use crate::commands::helpers::{require_folder, subtree};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::new_id;
use crate::progress::ProgressTracker;
use crate::sort::next_sort;
use crate::store::RecordStore;
use std::collections::HashMap;

/// Copies a folder, its subfolders and their presets into another collection.
///
/// Everything gets fresh ids. The copy is not atomic: a failure or a
/// cancellation leaves what was already copied in the destination, and
/// running the copy again creates a second copy.
pub fn run<S: RecordStore>(
    store: &mut S,
    source: &str,
    folder_id: &str,
    destination: &str,
    parent: Option<&str>,
    tracker: &mut ProgressTracker,
    stride: i64,
) -> Result<CmdResult> {
    let (folders, entries) = subtree(store, source, Some(folder_id))?;
    store.ensure_collection(destination)?;
    require_folder(store, destination, parent)?;
    tracker.set_total(folders.len() + entries.len());

    let mut result = CmdResult::default();
    let mut new_ids: HashMap<String, String> = HashMap::new();
    let top_sort = next_sort(
        store
            .list_folders(destination)?
            .iter()
            .filter(|f| f.folder.as_deref() == parent)
            .map(|f| f.sort),
        stride,
    )?;

    // Parents come before children, so every parent id is mapped in time.
    for folder in &folders {
        if tracker.is_cancelled() {
            return Ok(cancelled(result));
        }
        let mut copy = folder.clone();
        copy.id = new_id();
        if folder.id == folder_id {
            copy.folder = parent.map(String::from);
            copy.sort = top_sort;
        } else {
            copy.folder = folder.folder.as_ref().and_then(|p| new_ids.get(p).cloned());
        }
        store.save_folder(destination, &copy)?;
        new_ids.insert(folder.id.clone(), copy.id.clone());
        result.affected_folders.push(copy);
        tracker.step();
    }

    for entry in &entries {
        if tracker.is_cancelled() {
            return Ok(cancelled(result));
        }
        let mut record = match store.get_full_record(source, &entry.id) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(collection = %source, preset = %entry.id, error = %err, "skipping preset on copy");
                result.add_message(CmdMessage::warning(format!(
                    "Skipped '{}': {}",
                    entry.name, err
                )));
                tracker.step();
                continue;
            }
        };
        record.id = new_id();
        record.folder = record.folder.as_ref().and_then(|f| new_ids.get(f).cloned());
        store.create_record(destination, &record)?;
        result.affected_presets.push(record);
        tracker.step();
    }
    tracker.finish();

    tracing::info!(
        %source,
        %destination,
        folders = result.affected_folders.len(),
        presets = result.affected_presets.len(),
        "folder copied"
    );
    result.add_message(CmdMessage::success(format!(
        "Copied {} folders and {} presets to '{}'",
        result.affected_folders.len(),
        result.affected_presets.len(),
        destination
    )));
    Ok(result)
}

fn cancelled(mut result: CmdResult) -> CmdResult {
    result.add_message(CmdMessage::warning(format!(
        "Copy cancelled after {} folders and {} presets",
        result.affected_folders.len(),
        result.affected_presets.len()
    )));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PresetError;
    use crate::store::memory::fixtures::StoreFixture;

    fn fixture() -> StoreFixture {
        StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", Some("f1"))
            .with_folder("f3", "Lake", None)
            .with_preset("Bat", Some("f2"), &["cave"])
            .with_preset("Oak", Some("f1"), &[])
            .with_preset("Fish", Some("f3"), &[])
    }

    #[test]
    fn test_copy_folder_to_new_collection() {
        let mut fixture = fixture();
        let mut tracker = ProgressTracker::new("copy", 0);

        let result = run(&mut fixture.store, "presets", "f1", "world", None, &mut tracker, 10).unwrap();
        assert_eq!(result.affected_folders.len(), 2);
        assert_eq!(result.affected_presets.len(), 2);
        assert_eq!(tracker.snapshot().current, 4);

        let folders = fixture.store.list_folders("world").unwrap();
        let forest = folders.iter().find(|f| f.name == "Forest").unwrap();
        let cave = folders.iter().find(|f| f.name == "Cave").unwrap();
        assert_ne!(forest.id, "f1");
        assert_eq!(forest.folder, None);
        assert_eq!(cave.folder.as_deref(), Some(forest.id.as_str()));

        let entries = fixture.store.list_index_entries("world").unwrap();
        let bat = entries.iter().find(|e| e.name == "Bat").unwrap();
        assert_eq!(bat.folder.as_deref(), Some(cave.id.as_str()));
        assert!(bat.tags.contains("cave"));

        // Source untouched
        assert_eq!(fixture.store.list_index_entries("presets").unwrap().len(), 3);
    }

    #[test]
    fn test_copy_into_parent_folder() {
        let mut fixture = fixture();
        let mut tracker = ProgressTracker::new("copy", 0);

        run(&mut fixture.store, "presets", "f2", "presets", Some("f3"), &mut tracker, 10).unwrap();
        let folders = fixture.store.list_folders("presets").unwrap();
        let copies: Vec<_> = folders.iter().filter(|f| f.name == "Cave").collect();
        assert_eq!(copies.len(), 2);
        assert!(copies.iter().any(|f| f.folder.as_deref() == Some("f3")));
    }

    #[test]
    fn test_copy_cancelled_keeps_partial_work() {
        let mut fixture = fixture();
        let mut tracker = ProgressTracker::new("copy", 0);
        tracker.cancel_handle().cancel();

        let result = run(&mut fixture.store, "presets", "f1", "world", None, &mut tracker, 10).unwrap();
        assert!(result.affected_folders.is_empty());
        assert!(fixture.store.collection_available("world"));
    }

    #[test]
    fn test_copy_missing_folder() {
        let mut fixture = fixture();
        let mut tracker = ProgressTracker::new("copy", 0);
        assert!(matches!(
            run(&mut fixture.store, "presets", "nope", "world", None, &mut tracker, 10),
            Err(PresetError::FolderNotFound(_))
        ));
    }
}
