use crate::commands::helpers::{next_sort_in, subtree};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PresetError, Result};
use crate::model::PresetUpdate;
use crate::sort::step_sort;
use crate::store::RecordStore;

/// Deletes presets together with their index entries.
///
/// Stops at the first failure; presets deleted before it stay deleted.
pub fn run<S: RecordStore>(store: &mut S, collection: &str, ids: &[String]) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    for id in ids {
        let record = store.get_full_record(collection, id)?;
        store.delete_record(collection, id)?;
        result.affected_presets.push(record);
    }

    match result.affected_presets.as_slice() {
        [] => {}
        [only] => {
            let message = format!("Preset deleted: {}", only.name);
            result.add_message(CmdMessage::success(message));
        }
        many => {
            let message = format!("{} presets deleted", many.len());
            result.add_message(CmdMessage::success(message));
        }
    }
    Ok(result)
}

/// Deletes a folder.
///
/// With `with_contents` every folder and preset below it is deleted too.
/// Otherwise its child folders and presets move up to its parent, presets
/// appended after the parent's existing ones.
pub fn delete_folder<S: RecordStore>(
    store: &mut S,
    collection: &str,
    folder_id: &str,
    with_contents: bool,
    stride: i64,
) -> Result<CmdResult> {
    let (folders, entries) = subtree(store, collection, Some(folder_id))?;
    let target = folders
        .first()
        .cloned()
        .ok_or_else(|| PresetError::FolderNotFound(folder_id.to_string()))?;
    let mut result = CmdResult::default();

    if with_contents {
        for entry in &entries {
            store.delete_record(collection, &entry.id)?;
        }
        for folder in folders.iter().rev() {
            store.delete_folder(collection, &folder.id)?;
        }
        result.add_message(CmdMessage::success(format!(
            "Folder deleted: {} ({} presets, {} subfolders)",
            target.name,
            entries.len(),
            folders.len() - 1
        )));
        result.affected_folders = folders;
        return Ok(result);
    }

    let parent = target.folder.clone();
    for child in folders.iter().filter(|f| f.folder.as_deref() == Some(folder_id)) {
        let mut moved = child.clone();
        moved.folder = parent.clone();
        store.save_folder(collection, &moved)?;
        result.affected_folders.push(moved);
    }

    let mut direct: Vec<_> = entries
        .iter()
        .filter(|e| e.folder.as_deref() == Some(folder_id))
        .collect();
    direct.sort_by_key(|e| e.sort);
    let mut sort = next_sort_in(store, collection, parent.as_deref(), stride)?;
    let updates: Vec<(String, PresetUpdate)> = direct
        .iter()
        .map(|entry| {
            let update = PresetUpdate::new().folder(parent.clone()).sort(sort);
            sort = step_sort(sort, stride)?;
            Ok((entry.id.clone(), update))
        })
        .collect::<Result<_>>()?;
    result.affected_presets = store.update_many_records(collection, &updates)?;

    store.delete_folder(collection, folder_id)?;
    result.add_message(CmdMessage::success(format!(
        "Folder deleted: {}",
        target.name
    )));
    if !updates.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "{} presets moved up",
            updates.len()
        )));
    }
    result.affected_folders.insert(0, target);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn id_of(fixture: &StoreFixture, name: &str) -> String {
        fixture
            .store
            .list_index_entries("presets")
            .unwrap()
            .into_iter()
            .find(|e| e.name == name)
            .unwrap()
            .id
    }

    #[test]
    fn test_delete_presets() {
        let mut fixture = StoreFixture::default().with_presets(3, "Tile");
        let ids = vec![
            id_of(&fixture, "Test Preset 1"),
            id_of(&fixture, "Test Preset 2"),
        ];

        let result = run(&mut fixture.store, "presets", &ids).unwrap();
        assert_eq!(result.affected_presets.len(), 2);
        assert_eq!(result.messages[0].content, "2 presets deleted");

        let remaining = fixture.store.list_index_entries("presets").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Test Preset 3");
        assert!(fixture.store.get_full_record("presets", &ids[0]).is_err());
    }

    #[test]
    fn test_delete_missing_preset() {
        let mut fixture = StoreFixture::default();
        assert!(matches!(
            run(&mut fixture.store, "presets", &["nope".to_string()]),
            Err(PresetError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_delete_folder_with_contents() {
        let mut fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", Some("f1"))
            .with_preset("Bat", Some("f2"), &[])
            .with_preset("Oak", Some("f1"), &[])
            .with_preset("Rock", None, &[]);

        let result = delete_folder(&mut fixture.store, "presets", "f1", true, 10).unwrap();
        assert_eq!(result.affected_folders.len(), 2);

        assert!(fixture.store.list_folders("presets").unwrap().is_empty());
        let remaining = fixture.store.list_index_entries("presets").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Rock");
    }

    #[test]
    fn test_delete_folder_moves_contents_up() {
        let mut fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", Some("f1"))
            .with_folder("f3", "Den", Some("f2"))
            .with_preset("Bat", Some("f2"), &[])
            .with_preset("Oak", Some("f1"), &[]);

        delete_folder(&mut fixture.store, "presets", "f2", false, 10).unwrap();

        let folders = fixture.store.list_folders("presets").unwrap();
        assert_eq!(folders.len(), 2);
        let den = folders.iter().find(|f| f.id == "f3").unwrap();
        assert_eq!(den.folder.as_deref(), Some("f1"));

        let bat = fixture
            .store
            .get_full_record("presets", &id_of(&fixture, "Bat"))
            .unwrap();
        assert_eq!(bat.folder.as_deref(), Some("f1"));
        assert_eq!(bat.sort, 10);
    }

    #[test]
    fn test_delete_missing_folder() {
        let mut fixture = StoreFixture::default();
        assert!(matches!(
            delete_folder(&mut fixture.store, "presets", "nope", false, 10),
            Err(PresetError::FolderNotFound(_))
        ));
    }
}
