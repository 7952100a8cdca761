use crate::commands::helpers::{require_folder, subtree_folder_ids};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PresetError, Result};
use crate::model::{FolderDescriptor, FolderUpdate, SortingMode, ALL_TYPES, SUPPORTED_TYPES};
use crate::sort::next_sort;
use crate::store::RecordStore;

/// Creates a folder at the end of its parent.
pub fn create<S: RecordStore>(
    store: &mut S,
    collection: &str,
    name: &str,
    parent: Option<&str>,
    stride: i64,
) -> Result<CmdResult> {
    require_folder(store, collection, parent)?;
    let siblings = store.list_folders(collection)?;

    let mut folder = FolderDescriptor::new(name.trim());
    folder.folder = parent.map(String::from);
    folder.sort = next_sort(
        siblings
            .iter()
            .filter(|f| f.folder.as_deref() == parent)
            .map(|f| f.sort),
        stride,
    )?;
    store.save_folder(collection, &folder)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Folder created: {}",
        folder.name
    )));
    result.affected_folders.push(folder);
    Ok(result)
}

/// Applies a partial update to a folder.
///
/// A parent change is checked for cycles: a folder cannot move below itself.
pub fn update<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    update: &FolderUpdate,
) -> Result<CmdResult> {
    let folders = store.list_folders(collection)?;
    let mut folder = folders
        .iter()
        .find(|f| f.id == id)
        .cloned()
        .ok_or_else(|| PresetError::FolderNotFound(id.to_string()))?;

    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(PresetError::Validation("Folder name cannot be empty".into()));
        }
    }
    if let Some(types) = &update.types {
        validate_types(types)?;
    }
    if let Some(Some(parent)) = &update.folder {
        require_folder(store, collection, Some(parent))?;
        if subtree_folder_ids(&folders, id).iter().any(|f| f == parent) {
            return Err(PresetError::Validation(format!(
                "Cannot move folder '{}' into itself or one of its subfolders",
                folder.name
            )));
        }
    }

    update.apply(&mut folder);
    folder.name = folder.name.trim().to_string();
    store.save_folder(collection, &folder)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Folder updated: {}",
        folder.name
    )));
    result.affected_folders.push(folder);
    Ok(result)
}

pub fn rename<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    name: &str,
) -> Result<CmdResult> {
    let changes = FolderUpdate {
        name: Some(name.to_string()),
        ..Default::default()
    };
    update(store, collection, id, &changes)
}

pub fn recolor<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    color: Option<String>,
) -> Result<CmdResult> {
    let changes = FolderUpdate {
        color: Some(color),
        ..Default::default()
    };
    update(store, collection, id, &changes)
}

pub fn set_sorting<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    sorting: SortingMode,
) -> Result<CmdResult> {
    let changes = FolderUpdate {
        sorting: Some(sorting),
        ..Default::default()
    };
    update(store, collection, id, &changes)
}

/// Moves a folder under `parent`, or to the top level for `None`, appending
/// it after the existing folders there.
pub fn move_folder<S: RecordStore>(
    store: &mut S,
    collection: &str,
    id: &str,
    parent: Option<&str>,
    stride: i64,
) -> Result<CmdResult> {
    let siblings = store.list_folders(collection)?;
    let sort = next_sort(
        siblings
            .iter()
            .filter(|f| f.folder.as_deref() == parent && f.id != id)
            .map(|f| f.sort),
        stride,
    )?;
    let changes = FolderUpdate {
        folder: Some(parent.map(String::from)),
        sort: Some(sort),
        ..Default::default()
    };
    update(store, collection, id, &changes)
}

fn validate_types(types: &[String]) -> Result<()> {
    if types.is_empty() {
        return Err(PresetError::Validation(
            "A folder needs at least one document type".into(),
        ));
    }
    for t in types {
        if t != ALL_TYPES && !SUPPORTED_TYPES.contains(t.as_str()) {
            return Err(PresetError::Validation(format!(
                "Unsupported document type '{}'",
                t
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn folder(fixture: &StoreFixture, id: &str) -> FolderDescriptor {
        fixture
            .store
            .list_folders("presets")
            .unwrap()
            .into_iter()
            .find(|f| f.id == id)
            .unwrap()
    }

    #[test]
    fn test_create_folder() {
        let mut fixture = StoreFixture::default().with_folder("f1", "Forest", None);

        let result = create(&mut fixture.store, "presets", "  Cave ", Some("f1"), 10).unwrap();
        let cave = &result.affected_folders[0];
        assert_eq!(cave.name, "Cave");
        assert_eq!(cave.folder.as_deref(), Some("f1"));
        assert_eq!(cave.sort, 10);

        assert!(matches!(
            create(&mut fixture.store, "presets", "Lost", Some("nope"), 10),
            Err(PresetError::FolderNotFound(_))
        ));
        assert!(matches!(
            create(&mut fixture.store, "presets", "  ", None, 10),
            Err(PresetError::Validation(_))
        ));
    }

    #[test]
    fn test_rename_recolor_sorting() {
        let mut fixture = StoreFixture::default().with_folder("f1", "Forest", None);

        rename(&mut fixture.store, "presets", "f1", "Woods").unwrap();
        recolor(&mut fixture.store, "presets", "f1", Some("#00ff00".into())).unwrap();
        set_sorting(&mut fixture.store, "presets", "f1", SortingMode::Manual).unwrap();

        let f1 = folder(&fixture, "f1");
        assert_eq!(f1.name, "Woods");
        assert_eq!(f1.color.as_deref(), Some("#00ff00"));
        assert_eq!(f1.sorting, SortingMode::Manual);

        assert!(matches!(
            rename(&mut fixture.store, "presets", "nope", "X"),
            Err(PresetError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_move_folder() {
        let mut fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", None);

        move_folder(&mut fixture.store, "presets", "f2", Some("f1"), 10).unwrap();
        assert_eq!(folder(&fixture, "f2").folder.as_deref(), Some("f1"));

        move_folder(&mut fixture.store, "presets", "f2", None, 10).unwrap();
        assert_eq!(folder(&fixture, "f2").folder, None);
    }

    #[test]
    fn test_move_folder_rejects_cycles() {
        let mut fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", Some("f1"))
            .with_folder("f3", "Den", Some("f2"));

        assert!(matches!(
            move_folder(&mut fixture.store, "presets", "f1", Some("f3"), 10),
            Err(PresetError::Validation(_))
        ));
        assert!(matches!(
            move_folder(&mut fixture.store, "presets", "f1", Some("f1"), 10),
            Err(PresetError::Validation(_))
        ));
        assert_eq!(folder(&fixture, "f1").folder, None);
    }

    #[test]
    fn test_update_types() {
        let mut fixture = StoreFixture::default().with_folder("f1", "Forest", None);
        let changes = FolderUpdate {
            types: Some(vec!["Tile".into()]),
            ..Default::default()
        };
        update(&mut fixture.store, "presets", "f1", &changes).unwrap();
        assert_eq!(folder(&fixture, "f1").types, vec!["Tile"]);

        let bad = FolderUpdate {
            types: Some(vec!["Spaceship".into()]),
            ..Default::default()
        };
        assert!(matches!(
            update(&mut fixture.store, "presets", "f1", &bad),
            Err(PresetError::Validation(_))
        ));
    }
}
