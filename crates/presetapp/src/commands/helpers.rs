use crate::error::{PresetError, Result};
use crate::model::{FolderDescriptor, IndexEntry};
use crate::sort::next_sort;
use crate::store::RecordStore;
use std::collections::{BTreeSet, HashMap};

/// Ids of `root` and every folder below it, parents before children.
///
/// Loops in the stored hierarchy are cut where they are found.
pub fn subtree_folder_ids(folders: &[FolderDescriptor], root: &str) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for folder in folders {
        if let Some(parent) = folder.folder.as_deref() {
            children.entry(parent).or_default().push(folder.id.as_str());
        }
    }

    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        out.push(current.to_string());
        if let Some(kids) = children.get(current) {
            stack.extend(kids.iter().rev());
        }
    }
    out
}

/// Folders and index entries of a subtree, or of the whole collection for `None`.
pub fn subtree<S: RecordStore>(
    store: &S,
    collection: &str,
    root: Option<&str>,
) -> Result<(Vec<FolderDescriptor>, Vec<IndexEntry>)> {
    let folders = store.list_folders(collection)?;
    let entries = store.list_index_entries(collection)?;
    let Some(root) = root else {
        return Ok((folders, entries));
    };
    if !folders.iter().any(|f| f.id == root) {
        return Err(PresetError::FolderNotFound(root.to_string()));
    }

    let ids = subtree_folder_ids(&folders, root);
    let id_set: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
    let mut by_id: HashMap<String, FolderDescriptor> =
        folders.into_iter().map(|f| (f.id.clone(), f)).collect();
    let ordered = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    let entries = entries
        .into_iter()
        .filter(|e| e.folder.as_deref().is_some_and(|f| id_set.contains(f)))
        .collect();
    Ok((ordered, entries))
}

/// Sort value that places a new item after everything in `folder`.
pub fn next_sort_in<S: RecordStore>(
    store: &S,
    collection: &str,
    folder: Option<&str>,
    stride: i64,
) -> Result<i64> {
    let entries = store.list_index_entries(collection)?;
    next_sort(
        entries
            .iter()
            .filter(|e| e.folder.as_deref() == folder)
            .map(|e| e.sort),
        stride,
    )
}

/// Fails unless `folder` is `None` or exists in the collection.
pub fn require_folder<S: RecordStore>(
    store: &S,
    collection: &str,
    folder: Option<&str>,
) -> Result<()> {
    match folder {
        None => Ok(()),
        Some(id) => {
            if store.list_folders(collection)?.iter().any(|f| f.id == id) {
                Ok(())
            } else {
                Err(PresetError::FolderNotFound(id.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn folder(id: &str, parent: Option<&str>) -> FolderDescriptor {
        let mut f = FolderDescriptor::new(id);
        f.id = id.into();
        f.folder = parent.map(String::from);
        f
    }

    #[test]
    fn test_subtree_folder_ids() {
        let folders = vec![
            folder("a", None),
            folder("b", Some("a")),
            folder("c", Some("b")),
            folder("d", None),
        ];
        assert_eq!(subtree_folder_ids(&folders, "a"), vec!["a", "b", "c"]);
        assert_eq!(subtree_folder_ids(&folders, "d"), vec!["d"]);
    }

    #[test]
    fn test_subtree_folder_ids_cuts_loops() {
        let folders = vec![folder("a", Some("b")), folder("b", Some("a"))];
        assert_eq!(subtree_folder_ids(&folders, "a"), vec!["a", "b"]);
    }

    #[test]
    fn test_subtree_filters_entries() {
        let fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", Some("f1"))
            .with_folder("f3", "Lake", None)
            .with_preset("Bat", Some("f2"), &[])
            .with_preset("Fish", Some("f3"), &[])
            .with_preset("Rock", None, &[]);

        let (folders, entries) = subtree(&fixture.store, "presets", Some("f1")).unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Bat");

        let (all_folders, all_entries) = subtree(&fixture.store, "presets", None).unwrap();
        assert_eq!(all_folders.len(), 3);
        assert_eq!(all_entries.len(), 3);

        assert!(matches!(
            subtree(&fixture.store, "presets", Some("nope")),
            Err(PresetError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_next_sort_in_folder() {
        let fixture = StoreFixture::default().with_presets(3, "Tile");
        assert_eq!(next_sort_in(&fixture.store, "presets", None, 10).unwrap(), 40);
        assert_eq!(
            next_sort_in(&fixture.store, "presets", Some("empty"), 10).unwrap(),
            10
        );
    }
}
