use crate::commands::{CmdMessage, CmdResult};
use crate::config::PresetsConfig;
use crate::error::Result;
use crate::model::{PresetRecord, PresetUpdate, TypeFilter};
use crate::store::RecordStore;
use crate::tree::{ExpandedState, Tree, TreeBuilder};

/// Fetches `collection` as a tree.
///
/// Store failures are not returned: the fetch logs them, falls back to the
/// configured default collection (creating it when missing) and retries once.
/// If the retry fails too, the result carries no tree and an error message.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &str,
    filter: &TypeFilter,
    expanded: &ExpandedState,
    config: &PresetsConfig,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    let err = match fetch(store, collection, filter, expanded, config) {
        Ok(tree) => return Ok(result.with_tree(tree)),
        Err(err) => err,
    };
    tracing::warn!(%collection, error = %err, "tree fetch failed, falling back");

    let fallback = config.default_collection.as_str();
    let retry = store
        .ensure_collection(fallback)
        .and_then(|_| fetch(store, fallback, filter, expanded, config));
    match retry {
        Ok(tree) => {
            if fallback != collection {
                result.add_message(CmdMessage::warning(format!(
                    "Collection '{}' is unavailable, showing '{}' instead",
                    collection, fallback
                )));
            }
            Ok(result.with_tree(tree))
        }
        Err(retry_err) => {
            tracing::warn!(collection = %fallback, error = %retry_err, "fallback fetch failed");
            result.add_message(CmdMessage::error(format!(
                "Could not load presets: {}",
                retry_err
            )));
            Ok(result)
        }
    }
}

/// One fetch attempt. Stale entries are recovered from their full records,
/// and the recovered entries are written back afterwards.
fn fetch<S: RecordStore>(
    store: &mut S,
    collection: &str,
    filter: &TypeFilter,
    expanded: &ExpandedState,
    config: &PresetsConfig,
) -> Result<Tree> {
    let folders = store.list_folders(collection)?;
    let entries = store.list_index_entries(collection)?;
    let options = config.tree_options();

    let mut healed: Vec<PresetRecord> = Vec::new();
    let tree = {
        let reader: &S = store;
        TreeBuilder::new(collection, filter, &options)
            .expanded(expanded)
            .build(&folders, entries, |entry| {
                match reader.get_full_record(collection, &entry.id) {
                    Ok(record) => {
                        let document_name = record.document_name.clone();
                        healed.push(record);
                        Some(document_name)
                    }
                    Err(err) => {
                        tracing::debug!(preset = %entry.id, error = %err, "stale entry not recoverable");
                        None
                    }
                }
            })
    };

    for record in healed {
        if record.document_name.trim().is_empty() {
            continue;
        }
        if let Err(err) =
            store.write_index_entry(collection, &record.id, &PresetUpdate::index_fields_of(&record))
        {
            tracing::warn!(preset = %record.id, error = %err, "failed to heal index entry");
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IndexEntry, PresetRecord};
    use crate::store::backend::StorageBackend;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn tree_of(result: &CmdResult) -> &Tree {
        result.tree.as_ref().unwrap()
    }

    #[test]
    fn test_fetch_tree() {
        let mut fixture = StoreFixture::default()
            .with_folder("1", "Forest", None)
            .with_folder("2", "Cave", Some("1"))
            .with_preset("Tree", Some("2"), &[])
            .with_preset("Rock", None, &[]);

        let result = run(
            &mut fixture.store,
            "presets",
            &TypeFilter::All,
            &ExpandedState::new(),
            &PresetsConfig::default(),
        )
        .unwrap();

        let tree = tree_of(&result);
        assert_eq!(tree.collection, "presets");
        assert_eq!(tree.folders, vec!["1"]);
        assert_eq!(tree.folder("1").unwrap().children, vec!["2"]);
        assert_eq!(tree.folder("2").unwrap().presets.len(), 1);
        assert_eq!(tree.presets.len(), 1);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_fetch_falls_back_to_default_collection() {
        let mut fixture = StoreFixture::default().with_preset("Rock", None, &[]);

        let result = run(
            &mut fixture.store,
            "missing",
            &TypeFilter::All,
            &ExpandedState::new(),
            &PresetsConfig::default(),
        )
        .unwrap();

        assert_eq!(tree_of(&result).collection, "presets");
        assert_eq!(tree_of(&result).all_presets.len(), 1);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].level, crate::commands::MessageLevel::Warning);
    }

    #[test]
    fn test_fallback_creates_default_collection() {
        let mut store = InMemoryStore::new();
        let result = run(
            &mut store,
            "missing",
            &TypeFilter::All,
            &ExpandedState::new(),
            &PresetsConfig::default(),
        )
        .unwrap();

        assert!(tree_of(&result).all_presets.is_empty());
        assert!(store.collection_available("presets"));
    }

    #[test]
    fn test_fallback_failure_reports_error() {
        let mut store = InMemoryStore::new();
        store.backend().set_unavailable("presets", true);

        let result = run(
            &mut store,
            "presets",
            &TypeFilter::All,
            &ExpandedState::new(),
            &PresetsConfig::default(),
        )
        .unwrap();

        assert!(result.tree.is_none());
        assert!(result.has_errors());
    }

    #[test]
    fn test_stale_entry_is_healed() {
        let mut fixture = StoreFixture::default();
        let record = PresetRecord::new("Torch", "AmbientLight", vec![json!({"x": 0})]).unwrap();
        fixture.store.create_record("presets", &record).unwrap();

        let mut index = fixture.store.backend().load_index("presets").unwrap();
        index.get_mut(&record.id).unwrap().document_name = None;
        fixture.store.backend().save_index("presets", &index).unwrap();

        let result = run(
            &mut fixture.store,
            "presets",
            &TypeFilter::All,
            &ExpandedState::new(),
            &PresetsConfig::default(),
        )
        .unwrap();

        let node = tree_of(&result).preset(&record.id).unwrap();
        assert_eq!(node.document_name, "AmbientLight");

        let entries = fixture.store.list_index_entries("presets").unwrap();
        assert_eq!(entries[0].document_name.as_deref(), Some("AmbientLight"));
    }

    #[test]
    fn test_unrecoverable_stale_entry_is_excluded() {
        let fixture = StoreFixture::default();
        let mut index = fixture.store.backend().load_index("presets").unwrap();
        index.insert(
            "ghost".into(),
            IndexEntry {
                id: "ghost".into(),
                name: "Ghost".into(),
                img: None,
                document_name: None,
                tags: Default::default(),
                folder: None,
                sort: 0,
            },
        );
        fixture.store.backend().save_index("presets", &index).unwrap();

        let folders = fixture.store.list_folders("presets").unwrap();
        let tree = TreeBuilder::new("presets", &TypeFilter::All, &Default::default()).build(
            &folders,
            index.into_values().collect(),
            |entry| {
                fixture
                    .store
                    .get_full_record("presets", &entry.id)
                    .ok()
                    .map(|r| r.document_name)
            },
        );
        assert!(tree.preset("ghost").is_none());
        assert!(tree.presets.is_empty());
    }

    #[test]
    fn test_expanded_state_is_applied() {
        let mut fixture = StoreFixture::default().with_folder("1", "Forest", None);
        let mut expanded = ExpandedState::new();
        expanded.set_expanded(crate::tree::folder_uuid("presets", "1"), true);

        let result = run(
            &mut fixture.store,
            "presets",
            &TypeFilter::All,
            &expanded,
            &PresetsConfig::default(),
        )
        .unwrap();
        assert!(tree_of(&result).folder("1").unwrap().expanded);
    }
}
