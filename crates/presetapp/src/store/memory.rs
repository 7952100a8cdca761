use super::backend::StorageBackend;
use super::mem_backend::MemBackend;
use super::preset_store::PresetStore;

pub type InMemoryStore = PresetStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// An empty store with no collections.
    pub fn new() -> Self {
        PresetStore::with_backend(MemBackend::new())
    }

    /// A store with the given collections already created.
    pub fn with_collections(collections: &[&str]) -> Self {
        let backend = MemBackend::new();
        for collection in collections {
            // MemBackend only refuses creation when told to fail.
            let _ = backend.create_collection(collection);
        }
        PresetStore::with_backend(backend)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{FolderDescriptor, PresetRecord};
    use crate::store::RecordStore;
    use serde_json::json;

    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub collection: String,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new("presets")
        }
    }

    impl StoreFixture {
        pub fn new(collection: &str) -> Self {
            Self {
                store: InMemoryStore::with_collections(&[collection]),
                collection: collection.to_string(),
            }
        }

        pub fn with_presets(mut self, count: usize, document_name: &str) -> Self {
            for i in 0..count {
                let mut record = PresetRecord::new(
                    format!("Test Preset {}", i + 1),
                    document_name,
                    vec![json!({"x": i * 100, "y": 0})],
                )
                .unwrap();
                record.sort = (i as i64 + 1) * 10;
                self.store.create_record(&self.collection, &record).unwrap();
            }
            self
        }

        pub fn with_preset(mut self, name: &str, folder: Option<&str>, tags: &[&str]) -> Self {
            let mut record =
                PresetRecord::new(name, "Tile", vec![json!({"x": 0, "y": 0})]).unwrap();
            record.folder = folder.map(String::from);
            record.tags = tags.iter().map(|t| t.to_string()).collect();
            self.store.create_record(&self.collection, &record).unwrap();
            self
        }

        pub fn with_folder(mut self, id: &str, name: &str, parent: Option<&str>) -> Self {
            let mut folder = FolderDescriptor::new(name);
            folder.id = id.to_string();
            folder.folder = parent.map(String::from);
            self.store.save_folder(&self.collection, &folder).unwrap();
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use super::*;
    use crate::error::PresetError;
    use crate::store::RecordStore;

    #[test]
    fn test_new_store_has_no_collections() {
        let store = InMemoryStore::new();
        assert!(store.list_collections().unwrap().is_empty());
        assert!(matches!(
            store.list_folders("presets"),
            Err(PresetError::CollectionUnavailable(_))
        ));
    }

    #[test]
    fn test_doctor_noop() {
        let mut store = InMemoryStore::with_collections(&["presets"]);
        let report = store.doctor("presets").unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_fixtures_coverage() {
        let fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_folder("f2", "Cave", Some("f1"))
            .with_presets(2, "Token")
            .with_preset("Oak", Some("f1"), &["tree"]);

        let entries = fixture.store.list_index_entries("presets").unwrap();
        assert_eq!(entries.len(), 3);
        let oak = entries.iter().find(|e| e.name == "Oak").unwrap();
        assert_eq!(oak.folder.as_deref(), Some("f1"));
        assert!(oak.tags.contains("tree"));

        let folders = fixture.store.list_folders("presets").unwrap();
        assert_eq!(folders.len(), 2);
    }
}
