use super::backend::{IndexMap, StorageBackend};
use crate::error::{PresetError, Result};
use crate::model::{FolderDescriptor, PresetRecord};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the library is single-threaded.
/// This avoids the overhead of `RwLock` while still allowing the
/// `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    collections: RefCell<BTreeSet<String>>,
    index: RefCell<HashMap<String, IndexMap>>,
    folders: RefCell<HashMap<String, Vec<FolderDescriptor>>>,
    records: RefCell<HashMap<String, BTreeMap<String, PresetRecord>>>,
    unavailable: RefCell<BTreeSet<String>>,
    simulate_write_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make a collection unreachable, as if the host lost it.
    pub fn set_unavailable(&self, collection: &str, unavailable: bool) {
        let mut set = self.unavailable.borrow_mut();
        if unavailable {
            set.insert(collection.to_string());
        } else {
            set.remove(collection);
        }
    }

    fn check(&self, collection: &str) -> Result<()> {
        if self.collection_available(collection) {
            Ok(())
        } else {
            Err(PresetError::CollectionUnavailable(collection.to_string()))
        }
    }

    fn check_write(&self, collection: &str) -> Result<()> {
        self.check(collection)?;
        if *self.simulate_write_error.borrow() {
            return Err(PresetError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_index(&self, collection: &str) -> Result<IndexMap> {
        self.check(collection)?;
        Ok(self
            .index
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn save_index(&self, collection: &str, index: &IndexMap) -> Result<()> {
        self.check_write(collection)?;
        self.index
            .borrow_mut()
            .insert(collection.to_string(), index.clone());
        Ok(())
    }

    fn load_folders(&self, collection: &str) -> Result<Vec<FolderDescriptor>> {
        self.check(collection)?;
        Ok(self
            .folders
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn save_folders(&self, collection: &str, folders: &[FolderDescriptor]) -> Result<()> {
        self.check_write(collection)?;
        self.folders
            .borrow_mut()
            .insert(collection.to_string(), folders.to_vec());
        Ok(())
    }

    fn read_record(&self, collection: &str, id: &str) -> Result<Option<PresetRecord>> {
        self.check(collection)?;
        Ok(self
            .records
            .borrow()
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    fn write_record(&self, collection: &str, record: &PresetRecord) -> Result<()> {
        self.check_write(collection)?;
        self.records
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete_record_data(&self, collection: &str, id: &str) -> Result<()> {
        self.check_write(collection)?;
        if let Some(records) = self.records.borrow_mut().get_mut(collection) {
            records.remove(id);
        }
        Ok(())
    }

    fn list_record_ids(&self, collection: &str) -> Result<Vec<String>> {
        self.check(collection)?;
        Ok(self
            .records
            .borrow()
            .get(collection)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let unavailable = self.unavailable.borrow();
        Ok(self
            .collections
            .borrow()
            .iter()
            .filter(|c| !unavailable.contains(*c))
            .cloned()
            .collect())
    }

    fn collection_available(&self, collection: &str) -> bool {
        self.collections.borrow().contains(collection)
            && !self.unavailable.borrow().contains(collection)
    }

    fn create_collection(&self, collection: &str) -> Result<()> {
        if self.unavailable.borrow().contains(collection) || *self.simulate_write_error.borrow() {
            return Err(PresetError::Store(format!(
                "Cannot create collection '{}'",
                collection
            )));
        }
        self.collections.borrow_mut().insert(collection.to_string());
        Ok(())
    }
}
