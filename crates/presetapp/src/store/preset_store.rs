use super::backend::{IndexMap, StorageBackend};
use super::{DoctorReport, RecordStore};
use crate::error::{PresetError, Result};
use crate::model::{FolderDescriptor, IndexEntry, PresetRecord, PresetUpdate};
use std::collections::BTreeSet;

pub struct PresetStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> PresetStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Explicitly synchronize the index with the records.
    /// This is automatically called by list_index_entries, but can be called manually.
    pub fn sync(&self, collection: &str) -> Result<()> {
        self.reconcile(collection, false)?;
        Ok(())
    }

    /// Internal reconciliation logic used by both sync and doctor.
    /// Takes &self because StorageBackend handles internal mutability (or is stateless i/o)
    fn reconcile(&self, collection: &str, heal_stale: bool) -> Result<DoctorReport> {
        if !self.backend.collection_available(collection) {
            return Err(PresetError::CollectionUnavailable(collection.to_string()));
        }

        let mut index = self.backend.load_index(collection)?;
        let record_ids: BTreeSet<String> =
            self.backend.list_record_ids(collection)?.into_iter().collect();
        let mut report = DoctorReport::default();

        // 1. Orphans: entries without a record
        let orphans: Vec<String> = index
            .keys()
            .filter(|id| !record_ids.contains(*id))
            .cloned()
            .collect();
        for id in orphans {
            tracing::warn!(collection = %collection, preset = %id, "pruning orphaned index entry");
            index.remove(&id);
            report.pruned_entries += 1;
        }

        // 2. Records without an entry, and stale entries when healing
        for id in &record_ids {
            let needs_read = match index.get(id) {
                None => true,
                Some(entry) => heal_stale && entry.is_stale(),
            };
            if !needs_read {
                continue;
            }
            match self.backend.read_record(collection, id) {
                Ok(Some(record)) => {
                    if index.insert(id.clone(), record.index_entry()).is_some() {
                        report.healed_entries += 1;
                    } else {
                        tracing::info!(collection = %collection, preset = %id, "rebuilt missing index entry");
                        report.rebuilt_entries += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(collection = %collection, preset = %id, error = %e, "unreadable record");
                    report.unreadable_records += 1;
                }
            }
        }

        if report.pruned_entries + report.rebuilt_entries + report.healed_entries > 0 {
            self.backend.save_index(collection, &index)?;
        }

        Ok(report)
    }

    fn apply_update(
        &self,
        collection: &str,
        index: &mut IndexMap,
        id: &str,
        update: &PresetUpdate,
    ) -> Result<PresetRecord> {
        update.validate()?;
        let mut record = self
            .backend
            .read_record(collection, id)?
            .ok_or_else(|| PresetError::RecordNotFound(id.to_string()))?;
        update.apply_to_record(&mut record);

        // Record first, then index
        self.backend.write_record(collection, &record)?;
        match index.get_mut(id) {
            Some(entry) => update.apply_to_index(entry),
            None => {
                index.insert(id.to_string(), record.index_entry());
            }
        }
        Ok(record)
    }
}

impl<B: StorageBackend> RecordStore for PresetStore<B> {
    fn list_folders(&self, collection: &str) -> Result<Vec<FolderDescriptor>> {
        self.backend.load_folders(collection)
    }

    fn list_index_entries(&self, collection: &str) -> Result<Vec<IndexEntry>> {
        // Sync first, but a failed sync must not hide the entries
        if let Err(e) = self.reconcile(collection, false) {
            tracing::warn!(collection = %collection, error = %e, "index reconcile failed");
        }

        let index = self.backend.load_index(collection)?;
        Ok(index.into_values().collect())
    }

    fn get_full_record(&self, collection: &str, id: &str) -> Result<PresetRecord> {
        self.backend
            .read_record(collection, id)?
            .ok_or_else(|| PresetError::RecordNotFound(id.to_string()))
    }

    fn write_index_entry(
        &mut self,
        collection: &str,
        id: &str,
        update: &PresetUpdate,
    ) -> Result<IndexEntry> {
        let mut index = self.backend.load_index(collection)?;
        let entry = index.entry(id.to_string()).or_insert_with(|| IndexEntry {
            id: id.to_string(),
            name: String::new(),
            img: None,
            document_name: None,
            tags: BTreeSet::new(),
            folder: None,
            sort: 0,
        });
        update.apply_to_index(entry);
        let entry = entry.clone();
        self.backend.save_index(collection, &index)?;
        Ok(entry)
    }

    fn delete_index_entry(&mut self, collection: &str, id: &str) -> Result<()> {
        let mut index = self.backend.load_index(collection)?;
        if index.remove(id).is_some() {
            self.backend.save_index(collection, &index)?;
        }
        Ok(())
    }

    fn create_record(&mut self, collection: &str, record: &PresetRecord) -> Result<()> {
        record.validate()?;
        if self.backend.read_record(collection, &record.id)?.is_some() {
            return Err(PresetError::Validation(format!(
                "Preset {} already exists in {}",
                record.id, collection
            )));
        }

        // 1. Write record FIRST (Atomic) to avoid orphaned entries
        self.backend.write_record(collection, record)?;

        // 2. Update Index
        let mut index = self.backend.load_index(collection)?;
        index.insert(record.id.clone(), record.index_entry());
        self.backend.save_index(collection, &index)?;
        Ok(())
    }

    fn update_record(
        &mut self,
        collection: &str,
        id: &str,
        update: &PresetUpdate,
    ) -> Result<PresetRecord> {
        let mut index = self.backend.load_index(collection)?;
        let record = self.apply_update(collection, &mut index, id, update)?;
        self.backend.save_index(collection, &index)?;
        Ok(record)
    }

    fn delete_record(&mut self, collection: &str, id: &str) -> Result<()> {
        // Index first: a failed record delete leaves a record without entry,
        // which reconcile adopts again rather than losing data.
        let mut index = self.backend.load_index(collection)?;
        let had_entry = index.remove(id).is_some();
        if !had_entry && self.backend.read_record(collection, id)?.is_none() {
            return Err(PresetError::RecordNotFound(id.to_string()));
        }
        if had_entry {
            self.backend.save_index(collection, &index)?;
        }
        self.backend.delete_record_data(collection, id)?;
        Ok(())
    }

    fn update_many_records(
        &mut self,
        collection: &str,
        updates: &[(String, PresetUpdate)],
    ) -> Result<Vec<PresetRecord>> {
        let mut index = self.backend.load_index(collection)?;
        let mut updated = Vec::with_capacity(updates.len());
        for (id, update) in updates {
            match self.apply_update(collection, &mut index, id, update) {
                Ok(record) => updated.push(record),
                Err(e) => {
                    if !updated.is_empty() {
                        self.backend.save_index(collection, &index)?;
                    }
                    return Err(e);
                }
            }
        }
        if !updated.is_empty() {
            self.backend.save_index(collection, &index)?;
        }
        Ok(updated)
    }

    fn save_folder(&mut self, collection: &str, folder: &FolderDescriptor) -> Result<()> {
        if folder.name.trim().is_empty() {
            return Err(PresetError::Validation("Folder name cannot be empty".into()));
        }
        if folder.folder.as_deref() == Some(folder.id.as_str()) {
            return Err(PresetError::Validation(format!(
                "Folder {} cannot be its own parent",
                folder.id
            )));
        }
        let mut folders = self.backend.load_folders(collection)?;
        match folders.iter_mut().find(|f| f.id == folder.id) {
            Some(existing) => *existing = folder.clone(),
            None => folders.push(folder.clone()),
        }
        self.backend.save_folders(collection, &folders)
    }

    fn delete_folder(&mut self, collection: &str, id: &str) -> Result<()> {
        let mut folders = self.backend.load_folders(collection)?;
        let before = folders.len();
        folders.retain(|f| f.id != id);
        if folders.len() == before {
            return Err(PresetError::FolderNotFound(id.to_string()));
        }
        self.backend.save_folders(collection, &folders)
    }

    fn ensure_collection(&mut self, collection: &str) -> Result<()> {
        if !self.backend.collection_available(collection) {
            tracing::info!(collection = %collection, "creating collection");
            self.backend.create_collection(collection)?;
        }
        Ok(())
    }

    fn collection_available(&self, collection: &str) -> bool {
        self.backend.collection_available(collection)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        self.backend.list_collections()
    }

    fn doctor(&mut self, collection: &str) -> Result<DoctorReport> {
        self.reconcile(collection, true)
    }
}
