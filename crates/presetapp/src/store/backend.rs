use crate::error::Result;
use crate::model::{FolderDescriptor, IndexEntry, PresetRecord};
use std::collections::BTreeMap;

/// The index of one collection, keyed by record id.
pub type IndexMap = BTreeMap<String, IndexEntry>;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while PresetStore handles the "what" (business logic, reconcile, doctor).
///
/// Every method addressing an unavailable collection fails with
/// `PresetError::CollectionUnavailable`.
pub trait StorageBackend {
    // --- Index Operations ---

    /// Load the index cache (index.json)
    fn load_index(&self, collection: &str) -> Result<IndexMap>;

    /// Save the index cache
    fn save_index(&self, collection: &str, index: &IndexMap) -> Result<()>;

    // --- Folder Operations ---

    fn load_folders(&self, collection: &str) -> Result<Vec<FolderDescriptor>>;

    fn save_folders(&self, collection: &str, folders: &[FolderDescriptor]) -> Result<()>;

    // --- Record Operations ---

    /// Read a full record.
    /// Returns Ok(None) if the record does not exist (useful for orphan detection).
    /// Returns Err on I/O errors and on records that no longer parse.
    fn read_record(&self, collection: &str, id: &str) -> Result<Option<PresetRecord>>;

    /// Write a full record.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_record(&self, collection: &str, record: &PresetRecord) -> Result<()>;

    /// Delete a record. Deleting a missing record is not an error.
    fn delete_record_data(&self, collection: &str, id: &str) -> Result<()>;

    // --- Discovery ---

    /// List all record ids found in storage (for reconciliation).
    fn list_record_ids(&self, collection: &str) -> Result<Vec<String>>;

    /// Names of the collections that currently exist.
    fn list_collections(&self) -> Result<Vec<String>>;

    // --- Collections ---

    fn collection_available(&self, collection: &str) -> bool;

    /// Create an empty collection. Creating an existing one is a no-op.
    fn create_collection(&self, collection: &str) -> Result<()>;
}
