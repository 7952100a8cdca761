//! # Storage Layer
//!
//! This module defines the storage abstraction for presets. The [`RecordStore`]
//! trait is the one boundary between the core (tree, search, sort) and wherever
//! the documents actually live.
//!
//! ## Records and Index
//!
//! Each collection keeps:
//! 1. **Truth**: full preset records.
//! 2. **Cache**: an index of denormalized entries (`index.json`), one per record,
//!    so a tree can be built without loading every record.
//! 3. **Folders**: the folder descriptors of the collection.
//!
//! The system assumes the index is *always potentially dirty* and self-heals lazily.
//!
//! ## Reconciliation Logic
//!
//! The reconcile pass runs automatically before listing index entries:
//!
//! 1. **Orphan Pruning**: entry `X` in the index but no record `X` → remove the entry (logged).
//! 2. **Entry Rebuild**: record `X` exists but no entry → rebuild the entry from the record.
//!
//! [`RecordStore::doctor`] runs the same pass explicitly and additionally heals
//! *stale* entries (no document type) from their records. During a normal
//! listing stale entries are left for the tree fetch to recover one by one.
//!
//! ## Write Ordering
//!
//! - **Create/Update**: record first, then the index. A crash in between leaves a
//!   record without an up-to-date entry, which the next reconcile rebuilds.
//! - **Delete**: index first, then the record.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: JSON files on disk, one directory per collection.
//! - [`memory::InMemoryStore`]: For testing logic without filesystem I/O.

use crate::error::Result;
use crate::model::{FolderDescriptor, IndexEntry, PresetRecord, PresetUpdate};
use serde::Serialize;

pub mod backend;
pub mod fs;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;
pub mod preset_store;

/// Report from the `doctor` operation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    /// Index entries removed because their record is gone.
    pub pruned_entries: usize,
    /// Index entries recreated from records that had none.
    pub rebuilt_entries: usize,
    /// Stale entries rewritten from their record.
    pub healed_entries: usize,
    /// Records that exist but could not be read.
    pub unreadable_records: usize,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Abstract interface for preset storage.
///
/// Reads take `&self`; writes take `&mut self`. Every method addressing a
/// missing or unreachable collection fails with `CollectionUnavailable`.
pub trait RecordStore {
    fn list_folders(&self, collection: &str) -> Result<Vec<FolderDescriptor>>;

    /// Index entries of a collection, after a lazy reconcile.
    fn list_index_entries(&self, collection: &str) -> Result<Vec<IndexEntry>>;

    fn get_full_record(&self, collection: &str, id: &str) -> Result<PresetRecord>;

    /// Merges the index-mirrored fields of `update` into one entry, creating it
    /// if missing. The record itself is not touched.
    fn write_index_entry(
        &mut self,
        collection: &str,
        id: &str,
        update: &PresetUpdate,
    ) -> Result<IndexEntry>;

    /// Removes one entry. Removing a missing entry is not an error.
    fn delete_index_entry(&mut self, collection: &str, id: &str) -> Result<()>;

    fn create_record(&mut self, collection: &str, record: &PresetRecord) -> Result<()>;

    /// Applies a partial update to the record and its index entry.
    fn update_record(
        &mut self,
        collection: &str,
        id: &str,
        update: &PresetUpdate,
    ) -> Result<PresetRecord>;

    /// Deletes a record and its index entry.
    fn delete_record(&mut self, collection: &str, id: &str) -> Result<()>;

    /// Applies several updates, saving the index once.
    ///
    /// Not atomic: on failure, updates applied before the failing one stay applied.
    fn update_many_records(
        &mut self,
        collection: &str,
        updates: &[(String, PresetUpdate)],
    ) -> Result<Vec<PresetRecord>>;

    /// Creates or replaces a folder.
    fn save_folder(&mut self, collection: &str, folder: &FolderDescriptor) -> Result<()>;

    fn delete_folder(&mut self, collection: &str, id: &str) -> Result<()>;

    /// Creates the collection if it does not exist.
    fn ensure_collection(&mut self, collection: &str) -> Result<()>;

    fn collection_available(&self, collection: &str) -> bool;

    fn list_collections(&self) -> Result<Vec<String>>;

    /// Verify and fix index consistency issues.
    fn doctor(&mut self, collection: &str) -> Result<DoctorReport>;
}
