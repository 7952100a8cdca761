use super::backend::{IndexMap, StorageBackend};
use crate::error::{PresetError, Result};
use crate::model::{FolderDescriptor, PresetRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const INDEX_FILE: &str = "index.json";
const FOLDERS_FILE: &str = "folders.json";
const RECORDS_DIR: &str = "records";

/// Filesystem backend: one directory per collection.
///
/// ```text
/// <root>/
/// └── <collection>/
///     ├── index.json          # IndexMap
///     ├── folders.json        # Vec<FolderDescriptor>
///     └── records/<id>.json   # PresetRecord
/// ```
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        validate_name(collection, "collection")?;
        Ok(self.root.join(collection))
    }

    fn existing_collection_dir(&self, collection: &str) -> Result<PathBuf> {
        let dir = self.collection_dir(collection)?;
        if !dir.is_dir() {
            return Err(PresetError::CollectionUnavailable(collection.to_string()));
        }
        Ok(dir)
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf> {
        validate_name(id, "record id")?;
        Ok(self
            .existing_collection_dir(collection)?
            .join(RECORDS_DIR)
            .join(format!("{}.json", id)))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(PresetError::Io)?;
        }
        Ok(())
    }
}

/// Rejects names that would escape the root or collide with hidden files.
fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..")
    {
        return Err(PresetError::Validation(format!(
            "Invalid {} name: '{}'",
            what, name
        )));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).map_err(PresetError::Io)?;
    serde_json::from_str(&content).map_err(PresetError::Serialization)
}

/// Atomic write: tmp file in the same directory, then rename.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| PresetError::Store(format!("No parent for {}", path.display())))?;
    let content = serde_json::to_string_pretty(value).map_err(PresetError::Serialization)?;
    let tmp = dir.join(format!(".write-{}.tmp", Uuid::new_v4()));
    let written = fs::write(&tmp, content).and_then(|_| fs::rename(&tmp, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(PresetError::Io(err));
    }
    Ok(())
}

impl StorageBackend for FsBackend {
    fn load_index(&self, collection: &str) -> Result<IndexMap> {
        let dir = self.existing_collection_dir(collection)?;
        read_json(&dir.join(INDEX_FILE))
    }

    fn save_index(&self, collection: &str, index: &IndexMap) -> Result<()> {
        let dir = self.existing_collection_dir(collection)?;
        write_json(&dir.join(INDEX_FILE), index)
    }

    fn load_folders(&self, collection: &str) -> Result<Vec<FolderDescriptor>> {
        let dir = self.existing_collection_dir(collection)?;
        read_json(&dir.join(FOLDERS_FILE))
    }

    fn save_folders(&self, collection: &str, folders: &[FolderDescriptor]) -> Result<()> {
        let dir = self.existing_collection_dir(collection)?;
        write_json(&dir.join(FOLDERS_FILE), folders)
    }

    fn read_record(&self, collection: &str, id: &str) -> Result<Option<PresetRecord>> {
        let path = self.record_path(collection, id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(PresetError::Io)?;
        let record = serde_json::from_str(&content).map_err(PresetError::Serialization)?;
        Ok(Some(record))
    }

    fn write_record(&self, collection: &str, record: &PresetRecord) -> Result<()> {
        let path = self.record_path(collection, &record.id)?;
        if let Some(dir) = path.parent() {
            self.ensure_dir(dir)?;
        }
        write_json(&path, record)
    }

    fn delete_record_data(&self, collection: &str, id: &str) -> Result<()> {
        let path = self.record_path(collection, id)?;
        if path.exists() {
            fs::remove_file(path).map_err(PresetError::Io)?;
        }
        Ok(())
    }

    fn list_record_ids(&self, collection: &str) -> Result<Vec<String>> {
        let dir = self.existing_collection_dir(collection)?.join(RECORDS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir).map_err(PresetError::Io)? {
            let path = entry.map_err(PresetError::Io)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(PresetError::Io)? {
            let path = entry.map_err(PresetError::Io)?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn collection_available(&self, collection: &str) -> bool {
        self.existing_collection_dir(collection).is_ok()
    }

    fn create_collection(&self, collection: &str) -> Result<()> {
        let dir = self.collection_dir(collection)?;
        self.ensure_dir(&dir.join(RECORDS_DIR))
    }
}
