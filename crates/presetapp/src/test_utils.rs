use crate::api::PresetsApi;
use crate::config::PresetsConfig;
use crate::store::fs::FileStore;
use crate::store::RecordStore;
use std::path::PathBuf;
use tempfile::TempDir;

/// A file-backed store in a temporary directory with the default collection created.
pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: FileStore,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let mut store = FileStore::new_fs(root.clone());
        store
            .ensure_collection("presets")
            .expect("failed to create collection");
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }

    /// A second store over the same directory, as another view would see it.
    pub fn reopen(&self) -> FileStore {
        FileStore::new_fs(self.root.clone())
    }

    pub fn api(&self) -> PresetsApi<FileStore> {
        PresetsApi::new(self.reopen(), PresetsConfig::default())
    }
}
