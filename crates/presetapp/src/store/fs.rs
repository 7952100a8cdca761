use super::fs_backend::FsBackend;
use super::preset_store::PresetStore;
use std::path::{Path, PathBuf};

pub type FileStore = PresetStore<FsBackend>;

impl FileStore {
    /// A store keeping one directory per collection under `root`.
    pub fn new_fs(root: PathBuf) -> Self {
        PresetStore::with_backend(FsBackend::new(root))
    }

    pub fn root(&self) -> &Path {
        self.backend.root()
    }
}
