//! # Context Bootstrap
//!
//! A host opens the preset library once and keeps the returned
//! [`PresetsContext`] for its lifetime.
//!
//! ## Data Directory
//!
//! Collections live under one data directory, resolved in order:
//! 1. An explicit `data_override` passed by the host.
//! 2. The `MASSEDIT_PRESETS_DATA` environment variable (mostly for tests).
//! 3. The OS data directory for the application (via the `directories` crate).
//!
//! ## Configuration Lookup
//!
//! `presets.toml` is read from the data directory and, when the host passes
//! one, from the current world's directory. Both are merged, the world file
//! overriding the global one. A broken config file is logged and ignored; the
//! compiled defaults apply.
//!
//! After loading, the default collection is created if it does not exist yet
//! so the first tree fetch always has somewhere to land.

use crate::api::PresetsApi;
use crate::config::PresetsConfig;
use crate::error::{PresetError, Result};
use crate::store::fs::FileStore;
use crate::store::RecordStore;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "MASSEDIT_PRESETS_DATA";
pub const CONFIG_FILE: &str = "presets.toml";

pub struct PresetsContext {
    pub api: PresetsApi<FileStore>,
    pub config: PresetsConfig,
    pub data_dir: PathBuf,
}

/// Resolves the directory holding every collection.
pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "massedit", "massedit")
        .map(|dirs| dirs.data_dir().join("presets"))
        .ok_or_else(|| PresetError::Api("Could not determine the data directory".into()))
}

/// Loads `presets.toml` from the data directory and the world directory.
pub fn load_config(data_dir: &Path, world_dir: Option<&Path>) -> PresetsConfig {
    let mut search_paths = vec![SearchPath::Path(data_dir.to_path_buf())];
    if let Some(world) = world_dir {
        search_paths.push(SearchPath::Path(world.to_path_buf()));
    }

    let config: PresetsConfig = Clapfig::builder()
        .app_name("massedit")
        .file_name(CONFIG_FILE)
        .search_paths(search_paths)
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid presets config, using defaults");
            PresetsConfig::default()
        });
    config
}

/// Opens the preset library.
pub fn initialize(world_dir: Option<&Path>, data_override: Option<PathBuf>) -> Result<PresetsContext> {
    let data_dir = resolve_data_dir(data_override)?;
    std::fs::create_dir_all(&data_dir)?;
    let config = load_config(&data_dir, world_dir);

    let mut store = FileStore::new_fs(data_dir.clone());
    store.ensure_collection(&config.default_collection)?;
    tracing::debug!(data_dir = %data_dir.display(), collection = %config.default_collection, "preset library opened");

    let api = PresetsApi::new(store, config.clone());
    Ok(PresetsContext {
        api,
        config,
        data_dir,
    })
}
