//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the core. It
//! is the single entry point for preset operations, whatever UI sits on top.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Supplies configuration** (sort stride, tree options, search options)
//!   so callers do not thread it through every call
//! - **Owns per-library state**: the spawn hook registry
//! - **Returns structured types** (`Result<CmdResult>`, `Tree`, `SearchOutcome`)
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs` and the core modules
//! - **View state**: `ExpandedState` and `SearchSession` belong to the view
//!   that displays a tree; the API only creates sessions
//! - **Presentation concerns**: Returns data structures, not strings
//!
//! ## Generic Over RecordStore
//!
//! `PresetsApi<S: RecordStore>` is generic over the storage backend:
//! - Production: `PresetsApi<FileStore>`
//! - Testing: `PresetsApi<InMemoryStore>`

use crate::commands::{self, CmdResult};
use crate::config::PresetsConfig;
use crate::error::Result;
use crate::fileindex::{build_virtual_tree, load_file_index};
use crate::model::{FolderUpdate, PresetUpdate, SortingMode, TypeFilter};
use crate::progress::ProgressTracker;
use crate::search::{parse_query, search_tree, SearchOutcome, SearchSession};
use crate::spawn::{prepare_spawn, SpawnHookRegistry, SpawnOptions, SpawnPlan};
use crate::store::RecordStore;
use crate::tree::{ExpandedState, Tree};
use std::path::Path;

/// The main API facade for preset operations.
pub struct PresetsApi<S: RecordStore> {
    store: S,
    config: PresetsConfig,
    hooks: SpawnHookRegistry,
}

impl<S: RecordStore> PresetsApi<S> {
    pub fn new(store: S, config: PresetsConfig) -> Self {
        Self {
            store,
            config,
            hooks: SpawnHookRegistry::new(),
        }
    }

    pub fn config(&self) -> &PresetsConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn hooks(&self) -> &SpawnHookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut SpawnHookRegistry {
        &mut self.hooks
    }

    fn stride(&self) -> i64 {
        self.config.sort_stride()
    }

    // --- Trees and search ---

    pub fn fetch_tree(
        &mut self,
        collection: &str,
        filter: &TypeFilter,
        expanded: &ExpandedState,
    ) -> Result<CmdResult> {
        commands::tree::run(&mut self.store, collection, filter, expanded, &self.config)
    }

    /// Tree of the file-index cache at `path`, `None` when there is no cache.
    pub fn virtual_tree(&self, path: &Path, filter: &TypeFilter) -> Result<Option<Tree>> {
        let root = load_file_index(path)?;
        Ok(root.map(|root| build_virtual_tree(&root, filter, &self.config.tree_options())))
    }

    /// Runs a query typed by the user against a tree, without debouncing.
    pub fn search(&self, tree: &Tree, text: &str) -> SearchOutcome {
        let (positive, negative) = parse_query(text);
        search_tree(tree, &positive, &negative, &self.config.search_options())
    }

    /// A search-as-you-type session configured from this library's settings.
    pub fn search_session(&self) -> SearchSession {
        SearchSession::new(self.config.search_debounce(), self.config.search_options())
    }

    // --- Presets ---

    pub fn create_preset(
        &mut self,
        collection: &str,
        preset: commands::create::NewPreset,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::create::run(&mut self.store, collection, preset, stride)
    }

    pub fn update_preset(
        &mut self,
        collection: &str,
        id: &str,
        update: PresetUpdate,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::update::run(&mut self.store, collection, id, update, stride)
    }

    pub fn rename_preset(&mut self, collection: &str, id: &str, name: &str) -> Result<CmdResult> {
        commands::update::rename(&mut self.store, collection, id, name)
    }

    pub fn delete_presets(&mut self, collection: &str, ids: &[String]) -> Result<CmdResult> {
        commands::delete::run(&mut self.store, collection, ids)
    }

    pub fn move_presets(
        &mut self,
        collection: &str,
        ids: &[String],
        to: &commands::move_presets::DropTarget,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::move_presets::run(&mut self.store, collection, ids, to, stride)
    }

    pub fn spawn_preset(
        &self,
        collection: &str,
        id: &str,
        options: &SpawnOptions,
    ) -> Result<SpawnPlan> {
        let record = self.store.get_full_record(collection, id)?;
        let mut rng = rand::thread_rng();
        prepare_spawn(&record, options, &self.hooks, &mut rng)
    }

    // --- Folders ---

    pub fn create_folder(
        &mut self,
        collection: &str,
        name: &str,
        parent: Option<&str>,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::folders::create(&mut self.store, collection, name, parent, stride)
    }

    pub fn update_folder(
        &mut self,
        collection: &str,
        id: &str,
        update: &FolderUpdate,
    ) -> Result<CmdResult> {
        commands::folders::update(&mut self.store, collection, id, update)
    }

    pub fn rename_folder(&mut self, collection: &str, id: &str, name: &str) -> Result<CmdResult> {
        commands::folders::rename(&mut self.store, collection, id, name)
    }

    pub fn recolor_folder(
        &mut self,
        collection: &str,
        id: &str,
        color: Option<String>,
    ) -> Result<CmdResult> {
        commands::folders::recolor(&mut self.store, collection, id, color)
    }

    pub fn set_folder_sorting(
        &mut self,
        collection: &str,
        id: &str,
        sorting: SortingMode,
    ) -> Result<CmdResult> {
        commands::folders::set_sorting(&mut self.store, collection, id, sorting)
    }

    pub fn move_folder(
        &mut self,
        collection: &str,
        id: &str,
        parent: Option<&str>,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::folders::move_folder(&mut self.store, collection, id, parent, stride)
    }

    pub fn delete_folder(
        &mut self,
        collection: &str,
        id: &str,
        with_contents: bool,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::delete::delete_folder(&mut self.store, collection, id, with_contents, stride)
    }

    pub fn copy_folder(
        &mut self,
        source: &str,
        folder_id: &str,
        destination: &str,
        parent: Option<&str>,
        tracker: &mut ProgressTracker,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::copy_folder::run(
            &mut self.store,
            source,
            folder_id,
            destination,
            parent,
            tracker,
            stride,
        )
    }

    // --- Tags ---

    pub fn add_tags(&mut self, collection: &str, ids: &[String], tags: &[String]) -> Result<CmdResult> {
        commands::tagging::add_tags(&mut self.store, collection, ids, tags)
    }

    pub fn remove_tags(
        &mut self,
        collection: &str,
        ids: &[String],
        tags: &[String],
    ) -> Result<CmdResult> {
        commands::tagging::remove_tags(&mut self.store, collection, ids, tags)
    }

    pub fn list_tags(&self, collection: &str) -> Result<CmdResult> {
        commands::tagging::list_tags(&self.store, collection)
    }

    // --- Import / export ---

    pub fn import_json(
        &mut self,
        collection: &str,
        json: &str,
        folder: Option<&str>,
        tracker: &mut ProgressTracker,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::import::run(&mut self.store, collection, json, folder, tracker, stride)
    }

    pub fn import_file(
        &mut self,
        collection: &str,
        path: &Path,
        folder: Option<&str>,
        tracker: &mut ProgressTracker,
    ) -> Result<CmdResult> {
        let stride = self.stride();
        commands::import::run_file(&mut self.store, collection, path, folder, tracker, stride)
    }

    pub fn export(
        &self,
        collection: &str,
        folder: Option<&str>,
        format: commands::export::ExportFormat,
        out_dir: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<CmdResult> {
        commands::export::run(&self.store, collection, folder, format, out_dir, tracker)
    }

    // --- Maintenance ---

    pub fn doctor(&mut self, collection: &str) -> Result<CmdResult> {
        commands::doctor::run(&mut self.store, collection)
    }

    pub fn list_collections(&self) -> Result<Vec<String>> {
        self.store.list_collections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create::NewPreset;
    use crate::commands::move_presets::DropTarget;
    use crate::spawn::SpawnOptions;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn make_api() -> PresetsApi<InMemoryStore> {
        PresetsApi::new(
            InMemoryStore::with_collections(&["presets"]),
            PresetsConfig::default(),
        )
    }

    fn create(api: &mut PresetsApi<InMemoryStore>, name: &str, folder: Option<&str>) -> String {
        let mut preset = NewPreset::new(name, "Tile", vec![json!({"x": 100, "y": 100})]);
        preset.folder = folder.map(String::from);
        api.create_preset("presets", preset).unwrap().affected_presets[0]
            .id
            .clone()
    }

    #[test]
    fn test_api_tree_and_search() {
        let mut api = make_api();
        let forest = api.create_folder("presets", "Forest", None).unwrap().affected_folders[0]
            .id
            .clone();
        create(&mut api, "Oak Tree", Some(&forest));
        create(&mut api, "Pine Tree", Some(&forest));
        create(&mut api, "Rock", None);

        let result = api
            .fetch_tree("presets", &TypeFilter::All, &ExpandedState::new())
            .unwrap();
        let tree = result.tree.unwrap();
        assert_eq!(tree.all_presets.len(), 3);

        let outcome = api.search(&tree, "oak");
        assert_eq!(outcome.found, 1);
        assert!(outcome.folder(&forest).render);
        assert!(outcome.folder(&forest).expanded);

        let outcome = api.search(&tree, "tree -pine");
        assert_eq!(outcome.found, 1);
    }

    #[test]
    fn test_api_move_and_delete() {
        let mut api = make_api();
        let a = create(&mut api, "A", None);
        let b = create(&mut api, "B", None);

        api.move_presets("presets", &[b.clone()], &DropTarget::before(None, &a))
            .unwrap();
        let tree = api
            .fetch_tree("presets", &TypeFilter::All, &ExpandedState::new())
            .unwrap()
            .tree
            .unwrap();
        assert!(tree.preset(&b).unwrap().sort < tree.preset(&a).unwrap().sort);

        api.delete_presets("presets", &[a]).unwrap();
        assert_eq!(api.store().list_index_entries("presets").unwrap().len(), 1);
    }

    #[test]
    fn test_api_spawn_runs_hooks() {
        let mut api = make_api();
        let id = create(&mut api, "Rock", None);
        api.hooks_mut()
            .register("lift", "Tile", |plan| {
                for data in plan.data.iter_mut() {
                    data["z"] = json!(5);
                }
                Ok(())
            })
            .unwrap();

        let plan = api
            .spawn_preset("presets", &id, &SpawnOptions::at(0.0, 0.0))
            .unwrap();
        assert_eq!(plan.data[0]["x"], json!(0.0));
        assert_eq!(plan.data[0]["z"], json!(5));
    }

    #[test]
    fn test_api_tags_and_doctor() {
        let mut api = make_api();
        let id = create(&mut api, "Brazier", None);
        api.add_tags("presets", &[id], &["fire".to_string()]).unwrap();
        let tags = api.list_tags("presets").unwrap().tags;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "fire");

        let report = api.doctor("presets").unwrap().report.unwrap();
        assert!(report.is_clean());
        assert_eq!(api.list_collections().unwrap(), vec!["presets"]);
    }

    #[test]
    fn test_api_search_session_uses_config() {
        let api = make_api();
        let session = api.search_session();
        assert_eq!(session.options().found_max_count, 1001);
    }
}
