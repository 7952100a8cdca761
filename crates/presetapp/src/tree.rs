//! # Tree Builder: From Flat Listings to a Folder Hierarchy
//!
//! The store hands back two flat lists per collection: folder descriptors and
//! preset index entries. Browsing needs a hierarchy, with every folder's contents
//! in the folder's own sort order and a visibility flag per node for the current
//! type filter.
//!
//! ## Arena Layout
//!
//! A [`Tree`] owns its nodes in two flat collections (`all_folders`, `all_presets`).
//! Folders and the root reference their contents by id:
//!
//! ```text
//! Tree
//! ├── folders:  ["1"]                  top-level folder ids, sorted
//! ├── presets:  ["b"]                  top-level preset ids, sorted
//! ├── all_folders: { "1": Forest { children: ["2"] },
//! │                  "2": Cave   { presets:  ["a"] } }
//! └── all_presets: [Tree(a), Rock(b)]
//! ```
//!
//! Each folder id appears in exactly one `children` list (or the root list) and
//! each preset id in exactly one `presets` list (or the root list).
//!
//! ## Integrity Rules
//!
//! - A folder whose parent does not exist, or whose ancestry loops, is dropped
//!   and logged. Its descendants are dropped with it.
//! - A preset pointing at a missing or dropped folder lands at the top level.
//! - A *stale* entry (no document type) gets one recovery attempt through the
//!   caller-supplied callback; if that fails it is left out silently.
//!
//! Nothing here raises: a broken listing still renders, minus the broken parts.
//!
//! ## Visibility
//!
//! Presets are visible when the [`TypeFilter`] admits their document type.
//! Folders carry their own `types` and are judged independently of their
//! contents.

use crate::model::{
    default_placeable_types, FolderDescriptor, IndexEntry, SortingMode, TypeFilter,
};
use crate::sort::natural_cmp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Options that shape every tree built for a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Ordering of the top-level folders and presets.
    pub root_sorting: SortingMode,
    /// Document types shown by the `ALL` filter.
    pub placeable_types: BTreeSet<String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            root_sorting: SortingMode::Alphabetical,
            placeable_types: default_placeable_types(),
        }
    }
}

/// Open/closed state of folders, keyed by folder uuid.
///
/// Owned by the view that displays the tree; created when the view opens,
/// dropped or [`reset`](ExpandedState::reset) when it closes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedState {
    open: BTreeSet<String>,
}

impl ExpandedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, uuid: &str) -> bool {
        self.open.contains(uuid)
    }

    pub fn set_expanded(&mut self, uuid: impl Into<String>, expanded: bool) {
        let uuid = uuid.into();
        if expanded {
            self.open.insert(uuid);
        } else {
            self.open.remove(&uuid);
        }
    }

    /// Flips the state and returns the new value.
    pub fn toggle(&mut self, uuid: &str) -> bool {
        if self.open.remove(uuid) {
            false
        } else {
            self.open.insert(uuid.to_string());
            true
        }
    }

    pub fn reset(&mut self) {
        self.open.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub color: Option<String>,
    pub sorting: SortingMode,
    pub sort: i64,
    /// Parent folder id, `None` at the top level.
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub presets: Vec<String>,
    pub visible: bool,
    pub expanded: bool,
    /// Synthesized read-only folder (file index, foreign pack).
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
}

impl FolderNode {
    pub fn from_descriptor(collection: &str, folder: &FolderDescriptor) -> Self {
        Self {
            id: folder.id.clone(),
            uuid: folder_uuid(collection, &folder.id),
            name: folder.name.clone(),
            color: folder.color.clone(),
            sorting: folder.sorting,
            sort: folder.sort,
            parent: None,
            children: Vec::new(),
            presets: Vec::new(),
            visible: true,
            expanded: false,
            is_virtual: false,
        }
    }
}

/// Global locator of a stored folder.
pub fn folder_uuid(collection: &str, id: &str) -> String {
    format!("{}.Folder.{}", collection, id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetNode {
    pub id: String,
    pub name: String,
    pub img: Option<String>,
    pub document_name: String,
    pub tags: BTreeSet<String>,
    /// The folder the preset was placed in, `None` at the top level.
    pub folder: Option<String>,
    pub sort: i64,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub collection: String,
    /// Top-level folder ids, sorted.
    pub folders: Vec<String>,
    /// Top-level preset ids, sorted.
    pub presets: Vec<String>,
    pub all_presets: Vec<PresetNode>,
    pub all_folders: HashMap<String, FolderNode>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl Tree {
    pub fn empty(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    pub fn folder(&self, id: &str) -> Option<&FolderNode> {
        self.all_folders.get(id)
    }

    pub fn preset(&self, id: &str) -> Option<&PresetNode> {
        self.lookup.get(id).map(|&i| &self.all_presets[i])
    }

    /// Child folder ids and preset ids of a folder, or of the root for `None`.
    pub fn contents(&self, folder: Option<&str>) -> (&[String], &[String]) {
        match folder {
            None => (self.folders.as_slice(), self.presets.as_slice()),
            Some(id) => match self.all_folders.get(id) {
                Some(node) => (node.children.as_slice(), node.presets.as_slice()),
                None => (&[][..], &[][..]),
            },
        }
    }

    /// Ancestors of a folder from the top level down, the folder itself included.
    pub fn folder_path(&self, id: &str) -> Vec<&FolderNode> {
        let mut path = Vec::new();
        let mut current = self.all_folders.get(id);
        while let Some(node) = current {
            path.push(node);
            current = node.parent.as_deref().and_then(|p| self.all_folders.get(p));
        }
        path.reverse();
        path
    }

    /// The folder and every folder below it, parents before children.
    pub fn subtree_folders(&self, id: &str) -> Vec<&FolderNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.all_folders.get(current) {
                out.push(node);
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Every preset stored in the folder or below it, in tree order.
    pub fn subtree_presets(&self, id: &str) -> Vec<&PresetNode> {
        self.subtree_folders(id)
            .into_iter()
            .flat_map(|folder| folder.presets.iter())
            .filter_map(|pid| self.preset(pid))
            .collect()
    }

    /// True when `candidate` is `ancestor` or sits below it.
    pub fn is_within(&self, candidate: &str, ancestor: &str) -> bool {
        self.folder_path(candidate)
            .iter()
            .any(|node| node.id == ancestor)
    }

    pub(crate) fn push_preset(&mut self, node: PresetNode) {
        self.lookup.insert(node.id.clone(), self.all_presets.len());
        self.all_presets.push(node);
    }
}

/// Builds trees for one collection and filter.
pub struct TreeBuilder<'a> {
    collection: &'a str,
    filter: &'a TypeFilter,
    options: &'a TreeOptions,
    expanded: Option<&'a ExpandedState>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(collection: &'a str, filter: &'a TypeFilter, options: &'a TreeOptions) -> Self {
        Self {
            collection,
            filter,
            options,
            expanded: None,
        }
    }

    pub fn expanded(mut self, state: &'a ExpandedState) -> Self {
        self.expanded = Some(state);
        self
    }

    /// Builds the tree. `recover` is called at most once per stale entry and
    /// returns the document type it could recover, if any.
    pub fn build<F>(&self, folders: &[FolderDescriptor], entries: Vec<IndexEntry>, mut recover: F) -> Tree
    where
        F: FnMut(&IndexEntry) -> Option<String>,
    {
        let mut tree = Tree::empty(self.collection);
        let kept = resolvable_folders(folders);

        for folder in folders {
            if !kept.contains(folder.id.as_str()) || tree.all_folders.contains_key(&folder.id) {
                continue;
            }
            let mut node = FolderNode::from_descriptor(self.collection, folder);
            node.parent = folder.folder.clone();
            node.visible = self.filter.admits_folder(&folder.types);
            node.expanded = self
                .expanded
                .is_some_and(|state| state.is_expanded(&node.uuid));
            tree.all_folders.insert(node.id.clone(), node);
        }

        let ids: Vec<String> = tree.all_folders.keys().cloned().collect();
        for id in ids {
            match tree.all_folders[&id].parent.clone() {
                Some(parent) => {
                    if let Some(parent_node) = tree.all_folders.get_mut(&parent) {
                        parent_node.children.push(id);
                    }
                }
                None => tree.folders.push(id),
            }
        }

        let mut seen = HashSet::new();
        for entry in entries {
            if !seen.insert(entry.id.clone()) {
                tracing::warn!(preset = %entry.id, "duplicate index entry, keeping the first");
                continue;
            }

            let document_name = if entry.is_stale() {
                match recover(&entry) {
                    Some(name) if !name.trim().is_empty() => name,
                    _ => {
                        tracing::debug!(preset = %entry.id, "stale index entry excluded");
                        continue;
                    }
                }
            } else {
                entry.document_name.clone().unwrap_or_default()
            };

            let folder = entry
                .folder
                .clone()
                .filter(|f| tree.all_folders.contains_key(f));
            if folder.is_none() && entry.folder.is_some() {
                tracing::debug!(preset = %entry.id, "unresolved folder, placing at top level");
            }

            match &folder {
                Some(f) => {
                    if let Some(node) = tree.all_folders.get_mut(f) {
                        node.presets.push(entry.id.clone());
                    }
                }
                None => tree.presets.push(entry.id.clone()),
            }

            let visible = self
                .filter
                .admits(&document_name, &self.options.placeable_types);
            tree.push_preset(PresetNode {
                id: entry.id,
                name: entry.name,
                img: entry.img,
                document_name,
                tags: entry.tags,
                folder,
                sort: entry.sort,
                visible,
            });
        }

        sort_tree(&mut tree, self.options.root_sorting);
        tree
    }
}

/// Builds a tree without stale-entry recovery.
pub fn build_tree(
    collection: &str,
    folders: &[FolderDescriptor],
    entries: Vec<IndexEntry>,
    filter: &TypeFilter,
    options: &TreeOptions,
) -> Tree {
    TreeBuilder::new(collection, filter, options).build(folders, entries, |_| None)
}

/// Ids of folders whose ancestry reaches the top level.
fn resolvable_folders(folders: &[FolderDescriptor]) -> HashSet<&str> {
    let parents: HashMap<&str, Option<&str>> = folders
        .iter()
        .map(|f| (f.id.as_str(), f.folder.as_deref()))
        .collect();
    let mut status: HashMap<&str, bool> = HashMap::new();

    for folder in folders {
        let mut path: Vec<&str> = Vec::new();
        let mut current = folder.id.as_str();
        let ok = loop {
            if let Some(&known) = status.get(current) {
                break known;
            }
            if path.contains(&current) {
                tracing::warn!(folder = %current, "folder ancestry loops, dropping");
                break false;
            }
            path.push(current);
            match parents.get(current) {
                Some(&Some(parent)) => current = parent,
                Some(&None) => break true,
                None => {
                    tracing::warn!(
                        folder = %path.first().copied().unwrap_or_default(),
                        parent = %current,
                        "folder parent does not exist, dropping"
                    );
                    break false;
                }
            }
        };
        for id in path {
            if parents.contains_key(id) {
                status.insert(id, ok);
            }
        }
    }

    status
        .into_iter()
        .filter_map(|(id, ok)| ok.then_some(id))
        .collect()
}

pub(crate) fn sort_tree(tree: &mut Tree, root_sorting: SortingMode) {
    let mut root_folders = std::mem::take(&mut tree.folders);
    sort_folder_ids(&mut root_folders, root_sorting, &tree.all_folders);
    tree.folders = root_folders;

    let mut root_presets = std::mem::take(&mut tree.presets);
    sort_preset_ids(&mut root_presets, root_sorting, tree);
    tree.presets = root_presets;

    let ids: Vec<String> = tree.all_folders.keys().cloned().collect();
    for id in ids {
        let (mode, mut children, mut presets) = match tree.all_folders.get_mut(&id) {
            Some(node) => (
                node.sorting,
                std::mem::take(&mut node.children),
                std::mem::take(&mut node.presets),
            ),
            None => continue,
        };
        sort_folder_ids(&mut children, mode, &tree.all_folders);
        sort_preset_ids(&mut presets, mode, tree);
        if let Some(node) = tree.all_folders.get_mut(&id) {
            node.children = children;
            node.presets = presets;
        }
    }
}

fn compare_entries(
    mode: SortingMode,
    (a_name, a_sort, a_id): (&str, i64, &str),
    (b_name, b_sort, b_id): (&str, i64, &str),
) -> Ordering {
    match mode {
        SortingMode::Alphabetical => natural_cmp(a_name, b_name).then_with(|| a_id.cmp(b_id)),
        SortingMode::Manual => a_sort
            .cmp(&b_sort)
            .then_with(|| natural_cmp(a_name, b_name))
            .then_with(|| a_id.cmp(b_id)),
    }
}

fn sort_folder_ids(ids: &mut [String], mode: SortingMode, folders: &HashMap<String, FolderNode>) {
    ids.sort_by(|a, b| match (folders.get(a), folders.get(b)) {
        (Some(fa), Some(fb)) => compare_entries(
            mode,
            (&fa.name, fa.sort, &fa.id),
            (&fb.name, fb.sort, &fb.id),
        ),
        _ => a.cmp(b),
    });
}

fn sort_preset_ids(ids: &mut [String], mode: SortingMode, tree: &Tree) {
    ids.sort_by(|a, b| match (tree.preset(a), tree.preset(b)) {
        (Some(pa), Some(pb)) => compare_entries(
            mode,
            (&pa.name, pa.sort, &pa.id),
            (&pb.name, pb.sort, &pb.id),
        ),
        _ => a.cmp(b),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, name: &str, parent: Option<&str>) -> FolderDescriptor {
        FolderDescriptor {
            id: id.into(),
            name: name.into(),
            color: None,
            folder: parent.map(String::from),
            sorting: SortingMode::Alphabetical,
            sort: 0,
            types: vec!["ALL".into()],
        }
    }

    fn entry(id: &str, name: &str, doc: &str, folder: Option<&str>) -> IndexEntry {
        IndexEntry {
            id: id.into(),
            name: name.into(),
            img: None,
            document_name: Some(doc.into()),
            tags: BTreeSet::new(),
            folder: folder.map(String::from),
            sort: 0,
        }
    }

    fn names(tree: &Tree, ids: &[String]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                tree.folder(id)
                    .map(|f| f.name.clone())
                    .or_else(|| tree.preset(id).map(|p| p.name.clone()))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_nested_folders_and_top_level_presets() {
        let folders = vec![folder("1", "Forest", None), folder("2", "Cave", Some("1"))];
        let entries = vec![
            entry("a", "Tree", "Tile", Some("2")),
            entry("b", "Rock", "Tile", None),
        ];
        let tree = build_tree(
            "world",
            &folders,
            entries,
            &TypeFilter::All,
            &TreeOptions::default(),
        );

        assert_eq!(names(&tree, &tree.folders), vec!["Forest"]);
        let forest = tree.folder("1").unwrap();
        assert_eq!(names(&tree, &forest.children), vec!["Cave"]);
        let cave = tree.folder("2").unwrap();
        assert_eq!(cave.parent.as_deref(), Some("1"));
        assert_eq!(names(&tree, &cave.presets), vec!["Tree"]);
        assert_eq!(names(&tree, &tree.presets), vec!["Rock"]);
        assert_eq!(tree.all_presets.len(), 2);
        assert_eq!(cave.uuid, "world.Folder.2");
    }

    #[test]
    fn test_every_preset_placed_exactly_once() {
        let folders = vec![
            folder("1", "A", None),
            folder("2", "B", Some("1")),
            folder("3", "C", Some("2")),
            folder("4", "D", None),
        ];
        let parents = [None, Some("1"), Some("2"), Some("3"), Some("4")];
        let entries: Vec<IndexEntry> = (0..25)
            .map(|i| {
                entry(
                    &format!("p{}", i),
                    &format!("Preset {}", i),
                    "Token",
                    parents[i % parents.len()],
                )
            })
            .collect();
        let tree = build_tree("c", &folders, entries, &TypeFilter::All, &TreeOptions::default());

        assert_eq!(tree.all_presets.len(), 25);
        let mut placed: Vec<&String> = tree.presets.iter().collect();
        for node in tree.all_folders.values() {
            placed.extend(node.presets.iter());
        }
        assert_eq!(placed.len(), 25);
        let unique: HashSet<&String> = placed.into_iter().collect();
        assert_eq!(unique.len(), 25);

        let mut folder_refs: Vec<&String> = tree.folders.iter().collect();
        for node in tree.all_folders.values() {
            folder_refs.extend(node.children.iter());
        }
        assert_eq!(folder_refs.len(), tree.all_folders.len());
    }

    #[test]
    fn test_alphabetical_sorting_is_natural() {
        let folders = vec![folder("1", "Walls", None)];
        let entries = vec![
            entry("a", "Wall 10", "Wall", Some("1")),
            entry("b", "wall 2", "Wall", Some("1")),
            entry("c", "Wall 1", "Wall", Some("1")),
            entry("d", "Arch", "Wall", Some("1")),
        ];
        let tree = build_tree("c", &folders, entries, &TypeFilter::All, &TreeOptions::default());
        let walls = tree.folder("1").unwrap();
        assert_eq!(
            names(&tree, &walls.presets),
            vec!["Arch", "Wall 1", "wall 2", "Wall 10"]
        );
        for pair in walls.presets.windows(2) {
            let a = tree.preset(&pair[0]).unwrap();
            let b = tree.preset(&pair[1]).unwrap();
            assert_ne!(natural_cmp(&a.name, &b.name), Ordering::Greater);
        }
    }

    #[test]
    fn test_manual_sorting_per_folder() {
        let mut manual = folder("1", "Manual", None);
        manual.sorting = SortingMode::Manual;
        let alpha = folder("2", "Alpha", Some("1"));
        let mut a = entry("a", "Zed", "Tile", Some("1"));
        a.sort = 10;
        let mut b = entry("b", "Abe", "Tile", Some("1"));
        b.sort = 20;
        let mut c = entry("c", "Zed", "Tile", Some("2"));
        c.sort = 1;
        let mut d = entry("d", "Abe", "Tile", Some("2"));
        d.sort = 2;

        let tree = build_tree(
            "c",
            &[manual, alpha],
            vec![a, b, c, d],
            &TypeFilter::All,
            &TreeOptions::default(),
        );
        assert_eq!(names(&tree, &tree.folder("1").unwrap().presets), vec!["Zed", "Abe"]);
        // Child folder keeps its own alphabetical mode.
        assert_eq!(names(&tree, &tree.folder("2").unwrap().presets), vec!["Abe", "Zed"]);
    }

    #[test]
    fn test_root_sorting_option() {
        let mut first = entry("a", "Zed", "Tile", None);
        first.sort = 1;
        let mut second = entry("b", "Abe", "Tile", None);
        second.sort = 2;
        let options = TreeOptions {
            root_sorting: SortingMode::Manual,
            ..Default::default()
        };
        let tree = build_tree("c", &[], vec![first, second], &TypeFilter::All, &options);
        assert_eq!(names(&tree, &tree.presets), vec!["Zed", "Abe"]);
    }

    #[test]
    fn test_dangling_parent_drops_folder_and_descendants() {
        let folders = vec![
            folder("1", "Orphan", Some("missing")),
            folder("2", "Below Orphan", Some("1")),
            folder("3", "Fine", None),
        ];
        let entries = vec![entry("a", "Lost", "Tile", Some("2"))];
        let tree = build_tree("c", &folders, entries, &TypeFilter::All, &TreeOptions::default());

        assert_eq!(tree.all_folders.len(), 1);
        assert!(tree.folder("3").is_some());
        assert_eq!(tree.presets, vec!["a".to_string()]);
        assert_eq!(tree.preset("a").unwrap().folder, None);
    }

    #[test]
    fn test_cyclic_folders_dropped() {
        let folders = vec![
            folder("1", "Loop A", Some("2")),
            folder("2", "Loop B", Some("1")),
            folder("3", "Fine", None),
        ];
        let tree = build_tree("c", &folders, Vec::new(), &TypeFilter::All, &TreeOptions::default());
        assert_eq!(tree.folders, vec!["3".to_string()]);
        assert_eq!(tree.all_folders.len(), 1);
    }

    #[test]
    fn test_stale_entry_recovered_once() {
        let mut stale = entry("a", "Old", "Tile", None);
        stale.document_name = None;
        let mut calls = 0;
        let tree = TreeBuilder::new("c", &TypeFilter::All, &TreeOptions::default()).build(
            &[],
            vec![stale],
            |e| {
                calls += 1;
                assert_eq!(e.id, "a");
                Some("Tile".to_string())
            },
        );
        assert_eq!(calls, 1);
        assert_eq!(tree.preset("a").unwrap().document_name, "Tile");
        assert!(tree.preset("a").unwrap().visible);
    }

    #[test]
    fn test_unrecoverable_stale_entry_excluded() {
        let mut stale = entry("a", "Old", "Tile", None);
        stale.document_name = None;
        let tree = TreeBuilder::new("c", &TypeFilter::All, &TreeOptions::default()).build(
            &[],
            vec![stale, entry("b", "New", "Tile", None)],
            |_| None,
        );
        assert!(tree.preset("a").is_none());
        assert_eq!(tree.presets, vec!["b".to_string()]);
        assert_eq!(tree.all_presets.len(), 1);
    }

    #[test]
    fn test_type_filter_visibility() {
        let entries = vec![
            entry("a", "Goblin", "Token", None),
            entry("b", "Floor", "Tile", None),
            entry("c", "Hero", "Actor", None),
        ];
        let all = build_tree("c", &[], entries.clone(), &TypeFilter::All, &TreeOptions::default());
        assert!(all.preset("a").unwrap().visible);
        assert!(all.preset("b").unwrap().visible);
        assert!(!all.preset("c").unwrap().visible);

        let tiles = build_tree(
            "c",
            &[],
            entries,
            &TypeFilter::document("Tile"),
            &TreeOptions::default(),
        );
        assert!(!tiles.preset("a").unwrap().visible);
        assert!(tiles.preset("b").unwrap().visible);
        assert_eq!(tiles.all_presets.len(), 3);
    }

    #[test]
    fn test_folder_visibility_is_independent() {
        let mut tokens_only = folder("1", "Tokens", None);
        tokens_only.types = vec!["Token".into()];
        let entries = vec![entry("a", "Floor", "Tile", Some("1"))];
        let tree = build_tree(
            "c",
            &[tokens_only],
            entries,
            &TypeFilter::document("Tile"),
            &TreeOptions::default(),
        );
        assert!(!tree.folder("1").unwrap().visible);
        assert!(tree.preset("a").unwrap().visible);
    }

    #[test]
    fn test_expanded_state_applied() {
        let folders = vec![folder("1", "Open", None), folder("2", "Closed", None)];
        let mut state = ExpandedState::new();
        state.set_expanded(folder_uuid("c", "1"), true);
        let filter = TypeFilter::All;
        let options = TreeOptions::default();
        let tree = TreeBuilder::new("c", &filter, &options)
            .expanded(&state)
            .build(&folders, Vec::new(), |_| None);
        assert!(tree.folder("1").unwrap().expanded);
        assert!(!tree.folder("2").unwrap().expanded);
    }

    #[test]
    fn test_expanded_state_toggle_and_reset() {
        let mut state = ExpandedState::new();
        assert!(state.toggle("u1"));
        assert!(state.is_expanded("u1"));
        assert!(!state.toggle("u1"));
        state.set_expanded("u2", true);
        state.reset();
        assert!(!state.is_expanded("u2"));
    }

    #[test]
    fn test_subtree_helpers() {
        let folders = vec![
            folder("1", "Forest", None),
            folder("2", "Cave", Some("1")),
            folder("3", "Lake", None),
        ];
        let entries = vec![
            entry("a", "Tree", "Tile", Some("1")),
            entry("b", "Bat", "Token", Some("2")),
            entry("c", "Fish", "Token", Some("3")),
        ];
        let tree = build_tree("c", &folders, entries, &TypeFilter::All, &TreeOptions::default());

        let subtree: Vec<&str> = tree
            .subtree_folders("1")
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(subtree, vec!["1", "2"]);
        let presets: Vec<&str> = tree
            .subtree_presets("1")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(presets, vec!["Tree", "Bat"]);
        assert!(tree.is_within("2", "1"));
        assert!(!tree.is_within("3", "1"));
        let path: Vec<&str> = tree.folder_path("2").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(path, vec!["Forest", "Cave"]);
        let (child_folders, child_presets) = tree.contents(Some("1"));
        assert_eq!(child_folders, &["2".to_string()]);
        assert_eq!(child_presets, &["a".to_string()]);
        assert_eq!(tree.contents(Some("nope")).0.len(), 0);
    }

    #[test]
    fn test_tree_serializes_for_views() {
        let folders = vec![folder("1", "Forest", None)];
        let tree = build_tree(
            "c",
            &folders,
            vec![entry("a", "Tree", "Tile", Some("1"))],
            &TypeFilter::All,
            &TreeOptions::default(),
        );
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["allFolders"]["1"]["virtual"], false);
        assert_eq!(json["allPresets"][0]["documentName"], "Tile");
        assert!(json.get("lookup").is_none());
    }
}
