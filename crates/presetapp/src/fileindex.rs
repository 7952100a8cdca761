//! Virtual folders from the file-index cache.
//!
//! The host can persist a scan of its asset directories as JSON: an array whose
//! single element is a recursive node.
//!
//! ```json
//! [{ "dir": "assets",
//!    "dirs": [{ "dir": "assets/trees", "files": [{ "name": "oak.webp", "tags": ["forest"] }] }],
//!    "files": [{ "name": "theme.ogg" }] }]
//! ```
//!
//! `dir` is the directory's full path. Each directory becomes a read-only
//! folder with uuid `virtual:<path>`; each file becomes a preset whose document
//! type comes from its extension. Files of any other kind are skipped.
//!
//! The resulting [`Tree`] has the same shape as a stored one, so search and the
//! type filter apply unchanged.

use crate::error::{PresetError, Result};
use crate::model::{SortingMode, TypeFilter};
use crate::tree::{sort_tree, FolderNode, PresetNode, Tree, TreeOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Collection name reported by virtual trees.
pub const VIRTUAL_COLLECTION: &str = "virtual";

const IMAGE_EXTENSIONS: &[&str] = &[
    "apng", "avif", "bmp", "gif", "jpeg", "jpg", "png", "svg", "tiff", "webp",
];
const VIDEO_EXTENSIONS: &[&str] = &["m4v", "mp4", "ogv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["aac", "flac", "m4a", "mid", "mp3", "oga", "ogg", "opus", "wav"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexNode {
    pub dir: String,
    #[serde(default)]
    pub dirs: Vec<FileIndexNode>,
    #[serde(default)]
    pub files: Vec<FileIndexFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexFile {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Document type a file spawns as, by extension.
pub fn document_type_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some("Tile")
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some("AmbientSound")
    } else {
        None
    }
}

pub fn virtual_uuid(path: &str) -> String {
    format!("virtual:{}", path)
}

/// Parses the cache file contents. An empty array yields `None`.
pub fn parse_file_index(json: &str) -> Result<Option<FileIndexNode>> {
    let mut nodes: Vec<FileIndexNode> = serde_json::from_str(json)?;
    match nodes.len() {
        0 => Ok(None),
        1 => Ok(nodes.pop()),
        n => Err(PresetError::Validation(format!(
            "File index must hold a single root node, found {}",
            n
        ))),
    }
}

/// Reads and parses a cache file. A missing file yields `None`.
pub fn load_file_index(path: &Path) -> Result<Option<FileIndexNode>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    parse_file_index(&content)
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
}

/// Builds a read-only tree of virtual folders from a file-index root.
///
/// Folders are always alphabetical; `options.root_sorting` is ignored.
pub fn build_virtual_tree(root: &FileIndexNode, filter: &TypeFilter, options: &TreeOptions) -> Tree {
    let mut tree = Tree::empty(VIRTUAL_COLLECTION);
    let mut seen = BTreeSet::new();
    add_dir(&mut tree, root, None, filter, options, &mut seen);
    sort_tree(&mut tree, SortingMode::Alphabetical);
    tree
}

fn add_dir(
    tree: &mut Tree,
    node: &FileIndexNode,
    parent: Option<&str>,
    filter: &TypeFilter,
    options: &TreeOptions,
    seen: &mut BTreeSet<String>,
) {
    let id = virtual_uuid(&node.dir);
    if !seen.insert(id.clone()) {
        tracing::warn!(dir = %node.dir, "directory listed twice in file index, skipping");
        return;
    }

    let folder = FolderNode {
        id: id.clone(),
        uuid: id.clone(),
        name: last_segment(&node.dir).to_string(),
        color: None,
        sorting: SortingMode::Alphabetical,
        sort: 0,
        parent: parent.map(String::from),
        children: Vec::new(),
        presets: Vec::new(),
        visible: true,
        expanded: false,
        is_virtual: true,
    };
    tree.all_folders.insert(id.clone(), folder);
    match parent.and_then(|p| tree.all_folders.get_mut(p)) {
        Some(parent_node) => parent_node.children.push(id.clone()),
        None => tree.folders.push(id.clone()),
    }

    for file in &node.files {
        let Some(document_name) = document_type_for(&file.name) else {
            continue;
        };
        let path = join(&node.dir, &file.name);
        if tree.preset(&path).is_some() {
            continue;
        }
        let img = (document_name == "Tile").then(|| path.clone());
        let visible = filter.admits(document_name, &options.placeable_types);
        if let Some(folder) = tree.all_folders.get_mut(&id) {
            folder.presets.push(path.clone());
        }
        tree.push_preset(PresetNode {
            id: path,
            name: file.name.clone(),
            img,
            document_name: document_name.to_string(),
            tags: file.tags.iter().map(|t| t.trim().to_lowercase()).collect(),
            folder: Some(id.clone()),
            sort: 0,
            visible,
        });
    }

    for child in &node.dirs {
        add_dir(tree, child, Some(&id), filter, options, seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{parse_query, search_tree, SearchOptions};

    const INDEX: &str = r#"[{
        "dir": "assets",
        "dirs": [
            {"dir": "assets/trees", "files": [
                {"name": "Oak.webp", "tags": ["Forest"]},
                {"name": "pine.PNG"},
                {"name": "readme.txt"}
            ]},
            {"dir": "assets/audio", "files": [{"name": "rain.ogg"}]}
        ],
        "files": [{"name": "intro.webm"}]
    }]"#;

    #[test]
    fn test_document_type_for() {
        assert_eq!(document_type_for("a.PNG"), Some("Tile"));
        assert_eq!(document_type_for("clip.mp4"), Some("Tile"));
        assert_eq!(document_type_for("song.mp3"), Some("AmbientSound"));
        assert_eq!(document_type_for("notes.txt"), None);
        assert_eq!(document_type_for("noext"), None);
    }

    #[test]
    fn test_parse_file_index() {
        assert!(parse_file_index("[]").unwrap().is_none());
        assert!(parse_file_index(r#"[{"dir": "a"}, {"dir": "b"}]"#).is_err());
        assert!(parse_file_index("not json").is_err());
        let root = parse_file_index(INDEX).unwrap().unwrap();
        assert_eq!(root.dirs.len(), 2);
    }

    #[test]
    fn test_build_virtual_tree() {
        let root = parse_file_index(INDEX).unwrap().unwrap();
        let tree = build_virtual_tree(&root, &TypeFilter::All, &TreeOptions::default());

        assert_eq!(tree.folders, vec!["virtual:assets".to_string()]);
        let assets = tree.folder("virtual:assets").unwrap();
        assert!(assets.is_virtual);
        assert_eq!(
            assets.children,
            vec!["virtual:assets/audio".to_string(), "virtual:assets/trees".to_string()]
        );
        assert_eq!(assets.presets, vec!["assets/intro.webm".to_string()]);

        let trees = tree.folder("virtual:assets/trees").unwrap();
        assert_eq!(trees.name, "trees");
        assert_eq!(trees.presets.len(), 2);
        let oak = tree.preset("assets/trees/Oak.webp").unwrap();
        assert_eq!(oak.document_name, "Tile");
        assert_eq!(oak.img.as_deref(), Some("assets/trees/Oak.webp"));
        assert!(oak.tags.contains("forest"));

        let rain = tree.preset("assets/audio/rain.ogg").unwrap();
        assert_eq!(rain.document_name, "AmbientSound");
        assert!(rain.img.is_none());
        assert_eq!(tree.all_presets.len(), 4);
    }

    #[test]
    fn test_virtual_tree_filter_and_search() {
        let root = parse_file_index(INDEX).unwrap().unwrap();
        let tree = build_virtual_tree(
            &root,
            &TypeFilter::document("AmbientSound"),
            &TreeOptions::default(),
        );
        assert!(!tree.preset("assets/trees/Oak.webp").unwrap().visible);
        assert!(tree.preset("assets/audio/rain.ogg").unwrap().visible);

        let tree = build_virtual_tree(&root, &TypeFilter::All, &TreeOptions::default());
        let (pos, neg) = parse_query("#forest");
        let outcome = search_tree(&tree, &pos, &neg, &SearchOptions::default());
        assert_eq!(outcome.found, 1);
        assert!(outcome.folder("virtual:assets/trees").expanded);
        assert!(!outcome.folder("virtual:assets/audio").render);
    }

    #[test]
    fn test_load_missing_file_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file_index(&dir.path().join("nope.json")).unwrap().is_none());
        let path = dir.path().join("index.json");
        std::fs::write(&path, INDEX).unwrap();
        assert!(load_file_index(&path).unwrap().is_some());
    }
}
