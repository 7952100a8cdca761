//! # Domain Model: Presets, Folders and the Index
//!
//! This module defines the persisted data structures: [`PresetRecord`], [`IndexEntry`]
//! and [`FolderDescriptor`], plus the partial updates that mutate them.
//!
//! ## Records vs Index
//!
//! A preset is stored twice:
//!
//! 1. **Record**: the full document, including the placeable data (often large).
//! 2. **Index Entry**: a denormalized summary (`name`, `img`, `documentName`, `tags`,
//!    `folder`, `sort`) kept per collection so trees can be listed without
//!    loading every record.
//!
//! Every mutation goes through a [`PresetUpdate`], which knows how to apply itself
//! to both representations. This keeps the two in lockstep: a rename touches the
//! record and the index entry in the same call.
//!
//! ## Stale Entries
//!
//! Index entries written by older versions may lack `documentName`. Such entries
//! are *stale* ([`IndexEntry::is_stale`]): the tree builder asks the store to reload
//! the full record and heal the entry before the preset can be placed in a tree.
//!
//! ## Wire Format
//!
//! Everything serializes to JSON with camelCase keys (`documentName`, `addSubtract`,
//! `preSpawnScript`), the format used by the host document store. Fields added
//! over time are `#[serde(default)]` so legacy documents keep loading.
//!
//! ## Document Types
//!
//! `documentName` is a category tag such as `"Token"` or `"Tile"`. The
//! [`SUPPORTED_TYPES`] set lists what the `ALL` type filter shows. `"Bag"` is a
//! container preset, not a placeable, but it is listed with the placeables so that
//! bags stay browsable from the catch-all view.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{PresetError, Result};

/// Sentinel type name meaning "every supported type".
pub const ALL_TYPES: &str = "ALL";

/// Document types shown by the `ALL` filter.
pub static SUPPORTED_TYPES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "Token",
        "MeasuredTemplate",
        "Tile",
        "Drawing",
        "Wall",
        "AmbientLight",
        "AmbientSound",
        "Note",
        "Region",
        "Bag",
    ]
    .into_iter()
    .collect()
});

pub fn default_placeable_types() -> BTreeSet<String> {
    SUPPORTED_TYPES.iter().map(|s| s.to_string()).collect()
}

/// Generates a 16 character record id.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// How a folder orders its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortingMode {
    #[serde(rename = "a")]
    Alphabetical,
    #[default]
    #[serde(rename = "m")]
    Manual,
}

impl FromStr for SortingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "a" => Ok(SortingMode::Alphabetical),
            "m" => Ok(SortingMode::Manual),
            other => Err(format!("Invalid sorting mode: {}", other)),
        }
    }
}

/// Which document types a tree view shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Document(String),
}

impl TypeFilter {
    pub fn document(name: impl Into<String>) -> Self {
        TypeFilter::Document(name.into())
    }

    /// Whether a preset of `document_name` is visible under this filter.
    pub fn admits(&self, document_name: &str, supported: &BTreeSet<String>) -> bool {
        match self {
            TypeFilter::All => supported.contains(document_name),
            TypeFilter::Document(name) => name == document_name,
        }
    }

    /// Whether a folder declaring `types` is visible under this filter.
    pub fn admits_folder(&self, types: &[String]) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Document(name) => types.iter().any(|t| t == ALL_TYPES || t == name),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty type filter".to_string());
        }
        if s == ALL_TYPES {
            Ok(TypeFilter::All)
        } else {
            Ok(TypeFilter::Document(s.to_string()))
        }
    }
}

impl std::fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeFilter::All => write!(f, "{}", ALL_TYPES),
            TypeFilter::Document(name) => write!(f, "{}", name),
        }
    }
}

/// A placeable spawned together with the main preset data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedPlaceable {
    pub document_name: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetRecord {
    pub id: String,
    pub name: String,
    pub document_name: String,
    #[serde(default)]
    pub img: Option<String>,
    /// Placeable data objects. Never empty.
    pub data: Vec<Value>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Field path -> candidate values, one picked at random per spawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub randomize: Option<BTreeMap<String, Vec<Value>>>,
    /// Field path -> numeric delta applied on spawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_subtract: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached: Vec<AttachedPlaceable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_spawn_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_spawn_script: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl PresetRecord {
    /// Creates a record with a fresh id. Fails if `data` is empty.
    pub fn new(
        name: impl Into<String>,
        document_name: impl Into<String>,
        data: Vec<Value>,
    ) -> Result<Self> {
        let now = Utc::now();
        let record = Self {
            id: new_id(),
            name: name.into(),
            document_name: document_name.into(),
            img: None,
            data,
            folder: None,
            sort: 0,
            tags: BTreeSet::new(),
            randomize: None,
            add_subtract: None,
            attached: Vec::new(),
            pre_spawn_script: None,
            post_spawn_script: None,
            created_at: now,
            updated_at: now,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(PresetError::Validation(format!(
                "Preset '{}' has no placeable data",
                self.name
            )));
        }
        if self.document_name.trim().is_empty() {
            return Err(PresetError::Validation(format!(
                "Preset '{}' has no document type",
                self.name
            )));
        }
        Ok(())
    }

    /// Builds the denormalized index entry for this record.
    pub fn index_entry(&self) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            img: self.img.clone(),
            document_name: Some(self.document_name.clone()),
            tags: self.tags.clone(),
            folder: self.folder.clone(),
            sort: self.sort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub sort: i64,
}

impl IndexEntry {
    /// An entry without a document type cannot be placed in a tree until healed.
    pub fn is_stale(&self) -> bool {
        self.document_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    }
}

fn default_folder_types() -> Vec<String> {
    vec![ALL_TYPES.to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Parent folder id.
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub sorting: SortingMode,
    #[serde(default)]
    pub sort: i64,
    /// Document types this folder is meant for.
    #[serde(default = "default_folder_types")]
    pub types: Vec<String>,
}

impl FolderDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            color: None,
            folder: None,
            sorting: SortingMode::default(),
            sort: 0,
            types: default_folder_types(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.folder = Some(parent.into());
        self
    }
}

/// A partial update of a preset. Unset fields are left untouched.
///
/// Double options (`Option<Option<T>>`) distinguish "leave alone" (`None`)
/// from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetUpdate {
    pub name: Option<String>,
    pub img: Option<Option<String>>,
    pub document_name: Option<String>,
    pub data: Option<Vec<Value>>,
    pub folder: Option<Option<String>>,
    pub sort: Option<i64>,
    pub tags: Option<BTreeSet<String>>,
    pub randomize: Option<Option<BTreeMap<String, Vec<Value>>>>,
    pub add_subtract: Option<Option<BTreeMap<String, f64>>>,
    pub attached: Option<Vec<AttachedPlaceable>>,
    pub pre_spawn_script: Option<Option<String>>,
    pub post_spawn_script: Option<Option<String>>,
}

impl PresetUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn img(mut self, img: Option<String>) -> Self {
        self.img = Some(img);
        self
    }

    pub fn data(mut self, data: Vec<Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn folder(mut self, folder: Option<String>) -> Self {
        self.folder = Some(folder);
        self
    }

    pub fn sort(mut self, sort: i64) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn tags(mut self, tags: BTreeSet<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// An update carrying every field the index mirrors, taken from `record`.
    pub fn index_fields_of(record: &PresetRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            img: Some(record.img.clone()),
            document_name: Some(record.document_name.clone()),
            folder: Some(record.folder.clone()),
            sort: Some(record.sort),
            tags: Some(record.tags.clone()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects updates that would leave a record invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(PresetError::Validation("Preset name cannot be empty".into()));
            }
        }
        if let Some(data) = &self.data {
            if data.is_empty() {
                return Err(PresetError::Validation(
                    "Preset data cannot be emptied".into(),
                ));
            }
        }
        if let Some(document_name) = &self.document_name {
            if document_name.trim().is_empty() {
                return Err(PresetError::Validation(
                    "Preset document type cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn apply_to_record(&self, record: &mut PresetRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(img) = &self.img {
            record.img = img.clone();
        }
        if let Some(document_name) = &self.document_name {
            record.document_name = document_name.clone();
        }
        if let Some(data) = &self.data {
            record.data = data.clone();
        }
        if let Some(folder) = &self.folder {
            record.folder = folder.clone();
        }
        if let Some(sort) = self.sort {
            record.sort = sort;
        }
        if let Some(tags) = &self.tags {
            record.tags = tags.clone();
        }
        if let Some(randomize) = &self.randomize {
            record.randomize = randomize.clone();
        }
        if let Some(add_subtract) = &self.add_subtract {
            record.add_subtract = add_subtract.clone();
        }
        if let Some(attached) = &self.attached {
            record.attached = attached.clone();
        }
        if let Some(script) = &self.pre_spawn_script {
            record.pre_spawn_script = script.clone();
        }
        if let Some(script) = &self.post_spawn_script {
            record.post_spawn_script = script.clone();
        }
        record.updated_at = Utc::now();
    }

    /// Applies only the fields the index mirrors.
    pub fn apply_to_index(&self, entry: &mut IndexEntry) {
        if let Some(name) = &self.name {
            entry.name = name.clone();
        }
        if let Some(img) = &self.img {
            entry.img = img.clone();
        }
        if let Some(document_name) = &self.document_name {
            entry.document_name = Some(document_name.clone());
        }
        if let Some(folder) = &self.folder {
            entry.folder = folder.clone();
        }
        if let Some(sort) = self.sort {
            entry.sort = sort;
        }
        if let Some(tags) = &self.tags {
            entry.tags = tags.clone();
        }
    }
}

/// A partial update of a folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub folder: Option<Option<String>>,
    pub sorting: Option<SortingMode>,
    pub sort: Option<i64>,
    pub types: Option<Vec<String>>,
}

impl FolderUpdate {
    pub fn apply(&self, folder: &mut FolderDescriptor) {
        if let Some(name) = &self.name {
            folder.name = name.clone();
        }
        if let Some(color) = &self.color {
            folder.color = color.clone();
        }
        if let Some(parent) = &self.folder {
            folder.folder = parent.clone();
        }
        if let Some(sorting) = self.sorting {
            folder.sorting = sorting;
        }
        if let Some(sort) = self.sort {
            folder.sort = sort;
        }
        if let Some(types) = &self.types {
            folder.types = types.clone();
        }
    }
}
