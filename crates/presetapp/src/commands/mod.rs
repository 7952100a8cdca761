//! # Command Layer
//!
//! This module contains the **business operations** of the preset library. Each
//! command lives in its own submodule and implements plain functions generic
//! over a [`RecordStore`](crate::store::RecordStore).
//!
//! ## Role and Responsibilities
//!
//! Commands are where the real work happens:
//! - Combine store calls with the core (tree building, sort engine, tags)
//! - Keep records, index entries and folders consistent with each other
//! - Return structured `CmdResult` with affected presets and messages
//! - Are completely UI-agnostic
//!
//! ## What Commands Do NOT Do
//!
//! - **Rendering**: no templates, no DOM, no notifications
//! - **User interaction**: no confirmations (return data, the UI decides)
//! - **Optimistic updates**: a failed write returns `Err` and changes nothing
//!   the caller should display
//!
//! ## Structured Returns
//!
//! Commands return [`CmdResult`], not strings. This struct carries:
//! - `affected_presets`: Records that were created or modified
//! - `listed_presets`: Index entries to display
//! - `affected_folders`: Folders that were created or modified
//! - `tree`: A freshly built tree (for `tree::run`)
//! - `tags`: Tag usage counts (for `tagging::list_tags`)
//! - `messages`: Structured messages with levels (info, success, warning, error)
//!
//! ## Failure Policy
//!
//! Read paths (building a tree) log and fall back; write paths propagate
//! their error to the caller.
//!
//! ## Testing Strategy
//!
//! Command tests use `InMemoryStore` to avoid filesystem dependencies and
//! check `CmdResult` contents as well as the store state afterwards.
//!
//! ## Command Modules
//!
//! - [`tree`]: Fetch a collection as a tree, with fallback and stale-entry healing
//! - [`create`]: Capture a new preset
//! - [`update`]: Partial update of one preset
//! - [`delete`]: Delete presets, delete folders
//! - [`folders`]: Create, rename, recolor, re-sort and move folders
//! - [`move_presets`]: Move presets between folders and reorder them
//! - [`tagging`]: Add/remove tags, list tags with counts
//! - [`import`]: Import presets from JSON
//! - [`export`]: Export presets to a `.tar.gz` archive or JSON
//! - [`copy_folder`]: Copy a folder subtree into another collection
//! - [`doctor`]: Verify and fix index consistency
//! - [`helpers`]: Shared utilities (subtree resolution, destination sort values)

use crate::model::{FolderDescriptor, IndexEntry, PresetRecord};
use crate::store::DoctorReport;
use crate::tags::TagCount;
use crate::tree::Tree;
use serde::Serialize;

pub mod copy_folder;
pub mod create;
pub mod delete;
pub mod doctor;
pub mod export;
pub mod folders;
pub mod helpers;
pub mod import;
pub mod move_presets;
pub mod tagging;
pub mod tree;
pub mod update;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CmdResult {
    pub affected_presets: Vec<PresetRecord>,
    pub listed_presets: Vec<IndexEntry>,
    pub affected_folders: Vec<FolderDescriptor>,
    pub tree: Option<Tree>,
    pub tags: Vec<TagCount>,
    pub report: Option<DoctorReport>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_presets(mut self, presets: Vec<PresetRecord>) -> Self {
        self.affected_presets = presets;
        self
    }

    pub fn with_listed_presets(mut self, presets: Vec<IndexEntry>) -> Self {
        self.listed_presets = presets;
        self
    }

    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.tree = Some(tree);
        self
    }

    /// True if any message is an error.
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }
}
