//! # presetapp
//!
//! Core library of a preset manager for a virtual tabletop: reusable templates
//! of placeable objects ("presets"), organized in folders inside collections,
//! browsed as a tree, searched, tagged, manually sorted and spawned back onto
//! a scene.
//!
//! ## Layers
//!
//! ```text
//! UI (out of crate) -> api::PresetsApi -> commands::* -> store::RecordStore
//!                                     \-> tree / search / sort / spawn (pure)
//! ```
//!
//! - [`tree`]: flat folder and index listings to a nested, filterable tree
//! - [`search`]: query parsing, matching and tri-state visibility over a tree
//! - [`sort`]: natural name collation and integer-gap manual reordering
//! - [`store`]: the record store interface, its lazy index reconciliation,
//!   and the in-memory and filesystem backends
//! - [`commands`]: business operations returning [`commands::CmdResult`]
//! - [`api`]: the facade a UI talks to
//!
//! The library installs no logging subscriber; it emits `tracing` events and
//! leaves collection to the host.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod fileindex;
pub mod init;
pub mod model;
pub mod progress;
pub mod search;
pub mod sort;
pub mod spawn;
pub mod store;
pub mod tags;
pub mod tree;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
