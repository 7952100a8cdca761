//! # Configuration
//!
//! Preset library settings are managed by [`clapfig`], which handles layered
//! loading from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `MASSEDIT__DEFAULT_COLLECTION`, `MASSEDIT__TAG_MATCH`, etc.
//! 2. **World Config**: `presets.toml` in the per-world directory, when one is given.
//! 3. **Global Config**: `presets.toml` in the data directory (via `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `default_collection` | `presets` | Collection used when none is given, and the fallback when a fetch fails |
//! | `search_debounce_ms` | `250` | Quiet period before a typed query runs |
//! | `found_max_count` | `1001` | Ceiling on counted search hits |
//! | `tag_match` | `any` | `any` or `all`: how query tags are compared |
//! | `sort_stride` | `10` | Spacing used when manual sort values are renumbered |
//! | `root_sorting` | `a` | `a` (alphabetical) or `m` (manual) for the top level |
//! | `placeable_types` | *(built-in list)* | Document types shown by the `ALL` filter |

use crate::model::{default_placeable_types, SortingMode};
use crate::search::{SearchOptions, TagMatch};
use crate::tree::TreeOptions;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Configuration for the preset library, stored in `presets.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PresetsConfig {
    /// Collection used when none is specified.
    #[config(default = "presets")]
    pub default_collection: String,

    /// Milliseconds of quiet before a search runs.
    #[config(default = 250)]
    pub search_debounce_ms: u64,

    /// Maximum number of presets counted as search hits.
    #[config(default = 1001)]
    pub found_max_count: usize,

    /// Tag comparison mode: "any" or "all".
    #[config(default = "any")]
    pub tag_match: TagMatch,

    /// Step between renumbered manual sort values.
    #[config(default = 10)]
    pub sort_stride: i64,

    /// Sorting of the top level: "a" or "m".
    #[config(default = "a")]
    pub root_sorting: SortingMode,

    /// Document types shown under the ALL filter.
    /// When absent, the built-in placeable list is used.
    pub placeable_types: Option<Vec<String>>,
}

impl Default for PresetsConfig {
    fn default() -> Self {
        Self {
            default_collection: "presets".to_string(),
            search_debounce_ms: 250,
            found_max_count: crate::search::FOUND_MAX_COUNT,
            tag_match: TagMatch::Any,
            sort_stride: 10,
            root_sorting: SortingMode::Alphabetical,
            placeable_types: None,
        }
    }
}

impl PresetsConfig {
    pub fn placeable_types(&self) -> BTreeSet<String> {
        match &self.placeable_types {
            Some(types) => types
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => default_placeable_types(),
        }
    }

    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            root_sorting: self.root_sorting,
            placeable_types: self.placeable_types(),
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            tag_match: self.tag_match,
            found_max_count: self.found_max_count,
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Sort stride, never below 1.
    pub fn sort_stride(&self) -> i64 {
        self.sort_stride.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PresetsConfig::default();
        assert_eq!(config.default_collection, "presets");
        assert_eq!(config.search_debounce(), Duration::from_millis(250));
        assert_eq!(config.search_options().found_max_count, 1001);
        assert_eq!(config.search_options().tag_match, TagMatch::Any);
        assert_eq!(config.tree_options(), TreeOptions::default());
    }

    #[test]
    fn test_placeable_types_override() {
        let config = PresetsConfig {
            placeable_types: Some(vec!["Token".into(), " Tile ".into(), "".into()]),
            ..Default::default()
        };
        let types = config.placeable_types();
        assert_eq!(types.len(), 2);
        assert!(types.contains("Tile"));
        assert!(!types.contains("Bag"));
    }

    #[test]
    fn test_sort_stride_floor() {
        let config = PresetsConfig {
            sort_stride: 0,
            ..Default::default()
        };
        assert_eq!(config.sort_stride(), 1);
    }

    #[test]
    fn test_parse_from_toml() {
        let config: PresetsConfig = toml::from_str(
            r#"
            default_collection = "world.presets"
            search_debounce_ms = 100
            found_max_count = 50
            tag_match = "all"
            sort_stride = 100
            root_sorting = "m"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_collection, "world.presets");
        assert_eq!(config.tag_match, TagMatch::All);
        assert_eq!(config.root_sorting, SortingMode::Manual);
        assert_eq!(config.tree_options().root_sorting, SortingMode::Manual);
        assert_eq!(config.placeable_types, None);
    }
}
