//! Tag support for presets.
//!
//! Tags are free-form lowercase labels stored on each preset record and
//! mirrored into its index entry, which is what search reads. There is no
//! registry: the set of tags in a collection is whatever its presets carry,
//! see [`tag_counts`].
//!
//! ## Tag Naming Rules
//!
//! See [`validation`] module for the full rules. In summary:
//! - Lowercase, trimmed, no whitespace
//! - No `#` or `,` inside, no leading `-`

pub mod validation;

use crate::error::{PresetError, Result};
use crate::model::IndexEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use validation::{normalize_tag, validate_tag_name, TagValidationError};

/// Parses a tag list as typed by a user: separated by commas or whitespace.
///
/// Fails on the first invalid tag.
pub fn parse_tags(text: &str) -> Result<BTreeSet<String>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            normalize_tag(part)
                .map_err(|e| PresetError::Validation(format!("Invalid tag '{}': {}", part, e)))
        })
        .collect()
}

/// Normalizes every tag in `tags`.
pub fn normalize_tags<I, S>(tags: I) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| {
            let tag = tag.as_ref();
            normalize_tag(tag)
                .map_err(|e| PresetError::Validation(format!("Invalid tag '{}': {}", tag, e)))
        })
        .collect()
}

/// A tag and the number of presets carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Counts tag usage across index entries, ordered by tag name.
pub fn tag_counts<'a, I>(entries: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a IndexEntry>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        for tag in &entry.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(name, count)| TagCount {
            name: name.to_string(),
            count,
        })
        .collect()
}
