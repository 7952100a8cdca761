//! # Search: Query Parsing and Matching
//!
//! Search is typed into a single box. The text is split on whitespace and each
//! token classified:
//!
//! | Token    | Meaning                              |
//! |----------|--------------------------------------|
//! | `oak`    | name must contain "oak"              |
//! | `#fire`  | preset must carry tag "fire"         |
//! | `-pine`  | name must NOT contain "pine"         |
//! | `-#wip`  | preset must NOT carry tag "wip"      |
//!
//! Everything is lowercased; name matching is case-insensitive substring
//! containment, tag matching is set membership under a [`TagMatch`] mode.
//!
//! ## Rule Order
//!
//! A query with tags is a tag query: its terms are not consulted. A query
//! without tags matches on terms, all of which must be present. An empty query
//! matches everything. The negative query is evaluated with the same rules and
//! excludes what it matches; an empty negative query excludes nothing.
//!
//! ## Tree Search
//!
//! [`search_tree`] walks a built [`Tree`] and reports, per node, a
//! [`NodeVisibility`]:
//!
//! - `matched`: the node itself satisfied the query
//! - `render`: the node should be shown at all
//! - `expanded`: the folder should be opened because something below it is a hit
//!
//! A folder renders if it matched or anything below it did. Results are capped
//! at [`SearchOptions::found_max_count`]; the cap is applied in tree order, so
//! which presets get cut depends on list order, not relevance.

pub mod session;

use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub use session::{Debouncer, QueryRun, QueryRunTracker, SearchSession};

/// Default ceiling on counted search hits.
pub const FOUND_MAX_COUNT: usize = 1001;

/// How a query's tags are compared with a preset's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// At least one query tag is present.
    #[default]
    Any,
    /// Every query tag is present.
    All,
}

/// One side (positive or negative) of a parsed search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub tags: Option<BTreeSet<String>>,
}

impl SearchQuery {
    pub fn terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
            tags: None,
        }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: Vec::new(),
            tags: Some(tags.into_iter().map(|t| t.as_ref().to_lowercase()).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.tags.as_ref().map_or(true, |t| t.is_empty())
    }

    fn has_tags(&self) -> bool {
        self.tags.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Anything the matcher can look at: a name and a tag set.
pub trait Searchable {
    fn search_name(&self) -> &str;
    fn search_tags(&self) -> &BTreeSet<String>;
}

impl Searchable for crate::tree::PresetNode {
    fn search_name(&self) -> &str {
        &self.name
    }

    fn search_tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

impl Searchable for crate::model::IndexEntry {
    fn search_name(&self) -> &str {
        &self.name
    }

    fn search_tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Splits raw search text into positive and negative queries.
pub fn parse_query(text: &str) -> (SearchQuery, SearchQuery) {
    let mut positive = SearchQuery::default();
    let mut negative = SearchQuery::default();

    for token in text.split_whitespace() {
        let token = token.to_lowercase();
        let (target, rest) = match token.strip_prefix('-') {
            Some(rest) => (&mut negative, rest.to_string()),
            None => (&mut positive, token.clone()),
        };
        match rest.strip_prefix('#') {
            Some(tag) if !tag.is_empty() => {
                target
                    .tags
                    .get_or_insert_with(BTreeSet::new)
                    .insert(tag.to_string());
            }
            Some(_) => {}
            None if !rest.is_empty() => target.terms.push(rest),
            None => {}
        }
    }

    (positive, negative)
}

fn tags_match(preset_tags: &BTreeSet<String>, query_tags: &BTreeSet<String>, mode: TagMatch) -> bool {
    match mode {
        TagMatch::Any => query_tags.iter().any(|t| preset_tags.contains(t)),
        TagMatch::All => query_tags.iter().all(|t| preset_tags.contains(t)),
    }
}

fn terms_match(name: &str, terms: &[String]) -> bool {
    let name = name.to_lowercase();
    terms.iter().all(|term| name.contains(term.as_str()))
}

/// Positive-only evaluation: tags when the query has tags, otherwise terms.
pub fn match_positive<P: Searchable + ?Sized>(preset: &P, query: &SearchQuery, mode: TagMatch) -> bool {
    if let Some(tags) = query.tags.as_ref().filter(|t| !t.is_empty()) {
        tags_match(preset.search_tags(), tags, mode)
    } else if !query.terms.is_empty() {
        terms_match(preset.search_name(), &query.terms)
    } else {
        true
    }
}

/// Full evaluation: matches `positive` and does not match a non-empty `negative`.
pub fn match_preset<P: Searchable + ?Sized>(
    preset: &P,
    positive: &SearchQuery,
    negative: &SearchQuery,
    mode: TagMatch,
) -> bool {
    if !match_positive(preset, positive, mode) {
        return false;
    }
    negative.is_empty() || !match_positive(preset, negative, mode)
}

/// Folder names match on terms only; a tag query never matches a folder.
pub fn match_folder_name(name: &str, positive: &SearchQuery) -> bool {
    !positive.has_tags() && !positive.terms.is_empty() && terms_match(name, &positive.terms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub tag_match: TagMatch,
    pub found_max_count: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            tag_match: TagMatch::Any,
            found_max_count: FOUND_MAX_COUNT,
        }
    }
}

/// Per-node outcome of a tree search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeVisibility {
    pub render: bool,
    pub expanded: bool,
    #[serde(rename = "match")]
    pub matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub folders: HashMap<String, NodeVisibility>,
    pub presets: HashMap<String, NodeVisibility>,
    /// Presets counted as hits, at most the cap.
    pub found: usize,
    /// Whether hits were dropped because of the cap.
    pub truncated: bool,
}

impl SearchOutcome {
    pub fn folder(&self, id: &str) -> NodeVisibility {
        self.folders.get(id).copied().unwrap_or_default()
    }

    pub fn preset(&self, id: &str) -> NodeVisibility {
        self.presets.get(id).copied().unwrap_or_default()
    }

    /// Ids of presets that should be rendered.
    pub fn rendered_presets(&self) -> BTreeSet<&str> {
        self.presets
            .iter()
            .filter(|(_, v)| v.render)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

struct Walk<'a> {
    tree: &'a Tree,
    positive: &'a SearchQuery,
    negative: &'a SearchQuery,
    options: &'a SearchOptions,
    outcome: SearchOutcome,
}

impl Walk<'_> {
    /// Visits one folder level; returns whether anything in it rendered.
    fn level(&mut self, folder_ids: &[String], preset_ids: &[String]) -> bool {
        let mut any = false;
        for id in folder_ids {
            any |= self.folder(id);
        }
        for id in preset_ids {
            any |= self.preset(id);
        }
        any
    }

    fn folder(&mut self, id: &str) -> bool {
        let Some(node) = self.tree.folder(id) else {
            return false;
        };
        if !node.visible {
            self.outcome
                .folders
                .insert(id.to_string(), NodeVisibility::default());
            return false;
        }

        let matched = match_folder_name(&node.name, self.positive);
        let below = self.level(&node.children, &node.presets);
        let visibility = NodeVisibility {
            render: matched || below,
            expanded: below,
            matched,
        };
        self.outcome.folders.insert(id.to_string(), visibility);
        visibility.render
    }

    fn preset(&mut self, id: &str) -> bool {
        let Some(node) = self.tree.preset(id) else {
            return false;
        };
        let hit = node.visible
            && match_preset(node, self.positive, self.negative, self.options.tag_match);
        let counted = hit && self.outcome.found < self.options.found_max_count;
        if hit && !counted {
            self.outcome.truncated = true;
        }
        if counted {
            self.outcome.found += 1;
        }
        self.outcome.presets.insert(
            id.to_string(),
            NodeVisibility {
                render: counted,
                expanded: false,
                matched: counted,
            },
        );
        counted
    }
}

/// Evaluates a query over a whole tree.
///
/// With an empty query every type-visible node renders and folders keep their
/// persisted expansion. Either way, nothing below a type-hidden folder renders.
pub fn search_tree(
    tree: &Tree,
    positive: &SearchQuery,
    negative: &SearchQuery,
    options: &SearchOptions,
) -> SearchOutcome {
    if positive.is_empty() && negative.is_empty() {
        return unfiltered(tree);
    }

    let mut walk = Walk {
        tree,
        positive,
        negative,
        options,
        outcome: SearchOutcome::default(),
    };
    walk.level(&tree.folders, &tree.presets);
    walk.outcome
}

fn unfiltered(tree: &Tree) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();
    reveal_level(tree, &tree.folders, &tree.presets, &mut outcome);
    outcome
}

/// Renders every type-visible node of one level. A hidden folder hides its subtree.
fn reveal_level(tree: &Tree, folder_ids: &[String], preset_ids: &[String], outcome: &mut SearchOutcome) {
    for id in folder_ids {
        let Some(node) = tree.folder(id) else {
            continue;
        };
        if !node.visible {
            outcome.folders.insert(id.clone(), NodeVisibility::default());
            continue;
        }
        outcome.folders.insert(
            id.clone(),
            NodeVisibility {
                render: true,
                expanded: node.expanded,
                matched: false,
            },
        );
        reveal_level(tree, &node.children, &node.presets, outcome);
    }
    for id in preset_ids {
        let Some(node) = tree.preset(id) else {
            continue;
        };
        outcome.presets.insert(
            id.clone(),
            NodeVisibility {
                render: node.visible,
                expanded: false,
                matched: false,
            },
        );
    }
}
