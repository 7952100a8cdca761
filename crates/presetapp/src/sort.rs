//! # Ordering: Natural Names and Integer Sort Keys
//!
//! Folders order their contents one of two ways (see [`crate::model::SortingMode`]):
//!
//! - **Alphabetical**: [`natural_cmp`] on names. Case-insensitive, and runs of digits
//!   compare by value so `"Wall 2"` sorts before `"Wall 10"`.
//! - **Manual**: ascending integer `sort` keys, assigned by drag-and-drop through
//!   [`reorder`].
//!
//! ## Integer-Gap Reordering
//!
//! Moving items next to a target sibling only needs new keys for the moved items
//! when there is room between the two neighbours of the insertion point:
//!
//! ```text
//! siblings: 10  20  30       move X before 20
//! gap (10, 20) fits 1 item  -> X = 15, siblings untouched
//! ```
//!
//! When the neighbours are adjacent integers, or the insertion point is an
//! extremity, the whole destination sequence is renumbered with multiples of
//! the stride:
//!
//! ```text
//! siblings: 1  2             move X before 1
//! no lower neighbour        -> X = 10, 1 -> 20, 2 -> 30
//! ```
//!
//! Only keys that change are returned, and calling [`reorder`] again with the
//! updated keys returns nothing: an already satisfied placement is detected up front.

use crate::error::{PresetError, Result};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

/// Compares names the way a person would: case-insensitive, numbers by value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_digits = take_digits(&mut left);
                let r_digits = take_digits(&mut right);
                let ord = cmp_digit_runs(&l_digits, &r_digits);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// An item taking part in a manual reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItem {
    pub id: String,
    pub sort: i64,
}

impl SortItem {
    pub fn new(id: impl Into<String>, sort: i64) -> Self {
        Self {
            id: id.into(),
            sort,
        }
    }
}

/// A new sort key for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortUpdate {
    pub id: String,
    pub sort: i64,
}

/// Where the moved items should land.
#[derive(Debug, Clone, Copy)]
pub struct ReorderTarget<'a> {
    /// The sibling to drop next to. `None` appends after the last sibling.
    pub target: Option<&'a str>,
    /// Every item of the destination sequence. Moved items may be included.
    pub siblings: &'a [SortItem],
    pub insert_before: bool,
}

/// Sort key for a new item appended after `siblings`.
///
/// Fails when the largest key leaves no room above it.
pub fn next_sort(siblings: impl IntoIterator<Item = i64>, stride: i64) -> Result<i64> {
    match siblings.into_iter().max() {
        None => Ok(stride),
        Some(max) => max.checked_add(stride).ok_or_else(|| exhausted(max)),
    }
}

/// Advances an append cursor by `stride`.
pub fn step_sort(sort: i64, stride: i64) -> Result<i64> {
    sort.checked_add(stride).ok_or_else(|| exhausted(sort))
}

fn exhausted(max: i64) -> PresetError {
    PresetError::Store(format!("No sort key left above {}", max))
}

/// Computes the sort keys that place `moved` at `placement`.
///
/// Relative order among `moved` is preserved. Returns only the items whose key
/// changes. A target that is not a sibling, or is itself moving, is rejected.
pub fn reorder(
    moved: &[SortItem],
    placement: &ReorderTarget<'_>,
    stride: i64,
) -> Result<Vec<SortUpdate>> {
    if stride <= 0 {
        return Err(PresetError::Validation(format!(
            "Sort stride must be positive, got {}",
            stride
        )));
    }

    let mut seen = HashSet::new();
    let moved: Vec<&SortItem> = moved.iter().filter(|m| seen.insert(m.id.as_str())).collect();
    if moved.is_empty() {
        return Ok(Vec::new());
    }

    let mut ordered: Vec<&SortItem> = placement
        .siblings
        .iter()
        .filter(|s| !seen.contains(s.id.as_str()))
        .collect();
    ordered.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.id.cmp(&b.id)));

    let Some(target) = placement.target else {
        let max = ordered.last().map(|s| s.sort);
        if is_placed(&moved, max, None) {
            return Ok(Vec::new());
        }
        let base = max.unwrap_or(0);
        let appended: Option<Vec<(&SortItem, i64)>> = moved
            .iter()
            .enumerate()
            .map(|(i, m)| {
                stride
                    .checked_mul(i as i64 + 1)
                    .and_then(|offset| base.checked_add(offset))
                    .map(|sort| (*m, sort))
            })
            .collect();
        return match appended {
            Some(updates) => Ok(changed(updates.into_iter())),
            None => renumber(&ordered, &moved, ordered.len(), stride),
        };
    };

    if seen.contains(target) {
        return Err(PresetError::Validation(format!(
            "Cannot reorder relative to '{}': it is one of the moved items",
            target
        )));
    }
    let idx = ordered
        .iter()
        .position(|s| s.id == target)
        .ok_or_else(|| {
            PresetError::Validation(format!("Reorder target '{}' is not a sibling", target))
        })?;

    let (lower, upper, insert_at) = if placement.insert_before {
        (
            idx.checked_sub(1).map(|i| ordered[i].sort),
            Some(ordered[idx].sort),
            idx,
        )
    } else {
        (
            Some(ordered[idx].sort),
            ordered.get(idx + 1).map(|s| s.sort),
            idx + 1,
        )
    };

    if is_placed(&moved, lower, upper) {
        return Ok(Vec::new());
    }

    let count = moved.len() as i128;
    if let (Some(lo), Some(hi)) = (lower, upper) {
        let gap = hi as i128 - lo as i128;
        if gap > count {
            let updates = moved.iter().enumerate().map(|(i, m)| {
                let offset = gap * (i as i128 + 1) / (count + 1);
                (*m, (lo as i128 + offset) as i64)
            });
            return Ok(changed(updates));
        }
    }

    renumber(&ordered, &moved, insert_at, stride)
}

/// Rewrites the whole destination sequence with multiples of `stride`,
/// `moved` inserted at `insert_at`.
fn renumber(
    ordered: &[&SortItem],
    moved: &[&SortItem],
    insert_at: usize,
    stride: i64,
) -> Result<Vec<SortUpdate>> {
    tracing::debug!(
        siblings = ordered.len(),
        moved = moved.len(),
        "renumbering sort keys"
    );
    let sequence = ordered[..insert_at]
        .iter()
        .chain(moved.iter())
        .chain(ordered[insert_at..].iter());
    let updates = sequence
        .enumerate()
        .map(|(k, item)| {
            stride
                .checked_mul(k as i64 + 1)
                .map(|sort| (*item, sort))
                .ok_or_else(|| {
                    PresetError::Validation(format!("Sort stride {} is too large", stride))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(changed(updates.into_iter()))
}

/// Whether `moved` already sits strictly between `lower` and `upper`, in order.
fn is_placed(moved: &[&SortItem], lower: Option<i64>, upper: Option<i64>) -> bool {
    let increasing = moved.windows(2).all(|w| w[0].sort < w[1].sort);
    let above = match (lower, moved.first()) {
        (Some(lo), Some(first)) => first.sort > lo,
        _ => true,
    };
    let below = match (upper, moved.last()) {
        (Some(hi), Some(last)) => last.sort < hi,
        _ => true,
    };
    increasing && above && below
}

fn changed<'a>(updates: impl Iterator<Item = (&'a SortItem, i64)>) -> Vec<SortUpdate> {
    updates
        .filter(|(item, sort)| item.sort != *sort)
        .map(|(item, sort)| SortUpdate {
            id: item.id.clone(),
            sort,
        })
        .collect()
}
