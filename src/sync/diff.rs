use std::collections::BTreeMap;

use crate::filesystem::{Entry, Node};

/// Which kind of siblings a diff compares. Directory pairs never count as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLevel {
    Directories,
    Files,
}

/// Outcome of comparing an existing listing (left) against a desired one (right).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult<T> {
    /// Only on the left.
    pub extra: Vec<T>,
    /// Only on the right.
    pub missing: Vec<T>,
    /// On both sides and out of date, as `(left, right)`.
    pub changed: Vec<(T, T)>,
    /// On both sides and up to date, as `(left, right)`.
    pub same: Vec<(T, T)>,
}

impl<T> DiffResult<T> {
    pub fn is_dirty(&self) -> bool {
        !self.extra.is_empty() || !self.missing.is_empty() || !self.changed.is_empty()
    }
}

/// Decides whether the destination copy of a file needs to be refreshed from the source.
///
/// Sizes always count. Modification times only count when both sides report one
/// and the source is strictly newer.
pub fn is_out_of_date(source: &Entry, destination: &Entry, size_only: bool) -> bool {
    if source.size != destination.size {
        return true;
    }
    if size_only {
        return false;
    }
    match (source.modified_at, destination.modified_at) {
        (Some(source_time), Some(destination_time)) => source_time > destination_time,
        _ => false,
    }
}

/// Compares two collections by key.
///
/// Every output list is ordered by key. `is_changed` receives `(left, right)` for
/// items present on both sides.
pub fn diff<T, K, F, C>(
    left: impl IntoIterator<Item = T>,
    right: impl IntoIterator<Item = T>,
    key: F,
    is_changed: C,
) -> DiffResult<T>
where
    K: Ord,
    F: Fn(&T) -> K,
    C: Fn(&T, &T) -> bool,
{
    let left: BTreeMap<K, T> = left.into_iter().map(|item| (key(&item), item)).collect();
    let mut right: BTreeMap<K, T> = right.into_iter().map(|item| (key(&item), item)).collect();

    let mut result = DiffResult {
        extra: Vec::new(),
        missing: Vec::new(),
        changed: Vec::new(),
        same: Vec::new(),
    };

    for (name, left_item) in left {
        match right.remove(&name) {
            Some(right_item) if is_changed(&left_item, &right_item) => {
                result.changed.push((left_item, right_item))
            }
            Some(right_item) => result.same.push((left_item, right_item)),
            None => result.extra.push(left_item),
        }
    }
    result.missing = right.into_values().collect();

    result
}

/// Diffs destination nodes (left) against source nodes (right) by entry name.
pub fn diff_nodes<L>(
    destination: Vec<Node<L>>,
    source: Vec<Node<L>>,
    level: DiffLevel,
    size_only: bool,
) -> DiffResult<Node<L>> {
    diff(
        destination,
        source,
        |node| node.entry.name.clone(),
        |dst, src| match level {
            DiffLevel::Directories => false,
            DiffLevel::Files => is_out_of_date(&src.entry, &dst.entry, size_only),
        },
    )
}
