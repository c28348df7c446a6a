//! Flattened-tree row arithmetic.
//!
//! A tree control presents its visible items as a flat run of rows: an
//! expanded item's descendants occupy the rows immediately after it, a
//! collapsed item's descendants occupy none. These functions compute row
//! positions directly from the logical source - expansion flags included -
//! without materializing any wrappers, which is what makes it possible to
//! locate an item that has never been on screen.
//!
//! All functions treat a `None` from [`HasChildren::child_at`] as "the
//! source shrank underneath us" and give up on the lookup rather than
//! panicking.

use crate::source::{HasChildren, ItemKey, TreeItemRef};

/// Number of visible rows contributed by `item`'s descendants.
///
/// Zero when collapsed; otherwise the direct child count plus the visible
/// rows of each child's own subtree.
pub fn count_rows(item: &TreeItemRef) -> usize {
    if !item.expanded() {
        return 0;
    }
    let container: &dyn HasChildren = item.as_ref();
    let count = container.child_count();
    let mut rows = count;
    for index in 0..count {
        if let Some(child) = container.child_at(index) {
            rows += count_rows(&child);
        }
    }
    rows
}

/// Absolute flattened row of `target` within `container`'s visible subtree.
///
/// Scans `container`'s direct children in order, adding one row per prior
/// sibling plus that sibling's visible descendants, descending into expanded
/// siblings along the way. Returns `None` when `target` is not visible under
/// `container` (collapsed away, filtered out, or no longer in the source).
pub fn find_row(container: &dyn HasChildren, target: &TreeItemRef) -> Option<usize> {
    let target_key = ItemKey::of(target);
    let mut row = 0;
    for index in 0..container.child_count() {
        let child = container.child_at(index)?;
        if ItemKey::of(&child) == target_key {
            return Some(row);
        }
        if child.expanded() {
            let inner: &dyn HasChildren = child.as_ref();
            if let Some(found) = find_row(inner, target) {
                return Some(row + 1 + found);
            }
        }
        row += 1 + count_rows(&child);
    }
    None
}

/// Direct-sibling scan: the child index and local row offset of `target`
/// among `container`'s immediate children.
///
/// Unlike [`find_row`] this never descends; it is the per-level step used
/// when walking a parent chain. The row offset counts prior siblings plus
/// their visible descendants.
pub fn locate_child(container: &dyn HasChildren, target: &TreeItemRef) -> Option<(usize, usize)> {
    let target_key = ItemKey::of(target);
    let mut row = 0;
    for index in 0..container.child_count() {
        let child = container.child_at(index)?;
        if ItemKey::of(&child) == target_key {
            return Some((index, row));
        }
        row += 1 + count_rows(&child);
    }
    None
}

/// The chain of items from the top-level ancestor down to `item` inclusive.
pub fn ancestor_chain(item: &TreeItemRef) -> Vec<TreeItemRef> {
    let mut chain = vec![item.clone()];
    let mut current = item.parent();
    while let Some(parent) = current {
        current = parent.parent();
        chain.push(parent);
    }
    chain.reverse();
    chain
}

/// Returns `true` when `item` is a strict descendant of `ancestor`.
pub fn is_descendant_of(item: &TreeItemRef, ancestor: &TreeItemRef) -> bool {
    let ancestor_key = ItemKey::of(ancestor);
    let mut current = item.parent();
    while let Some(parent) = current {
        if ItemKey::of(&parent) == ancestor_key {
            return true;
        }
        current = parent.parent();
    }
    false
}
