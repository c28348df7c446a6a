//! Selection state shared by the controllers.
//!
//! Two independent sources of truth exist for selection: the engine's
//! model-space selection set and the host control's view-space notion of
//! which rows are highlighted. [`SelectionPhase`] is the tri-state flag
//! that tells the reconciliation code which one to believe at any given
//! moment:
//!
//! - `Normal`: the host is quiescent; a selection callback from it reflects
//!   a real user action and is adopted as ground truth.
//! - `Changing`: the engine just issued a selection command; the host's
//!   echoed callback is expected and must not be adopted (it would either
//!   double-fire the public event or overwrite the set mid-update).
//! - `Changed`: the echo has been observed; further echoes for the same
//!   command are ignored until the engine returns to `Normal`.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU8, Ordering};

use crate::source::{ItemKey, TreeItemRef};

/// Reconciliation state between the engine's selection set and the host's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    /// Host callbacks are adopted as user-initiated changes.
    #[default]
    Normal,
    /// An engine-issued selection command is in flight.
    Changing,
    /// The command's echo has been observed.
    Changed,
}

/// Lock-free cell holding a [`SelectionPhase`].
#[derive(Debug, Default)]
pub(crate) struct PhaseFlag(AtomicU8);

impl PhaseFlag {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn get(&self) -> SelectionPhase {
        match self.0.load(Ordering::SeqCst) {
            1 => SelectionPhase::Changing,
            2 => SelectionPhase::Changed,
            _ => SelectionPhase::Normal,
        }
    }

    pub fn set(&self, phase: SelectionPhase) {
        let raw = match phase {
            SelectionPhase::Normal => 0,
            SelectionPhase::Changing => 1,
            SelectionPhase::Changed => 2,
        };
        self.0.store(raw, Ordering::SeqCst);
    }
}

/// Model-space selection set for flat grids.
///
/// Select-all is represented by a flag rather than materialized indices, so
/// selecting everything in a large store stays O(1); readers expand the flag
/// into a concrete range lazily.
#[derive(Debug, Default)]
pub(crate) struct GridSelection {
    rows: BTreeSet<usize>,
    all_selected: bool,
}

impl GridSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `model_row` is selected.
    pub fn is_selected(&self, model_row: usize) -> bool {
        self.all_selected || self.rows.contains(&model_row)
    }

    /// Inserts a row. Returns `true` if the set changed.
    pub fn insert(&mut self, model_row: usize) -> bool {
        if self.all_selected {
            return false;
        }
        self.rows.insert(model_row)
    }

    /// Removes a row, demoting a select-all into explicit rows first.
    ///
    /// Returns `true` if the set changed. `row_count` bounds the expansion.
    pub fn remove(&mut self, model_row: usize, row_count: usize) -> bool {
        if self.all_selected {
            self.all_selected = false;
            self.rows = (0..row_count).collect();
        }
        self.rows.remove(&model_row)
    }

    /// Replaces the set with exactly the given rows. Returns `true` if the
    /// selection changed.
    pub fn replace(&mut self, model_rows: BTreeSet<usize>) -> bool {
        if self.all_selected {
            self.all_selected = false;
            self.rows = model_rows;
            return true;
        }
        if self.rows == model_rows {
            return false;
        }
        self.rows = model_rows;
        true
    }

    /// Marks everything selected. Returns `true` if the set changed.
    pub fn select_all(&mut self, row_count: usize) -> bool {
        let already = self.all_selected || self.rows.len() == row_count;
        self.all_selected = true;
        self.rows.clear();
        !already
    }

    /// Clears the selection. Returns `true` if the set changed.
    pub fn clear(&mut self) -> bool {
        let changed = self.all_selected || !self.rows.is_empty();
        self.all_selected = false;
        self.rows.clear();
        changed
    }

    /// Whether the select-all fast path is active.
    pub fn is_all_selected(&self) -> bool {
        self.all_selected
    }

    /// The selected model rows in ascending order, expanding a select-all
    /// into the full range on read.
    pub fn selected_rows(&self, row_count: usize) -> Vec<usize> {
        if self.all_selected {
            (0..row_count).collect()
        } else {
            self.rows.iter().copied().collect()
        }
    }

    /// The explicit row set (empty under select-all).
    pub fn explicit_rows(&self) -> &BTreeSet<usize> {
        &self.rows
    }
}

/// Identity-based selection set for trees.
///
/// Items are held by strong reference so their identity keys stay valid
/// across cache invalidation; insertion order is preserved for the public
/// getter.
#[derive(Default)]
pub(crate) struct ItemSelection {
    items: Vec<TreeItemRef>,
    keys: HashSet<ItemKey>,
}

impl ItemSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.keys.contains(&key)
    }

    /// Inserts an item. Returns `true` if the set changed.
    pub fn insert(&mut self, item: TreeItemRef) -> bool {
        if !self.keys.insert(ItemKey::of(&item)) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Removes an item. Returns `true` if the set changed.
    pub fn remove(&mut self, key: ItemKey) -> bool {
        if !self.keys.remove(&key) {
            return false;
        }
        self.items.retain(|item| ItemKey::of(item) != key);
        true
    }

    /// Replaces the set. Returns `true` if the selected identities changed.
    pub fn replace(&mut self, items: Vec<TreeItemRef>) -> bool {
        let keys: HashSet<ItemKey> = items.iter().map(ItemKey::of).collect();
        if keys == self.keys {
            return false;
        }
        self.keys = keys;
        self.items = items;
        true
    }

    /// Clears the set. Returns `true` if the set changed.
    pub fn clear(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.items.clear();
        self.keys.clear();
        true
    }

    pub fn items(&self) -> Vec<TreeItemRef> {
        self.items.clone()
    }

    pub fn first(&self) -> Option<TreeItemRef> {
        self.items.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeNode;

    #[test]
    fn phase_flag_round_trips() {
        let phase = PhaseFlag::new();
        assert_eq!(phase.get(), SelectionPhase::Normal);
        phase.set(SelectionPhase::Changing);
        assert_eq!(phase.get(), SelectionPhase::Changing);
        phase.set(SelectionPhase::Changed);
        assert_eq!(phase.get(), SelectionPhase::Changed);
        phase.set(SelectionPhase::Normal);
        assert_eq!(phase.get(), SelectionPhase::Normal);
    }

    #[test]
    fn grid_selection_tracks_rows() {
        let mut selection = GridSelection::new();
        assert!(selection.insert(3));
        assert!(!selection.insert(3));
        assert!(selection.is_selected(3));
        assert!(!selection.is_selected(4));
        assert!(selection.remove(3, 10));
        assert!(!selection.remove(3, 10));
    }

    #[test]
    fn select_all_is_a_flag_not_a_range() {
        let mut selection = GridSelection::new();
        selection.select_all(1_000_000);
        assert!(selection.is_all_selected());
        assert!(selection.explicit_rows().is_empty());
        assert!(selection.is_selected(999_999));

        // The range materializes only on read.
        let rows = selection.selected_rows(5);
        assert_eq!(rows, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn removing_under_select_all_demotes_to_explicit_rows() {
        let mut selection = GridSelection::new();
        selection.select_all(4);
        assert!(selection.remove(2, 4));
        assert!(!selection.is_all_selected());
        assert_eq!(selection.selected_rows(4), vec![0, 1, 3]);
    }

    #[test]
    fn item_selection_deduplicates_by_identity() {
        let mut selection = ItemSelection::new();
        let item: TreeItemRef = TreeNode::new("x");
        assert!(selection.insert(item.clone()));
        assert!(!selection.insert(item.clone()));
        assert_eq!(selection.len(), 1);

        assert!(selection.remove(ItemKey::of(&item)));
        assert_eq!(selection.len(), 0);
    }

    #[test]
    fn item_selection_replace_detects_no_change() {
        let mut selection = ItemSelection::new();
        let a: TreeItemRef = TreeNode::new("a");
        let b: TreeItemRef = TreeNode::new("b");
        selection.insert(a.clone());
        selection.insert(b.clone());

        // Same identities, different order: not a change.
        assert!(!selection.replace(vec![b.clone(), a.clone()]));
        assert!(selection.replace(vec![a]));
    }
}
