//! The tree controller: glue between a hierarchical data source and a
//! native tree host.
//!
//! [`TreeController`] owns the identity cache and the authoritative
//! selection/expansion state for one host control. The host pulls rows
//! through [`child_count`](TreeController::child_count) /
//! [`child_at`](TreeController::child_at) and reports transitions through
//! the `notify_*` entry points; the application pushes state changes through
//! [`set_expanded`](TreeController::set_expanded),
//! [`select_item`](TreeController::select_item),
//! [`reload_all`](TreeController::reload_all) and friends. Both directions
//! agree on row numbers through the arithmetic in [`crate::rows`].
//!
//! Every mutation the controller issues to the host echoes back through the
//! notification entry points on the same call stack. Two guards keep the
//! echo from turning into a storm: a [`Suppression`] scope held across
//! engine-initiated host calls (callbacks absorbed, application signals not
//! re-fired), and the [`SelectionPhase`] flag distinguishing an echoed
//! selection callback from a real user action.
//!
//! # Example
//!
//! ```
//! use trellis::TreeController;
//! use trellis::node::{TreeNode, TreeStore};
//!
//! let store = TreeStore::new();
//! let root = TreeNode::new("Projects");
//! TreeNode::add_child(&root, TreeNode::new("trellis"));
//! store.add_root(root);
//!
//! let controller = TreeController::new();
//! controller.signals().item_expanded.connect(|item| {
//!     let _ = item;
//! });
//! controller.set_source(store);
//!
//! assert_eq!(controller.child_count(None), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use trellis_core::{Signal, Suppression};

use crate::error::{Error, Result};
use crate::host::{ExpandEvent, TreeHost};
use crate::rows::{ancestor_chain, find_row, is_descendant_of, locate_child};
use crate::selection::{ItemSelection, PhaseFlag, SelectionPhase};
use crate::source::{HasChildren, ItemKey, TreeItemRef};
use crate::wrapper::{ExpandState, WrapperKey, WrapperStore};

/// Signals raised by a [`TreeController`].
///
/// `item_expanding` and `item_collapsing` are cancelable: any slot may call
/// [`ExpandEvent::cancel`] to veto the transition. None of these fire for
/// changes the application itself requested.
pub struct TreeSignals {
    /// An item is about to expand (cancelable).
    pub item_expanding: Signal<ExpandEvent>,
    /// An item finished expanding.
    pub item_expanded: Signal<TreeItemRef>,
    /// An item is about to collapse (cancelable).
    pub item_collapsing: Signal<ExpandEvent>,
    /// An item finished collapsing.
    pub item_collapsed: Signal<TreeItemRef>,
    /// The set of selected items changed.
    pub selection_changed: Signal<()>,
}

impl TreeSignals {
    fn new() -> Self {
        Self {
            item_expanding: Signal::new(),
            item_expanded: Signal::new(),
            item_collapsing: Signal::new(),
            item_collapsed: Signal::new(),
            selection_changed: Signal::new(),
        }
    }
}

/// Virtualization controller for one tree host.
///
/// Exclusively owned by a single control instance; see the crate docs for
/// the threading contract.
pub struct TreeController {
    source: RwLock<Option<Arc<dyn HasChildren>>>,
    store: RwLock<WrapperStore>,
    selection: RwLock<ItemSelection>,
    /// Armed while a collapse must re-select the collapsing row afterwards.
    pending_reselect: Mutex<Option<WrapperKey>>,
    multi_select: AtomicBool,
    phase: PhaseFlag,
    suppression: Suppression,
    host: RwLock<Option<Arc<dyn TreeHost>>>,
    signals: TreeSignals,
}

impl Default for TreeController {
    fn default() -> Self {
        Self::new_inner()
    }
}

impl TreeController {
    fn new_inner() -> Self {
        Self {
            source: RwLock::new(None),
            store: RwLock::new(WrapperStore::new()),
            selection: RwLock::new(ItemSelection::new()),
            pending_reselect: Mutex::new(None),
            multi_select: AtomicBool::new(false),
            phase: PhaseFlag::new(),
            suppression: Suppression::new(),
            host: RwLock::new(None),
            signals: TreeSignals::new(),
        }
    }

    /// Creates a controller with no source and no host.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::new_inner())
    }

    /// The controller's signals.
    pub fn signals(&self) -> &TreeSignals {
        &self.signals
    }

    /// Attaches the host control this controller drives.
    ///
    /// The host should hold a `Weak` back-reference to this controller,
    /// injected when the host is constructed.
    pub fn attach_host(&self, host: Arc<dyn TreeHost>) {
        *self.host.write() = Some(host);
    }

    /// Replaces the data source and performs a full reload.
    pub fn set_source(&self, source: Arc<dyn HasChildren>) {
        *self.source.write() = Some(source);
        self.reload_all();
    }

    /// The current data source.
    pub fn source(&self) -> Option<Arc<dyn HasChildren>> {
        self.source.read().clone()
    }

    /// Whether more than one item may be selected at a time.
    pub fn multi_select(&self) -> bool {
        self.multi_select.load(Ordering::SeqCst)
    }

    /// Sets the multi-selection mode. Does not change the current selection.
    pub fn set_multi_select(&self, multi: bool) {
        self.multi_select.store(multi, Ordering::SeqCst);
    }

    fn host(&self) -> Option<Arc<dyn TreeHost>> {
        self.host.read().clone()
    }

    // =========================================================================
    // Pull protocol (invoked by the host)
    // =========================================================================

    /// Number of children under `parent`, or of the root when `None`.
    pub fn child_count(&self, parent: Option<WrapperKey>) -> usize {
        match parent {
            None => self.source().map(|s| s.child_count()).unwrap_or(0),
            Some(key) => self
                .item_of(key)
                .map(|item| item.child_count())
                .unwrap_or(0),
        }
    }

    /// The wrapper for the child at `index` under `parent`.
    ///
    /// Materializes the wrapper on first use; repeated calls for the same
    /// position return the same key until invalidation. `None` when the
    /// source no longer has that child.
    pub fn child_at(&self, parent: Option<WrapperKey>, index: usize) -> Option<WrapperKey> {
        match self.try_child_at(parent, index) {
            Ok(key) => Some(key),
            Err(error) => {
                tracing::debug!(target: "trellis::cache", %error, index, "child lookup failed");
                None
            }
        }
    }

    /// Fallible variant of [`child_at`](Self::child_at), exposing the
    /// reason a lookup failed.
    pub fn try_child_at(&self, parent: Option<WrapperKey>, index: usize) -> Result<WrapperKey> {
        let source = self.source().ok_or(Error::NoSource)?;
        self.store
            .write()
            .get_or_create(source.as_ref(), parent, index)
    }

    /// Whether the wrapper's item can be expanded.
    pub fn is_expandable(&self, wrapper: WrapperKey) -> bool {
        self.item_of(wrapper)
            .map(|item| item.expandable())
            .unwrap_or(false)
    }

    /// The item behind a wrapper, while cached.
    pub fn item_of(&self, wrapper: WrapperKey) -> Option<TreeItemRef> {
        self.store.read().item_of(wrapper)
    }

    /// The cached wrapper for an item, if it has been materialized.
    pub fn wrapper_of(&self, item: &TreeItemRef) -> Option<WrapperKey> {
        self.store.read().wrapper_for_item(ItemKey::of(item))
    }

    /// The parent wrapper of `wrapper`, `None` for root-level wrappers.
    pub fn parent_of(&self, wrapper: WrapperKey) -> Option<WrapperKey> {
        self.store.read().parent_of(wrapper)
    }

    /// The wrapper's expansion state machine value.
    pub fn expand_state(&self, wrapper: WrapperKey) -> ExpandState {
        self.store.read().state_of(wrapper)
    }

    // =========================================================================
    // Notification entry points (invoked by the host)
    // =========================================================================

    /// The host is about to expand `wrapper`.
    ///
    /// Returns `false` when the transition is vetoed - by a slot of the
    /// `item_expanding` signal, or because the item is not expandable.
    pub fn notify_expanding(&self, wrapper: WrapperKey) -> bool {
        let Some(item) = self.item_of(wrapper) else {
            return true;
        };
        if !item.expandable() {
            return false;
        }
        if !self.suppression.is_active() {
            let event = ExpandEvent::new(item);
            self.signals.item_expanding.emit(event.clone());
            if event.is_cancelled() {
                tracing::debug!(target: "trellis::expansion", ?wrapper, "expand vetoed");
                return false;
            }
        }
        self.store.write().set_state(wrapper, ExpandState::Expanding);
        true
    }

    /// The host finished expanding `wrapper`.
    ///
    /// Writes the expansion flag back to the item, then re-expands every
    /// already-known child whose item is flagged expanded, so that expansion
    /// state persists through reloads even though the child wrappers were
    /// just recreated.
    pub fn notify_expanded(&self, wrapper: WrapperKey) {
        let Some(item) = self.item_of(wrapper) else {
            return;
        };
        item.set_expanded(true);
        self.store.write().set_state(wrapper, ExpandState::Expanded);
        self.restore_child_expansion(wrapper);
        if !self.suppression.is_active() {
            self.signals.item_expanded.emit(item);
        }
    }

    fn restore_child_expansion(&self, wrapper: WrapperKey) {
        let Some(host) = self.host() else {
            return;
        };
        let children = self.store.read().known_children(wrapper);
        for child in children {
            let Some(child_item) = self.item_of(child) else {
                continue;
            };
            if child_item.expanded() && child_item.expandable() && !host.is_expanded(child) {
                tracing::trace!(target: "trellis::expansion", ?child, "re-expanding child");
                let _guard = self.suppression.enter();
                host.expand(child);
            }
        }
    }

    /// The host is about to collapse `wrapper`.
    ///
    /// Returns `false` when a slot of the `item_collapsing` signal vetoed
    /// the transition.
    pub fn notify_collapsing(&self, wrapper: WrapperKey) -> bool {
        let Some(item) = self.item_of(wrapper) else {
            return true;
        };
        if !self.suppression.is_active() {
            let event = ExpandEvent::new(item.clone());
            self.signals.item_collapsing.emit(event.clone());
            if event.is_cancelled() {
                tracing::debug!(target: "trellis::expansion", ?wrapper, "collapse vetoed");
                return false;
            }
        }
        self.store
            .write()
            .set_state(wrapper, ExpandState::Collapsing);

        // Single-select: if the selection is buried under the collapsing
        // row, the host would silently clear it. Arm a deferred
        // re-selection of the collapsing row and stop adopting host
        // selection until the collapse completes.
        if !self.multi_select()
            && let Some(selected) = self.selection.read().first()
            && is_descendant_of(&selected, &item)
        {
            *self.pending_reselect.lock() = Some(wrapper);
            self.phase.set(SelectionPhase::Changing);
        }
        true
    }

    /// The host finished collapsing `wrapper`.
    pub fn notify_collapsed(&self, wrapper: WrapperKey) {
        let Some(item) = self.item_of(wrapper) else {
            return;
        };
        item.set_expanded(false);
        self.store.write().set_state(wrapper, ExpandState::Collapsed);

        let mut reselected = false;
        let pending = self.pending_reselect.lock().take();
        match pending {
            Some(armed) if armed == wrapper => {
                if let Some(host) = self.host() {
                    if let Some(row) = host.row_of(wrapper) {
                        {
                            let mut selection = self.selection.write();
                            selection.clear();
                            selection.insert(item.clone());
                        }
                        let _guard = self.suppression.enter();
                        host.select_row(row);
                    } else {
                        self.selection.write().clear();
                    }
                }
                self.phase.set(SelectionPhase::Normal);
                reselected = true;
            }
            Some(other) => {
                // A nested collapse finished first; keep the outer one armed.
                *self.pending_reselect.lock() = Some(other);
            }
            None => {}
        }

        if !self.suppression.is_active() {
            self.signals.item_collapsed.emit(item);
        }
        if reselected {
            self.signals.selection_changed.emit(());
        }
    }

    /// The host's selection changed.
    ///
    /// In `Normal` phase this is a user action and the host is ground
    /// truth: the view-space selection is read back, mapped to items, and
    /// adopted. In `Changing`/`Changed` phase it is the echo of a command
    /// this controller issued and is not adopted.
    pub fn notify_selection_changed(&self) {
        if self.suppression.is_active() {
            return;
        }
        match self.phase.get() {
            SelectionPhase::Changing => self.phase.set(SelectionPhase::Changed),
            SelectionPhase::Changed => {}
            SelectionPhase::Normal => {
                let Some(host) = self.host() else {
                    return;
                };
                let mut items = Vec::new();
                for view_row in host.selected_rows() {
                    let Some(wrapper) = host.wrapper_at(view_row) else {
                        continue;
                    };
                    if let Some(item) = self.item_of(wrapper) {
                        items.push(item);
                    }
                }
                let changed = self.selection.write().replace(items);
                if changed {
                    tracing::debug!(target: "trellis::selection", "adopted host selection");
                    self.signals.selection_changed.emit(());
                }
            }
        }
    }

    // =========================================================================
    // Expansion (application API)
    // =========================================================================

    /// Whether the item is currently flagged expanded.
    pub fn is_expanded(&self, item: &TreeItemRef) -> bool {
        item.expanded()
    }

    /// Expands or collapses an item on the application's behalf.
    ///
    /// Expanding a non-expandable item is a no-op. Expanding an item whose
    /// ancestors are collapsed realizes and expands the whole parent chain
    /// first. No `item_*` signals fire for this change.
    pub fn set_expanded(&self, item: &TreeItemRef, expanded: bool) {
        if expanded {
            if !item.expandable() {
                return;
            }
            let Some(host) = self.host() else {
                item.set_expanded(true);
                return;
            };
            let _guard = self.suppression.enter();
            if self.expand_to_item_with(item, &host).is_none() {
                return;
            }
            let Some(wrapper) = self.wrapper_of(item) else {
                return;
            };
            if host.is_expanded(wrapper) {
                item.set_expanded(true);
            } else {
                host.expand(wrapper);
            }
        } else {
            match (self.host(), self.wrapper_of(item)) {
                (Some(host), Some(wrapper)) if host.is_expanded(wrapper) => {
                    let _guard = self.suppression.enter();
                    host.collapse(wrapper);
                }
                _ => item.set_expanded(false),
            }
        }
    }

    /// Expands every expandable item.
    pub fn expand_all(&self) {
        let Some(source) = self.source() else {
            return;
        };
        let _guard = self.suppression.enter();
        self.expand_all_under(&source, source.as_ref(), None);
    }

    fn expand_all_under(
        &self,
        source: &Arc<dyn HasChildren>,
        container: &dyn HasChildren,
        parent: Option<WrapperKey>,
    ) {
        let host = self.host();
        for index in 0..container.child_count() {
            let Some(item) = container.child_at(index) else {
                break;
            };
            if !item.expandable() {
                continue;
            }
            let Ok(key) = self
                .store
                .write()
                .get_or_create(source.as_ref(), parent, index)
            else {
                continue;
            };
            match &host {
                Some(host) if !host.is_expanded(key) => host.expand(key),
                _ => item.set_expanded(true),
            }
            let child_container: &dyn HasChildren = item.as_ref();
            self.expand_all_under(source, child_container, Some(key));
        }
    }

    /// Collapses every expanded item and clears all expansion flags.
    pub fn collapse_all(&self) {
        let Some(source) = self.source() else {
            return;
        };
        let _guard = self.suppression.enter();
        if let Some(host) = self.host() {
            for index in 0..source.child_count() {
                let Some(item) = source.child_at(index) else {
                    break;
                };
                if let Some(key) = self.wrapper_of(&item)
                    && host.is_expanded(key)
                {
                    host.collapse(key);
                }
            }
        }
        clear_expansion_flags(source.as_ref());
    }

    // =========================================================================
    // Rows (application API)
    // =========================================================================

    /// The absolute flattened row of `item` given the current expansion
    /// state, or `None` when the item is not visible.
    ///
    /// Pure arithmetic over the source; nothing is realized or expanded.
    pub fn row_of_item(&self, item: &TreeItemRef) -> Option<usize> {
        let source = self.source()?;
        find_row(source.as_ref(), item)
    }

    /// Realizes and expands the parent chain of `item` in the host, and
    /// returns the item's absolute row.
    ///
    /// Idempotent: ancestors already expanded are left alone, and a second
    /// call returns the same row without raising any expand notifications.
    /// Returns `None` when any link of the chain cannot be resolved.
    pub fn expand_to_item(&self, item: &TreeItemRef) -> Option<usize> {
        let host = self.host()?;
        self.expand_to_item_with(item, &host)
    }

    fn expand_to_item_with(&self, item: &TreeItemRef, host: &Arc<dyn TreeHost>) -> Option<usize> {
        let source = self.source()?;
        let chain = ancestor_chain(item);
        let last = chain.len() - 1;
        let mut absolute = 0usize;
        let mut parent_key: Option<WrapperKey> = None;
        for (depth, link) in chain.iter().enumerate() {
            let (index, local) = match parent_key {
                None => locate_child(source.as_ref(), link)?,
                Some(key) => {
                    let parent_item = self.item_of(key)?;
                    let container: &dyn HasChildren = parent_item.as_ref();
                    locate_child(container, link)?
                }
            };
            absolute = if depth == 0 { local } else { absolute + 1 + local };
            let key = self
                .store
                .write()
                .get_or_create(source.as_ref(), parent_key, index)
                .ok()?;
            if depth < last && !host.is_expanded(key) {
                let _guard = self.suppression.enter();
                host.expand(key);
            }
            parent_key = Some(key);
        }
        Some(absolute)
    }

    // =========================================================================
    // Selection (application API)
    // =========================================================================

    /// Selects `item`, realizing and expanding its parent chain so the row
    /// is visible in the host.
    ///
    /// Returns `false` when the item cannot be resolved (or no host is
    /// attached); the selection is left unchanged in that case. Raises
    /// `selection_changed` exactly once when the selection actually changed,
    /// even though the host echoes the select command back synchronously.
    pub fn select_item(&self, item: &TreeItemRef) -> bool {
        let Some(host) = self.host() else {
            return false;
        };
        self.phase.set(SelectionPhase::Changing);
        let selected = match self.expand_to_item_with(item, &host) {
            Some(row) => {
                let changed = {
                    let mut selection = self.selection.write();
                    if self.multi_select() {
                        selection.insert(item.clone())
                    } else if selection.len() == 1 && selection.contains(ItemKey::of(item)) {
                        false
                    } else {
                        selection.clear();
                        selection.insert(item.clone());
                        true
                    }
                };
                host.select_row(row);
                self.phase.set(SelectionPhase::Changed);
                if changed {
                    self.signals.selection_changed.emit(());
                }
                true
            }
            None => false,
        };
        self.phase.set(SelectionPhase::Normal);
        selected
    }

    /// Removes `item` from the selection.
    pub fn unselect_item(&self, item: &TreeItemRef) {
        let Some(host) = self.host() else {
            return;
        };
        self.phase.set(SelectionPhase::Changing);
        let changed = self.selection.write().remove(ItemKey::of(item));
        if changed
            && let Some(wrapper) = self.wrapper_of(item)
            && let Some(row) = host.row_of(wrapper)
        {
            host.deselect_row(row);
        }
        self.phase.set(SelectionPhase::Changed);
        if changed {
            self.signals.selection_changed.emit(());
        }
        self.phase.set(SelectionPhase::Normal);
    }

    /// Clears the selection.
    pub fn unselect_all(&self) {
        let Some(host) = self.host() else {
            return;
        };
        self.phase.set(SelectionPhase::Changing);
        let changed = self.selection.write().clear();
        host.deselect_all();
        self.phase.set(SelectionPhase::Changed);
        if changed {
            self.signals.selection_changed.emit(());
        }
        self.phase.set(SelectionPhase::Normal);
    }

    /// The selected items, in selection order.
    pub fn selected_items(&self) -> Vec<TreeItemRef> {
        self.selection.read().items()
    }

    /// The first selected item.
    pub fn selected_item(&self) -> Option<TreeItemRef> {
        self.selection.read().first()
    }

    /// Whether `item` is selected.
    pub fn is_item_selected(&self, item: &TreeItemRef) -> bool {
        self.selection.read().contains(ItemKey::of(item))
    }

    // =========================================================================
    // Reload orchestration (application API)
    // =========================================================================

    /// Full reload: the cache is torn down, the host re-pulls everything,
    /// and expansion and selection are restored from the items themselves.
    ///
    /// Items that are no longer reachable fall out of the selection;
    /// `selection_changed` fires exactly once when that happens, and not at
    /// all otherwise.
    pub fn reload_all(&self) {
        let Some(host) = self.host() else {
            self.store.write().invalidate_all();
            return;
        };
        let source = self.source();
        let snapshot = self.selection.read().items();
        let mut dropped = false;
        {
            let _guard = self.suppression.enter();
            self.store.write().invalidate_all();
            host.reload();
            if let Some(source) = &source {
                self.restore_root_expansion(source, &host);
                dropped = self.restore_selection(source, &host, &snapshot, None);
            } else {
                dropped = !snapshot.is_empty();
                self.selection.write().clear();
            }
        }
        tracing::debug!(target: "trellis::reload", dropped, "full reload complete");
        if dropped {
            self.signals.selection_changed.emit(());
        }
    }

    /// Partial reload of one item's subtree.
    ///
    /// The item's descendants are invalidated and re-pulled; the rest of the
    /// tree, and any selection outside the subtree, is untouched. A no-op
    /// when the item was never materialized (the host has nothing to
    /// refresh).
    pub fn reload_item(&self, item: &TreeItemRef) {
        let Some(host) = self.host() else {
            return;
        };
        let Some(wrapper) = self.wrapper_of(item) else {
            return;
        };
        let source = self.source();
        let snapshot = self.selection.read().items();
        let mut dropped = false;
        {
            let _guard = self.suppression.enter();
            self.store.write().invalidate(wrapper);
            host.reload_item(wrapper);
            if item.expanded() && item.expandable() && !host.is_expanded(wrapper) {
                host.expand(wrapper);
            }
            if let Some(source) = &source {
                dropped = self.restore_selection(source, &host, &snapshot, Some(item));
            }
        }
        tracing::debug!(target: "trellis::reload", dropped, "partial reload complete");
        if dropped {
            self.signals.selection_changed.emit(());
        }
    }

    fn restore_root_expansion(&self, source: &Arc<dyn HasChildren>, host: &Arc<dyn TreeHost>) {
        // Deeper levels restore themselves: expanding a root pulls its
        // children, and notify_expanded re-expands any child still flagged
        // expanded.
        for index in 0..source.child_count() {
            let Some(item) = source.child_at(index) else {
                break;
            };
            if !item.expanded() || !item.expandable() {
                continue;
            }
            let created = self
                .store
                .write()
                .get_or_create(source.as_ref(), None, index);
            let Ok(key) = created else {
                continue;
            };
            if !host.is_expanded(key) {
                host.expand(key);
            }
        }
    }

    /// Re-applies the snapshot to the host, dropping items that no longer
    /// resolve to a row. With `scope`, only selection under that item is
    /// re-resolved. Returns whether anything was dropped.
    fn restore_selection(
        &self,
        source: &Arc<dyn HasChildren>,
        host: &Arc<dyn TreeHost>,
        snapshot: &[TreeItemRef],
        scope: Option<&TreeItemRef>,
    ) -> bool {
        let mut kept = Vec::with_capacity(snapshot.len());
        let mut dropped = false;
        for item in snapshot {
            let in_scope = match scope {
                Some(scope) => is_descendant_of(item, scope),
                None => true,
            };
            if !in_scope {
                kept.push(item.clone());
                continue;
            }
            match find_row(source.as_ref(), item) {
                Some(row) => {
                    host.select_row(row);
                    kept.push(item.clone());
                }
                None => dropped = true,
            }
        }
        self.selection.write().replace(kept);
        dropped
    }
}

fn clear_expansion_flags(container: &dyn HasChildren) {
    for index in 0..container.child_count() {
        let Some(item) = container.child_at(index) else {
            break;
        };
        if item.expanded() {
            item.set_expanded(false);
        }
        let child_container: &dyn HasChildren = item.as_ref();
        clear_expansion_flags(child_container);
    }
}

static_assertions::assert_impl_all!(TreeController: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{TreeNode, TreeStore};

    fn sample_store() -> Arc<TreeStore> {
        let store = TreeStore::new();
        let root = TreeNode::new("root");
        TreeNode::add_child(&root, TreeNode::new("leaf"));
        store.add_root(root);
        store
    }

    #[test]
    fn pull_protocol_without_source_is_empty() {
        let controller = TreeController::new();
        assert_eq!(controller.child_count(None), 0);
        assert!(controller.child_at(None, 0).is_none());
        assert!(matches!(
            controller.try_child_at(None, 0),
            Err(Error::NoSource)
        ));
    }

    #[test]
    fn child_at_out_of_range_is_none() {
        let controller = TreeController::new();
        controller.set_source(sample_store());

        assert_eq!(controller.child_count(None), 1);
        assert!(controller.child_at(None, 5).is_none());
    }

    #[test]
    fn child_at_is_identity_stable() {
        let controller = TreeController::new();
        controller.set_source(sample_store());

        let first = controller.child_at(None, 0).unwrap();
        let second = controller.child_at(None, 0).unwrap();
        assert_eq!(first, second);

        let leaf_a = controller.child_at(Some(first), 0).unwrap();
        let leaf_b = controller.child_at(Some(first), 0).unwrap();
        assert_eq!(leaf_a, leaf_b);
    }

    #[test]
    fn set_expanded_without_host_writes_the_flag() {
        let controller = TreeController::new();
        let store = sample_store();
        controller.set_source(store.clone());

        let root = store.child_at(0).unwrap();
        controller.set_expanded(&root, true);
        assert!(root.expanded());
        controller.set_expanded(&root, false);
        assert!(!root.expanded());
    }

    #[test]
    fn expanding_a_leaf_is_a_no_op() {
        let controller = TreeController::new();
        let store = sample_store();
        controller.set_source(store.clone());

        let root = store.child_at(0).unwrap();
        let container: &dyn HasChildren = root.as_ref();
        let leaf = container.child_at(0).unwrap();
        controller.set_expanded(&leaf, true);
        assert!(!leaf.expanded());
    }
}
