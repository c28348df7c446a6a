//! The grid controller: selection synchronization for flat stores under
//! sorting and filtering.
//!
//! [`GridController`] owns the model-space selection set and the
//! model/view projection for one grid host. The application addresses rows
//! by model index (position in the raw store, stable under sort/filter);
//! the host reports selection in view indices. The controller translates
//! between the two and keeps both sides describing the same logical items.
//!
//! The same echo problem as the tree side applies: every select command
//! issued to the host triggers the host's own selection-changed callback on
//! the same call stack. The [`SelectionPhase`] flag and the suppression
//! scope around reloads keep those echoes from double-firing the public
//! signal or overwriting the set mid-update.
//!
//! # Example
//!
//! ```
//! use trellis::GridController;
//! use trellis::node::{GridRow, VecSource};
//!
//! let source = VecSource::new();
//! source.push(GridRow::new("alpha"));
//! source.push(GridRow::new("beta"));
//!
//! let controller = GridController::new();
//! controller.set_source(source);
//! controller.select_row(1);
//!
//! assert_eq!(controller.selected_rows(), vec![1]);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use trellis_core::{Signal, Suppression};

use crate::host::GridHost;
use crate::mapping::{CompareFn, FilterFn, ViewMapping};
use crate::selection::{GridSelection, PhaseFlag, SelectionPhase};
use crate::source::{GridItemRef, GridSource, ItemKey};

/// Signals raised by a [`GridController`].
pub struct GridSignals {
    /// The set of selected rows changed.
    pub selection_changed: Signal<()>,
}

impl GridSignals {
    fn new() -> Self {
        Self {
            selection_changed: Signal::new(),
        }
    }
}

/// Virtualization controller for one grid host.
pub struct GridController {
    source: RwLock<Option<Arc<dyn GridSource>>>,
    mapping: RwLock<ViewMapping>,
    filter: RwLock<Option<FilterFn>>,
    compare: RwLock<Option<CompareFn>>,
    selection: RwLock<GridSelection>,
    /// Item handles for the explicit selection, resolved when the selection
    /// changes. Reload re-matches against these, so selection follows the
    /// items even after the application mutates the store.
    anchors: RwLock<HashMap<usize, GridItemRef>>,
    multi_select: AtomicBool,
    phase: PhaseFlag,
    suppression: Suppression,
    host: RwLock<Option<Arc<dyn GridHost>>>,
    signals: GridSignals,
}

impl Default for GridController {
    fn default() -> Self {
        Self::new_inner()
    }
}

impl GridController {
    fn new_inner() -> Self {
        Self {
            source: RwLock::new(None),
            mapping: RwLock::new(ViewMapping::new()),
            filter: RwLock::new(None),
            compare: RwLock::new(None),
            selection: RwLock::new(GridSelection::new()),
            anchors: RwLock::new(HashMap::new()),
            multi_select: AtomicBool::new(false),
            phase: PhaseFlag::new(),
            suppression: Suppression::new(),
            host: RwLock::new(None),
            signals: GridSignals::new(),
        }
    }

    /// Creates a controller with no source and no host.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::new_inner())
    }

    /// The controller's signals.
    pub fn signals(&self) -> &GridSignals {
        &self.signals
    }

    /// Attaches the host control this controller drives.
    pub fn attach_host(&self, host: Arc<dyn GridHost>) {
        *self.host.write() = Some(host);
    }

    /// Replaces the data source and performs a full reload.
    ///
    /// Selection is preserved by item identity: items of the old source
    /// that are present in the new one stay selected at their new model
    /// indices.
    pub fn set_source(&self, source: Arc<dyn GridSource>) {
        self.reload_with(Some(source));
    }

    /// The current data source.
    pub fn source(&self) -> Option<Arc<dyn GridSource>> {
        self.source.read().clone()
    }

    /// Whether more than one row may be selected at a time.
    pub fn multi_select(&self) -> bool {
        self.multi_select.load(Ordering::SeqCst)
    }

    /// Sets the multi-selection mode. Does not change the current selection.
    pub fn set_multi_select(&self, multi: bool) {
        self.multi_select.store(multi, Ordering::SeqCst);
    }

    fn host(&self) -> Option<Arc<dyn GridHost>> {
        self.host.read().clone()
    }

    // =========================================================================
    // Sort and filter criteria
    // =========================================================================

    /// Sets the filter predicate and recomputes the projection.
    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(&GridItemRef) -> bool + Send + Sync + 'static,
    {
        *self.filter.write() = Some(Arc::new(filter));
        self.invalidate();
    }

    /// Clears the filter, making every row visible again.
    pub fn clear_filter(&self) {
        *self.filter.write() = None;
        self.invalidate();
    }

    /// Sets the sort comparer and recomputes the projection.
    pub fn set_sort<F>(&self, compare: F)
    where
        F: Fn(&GridItemRef, &GridItemRef) -> std::cmp::Ordering + Send + Sync + 'static,
    {
        *self.compare.write() = Some(Arc::new(compare));
        self.invalidate();
    }

    /// Clears the sort, restoring model order.
    pub fn clear_sort(&self) {
        *self.compare.write() = None;
        self.invalidate();
    }

    /// Recomputes the model/view projection and re-applies the visible
    /// selection to the host.
    ///
    /// The model-space selection set is untouched - rows hidden by a filter
    /// stay selected, they just have no view row - so no selection signal
    /// fires.
    pub fn invalidate(&self) {
        let _guard = self.suppression.enter();
        self.rebuild_mapping();
        let Some(host) = self.host() else {
            return;
        };
        host.reload();
        self.apply_selection_to_host(&host);
    }

    fn rebuild_mapping(&self) {
        let source = self.source();
        let filter = self.filter.read().clone();
        let compare = self.compare.read().clone();
        let mut mapping = self.mapping.write();
        match source {
            Some(source) => mapping.rebuild(source.as_ref(), filter.as_ref(), compare.as_ref()),
            None => mapping.clear(),
        }
    }

    /// Pushes the current selection to the host, mapped to view rows.
    /// Callers hold a suppression scope.
    fn apply_selection_to_host(&self, host: &Arc<dyn GridHost>) {
        let (all, view_rows) = {
            let selection = self.selection.read();
            if selection.is_all_selected() {
                (true, Vec::new())
            } else {
                let mapping = self.mapping.read();
                let rows = selection
                    .explicit_rows()
                    .iter()
                    .filter_map(|&model_row| mapping.model_to_view(model_row))
                    .collect();
                (false, rows)
            }
        };
        if all {
            host.select_all();
        } else {
            for view_row in view_rows {
                host.select_row(view_row);
            }
        }
    }

    // =========================================================================
    // Model/view index mapping
    // =========================================================================

    /// Number of currently visible rows.
    pub fn view_row_count(&self) -> usize {
        self.mapping.read().view_row_count()
    }

    /// Maps a model row to its view row; `None` when filtered out.
    pub fn model_to_view(&self, model_row: usize) -> Option<usize> {
        self.mapping.read().model_to_view(model_row)
    }

    /// Maps a view row back to its model row; `None` for rows outside the
    /// current projection.
    pub fn view_to_model(&self, view_row: usize) -> Option<usize> {
        self.mapping.read().view_to_model(view_row)
    }

    // =========================================================================
    // Notification entry point (invoked by the host)
    // =========================================================================

    /// The host's selection changed.
    ///
    /// Adopted as ground truth only in `Normal` phase (a real user action);
    /// in `Changing`/`Changed` phase it is the echo of a command this
    /// controller issued.
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
                let view_rows = host.selected_rows();
                let model_rows: BTreeSet<usize> = {
                    let mapping = self.mapping.read();
                    view_rows
                        .into_iter()
                        .filter_map(|view_row| mapping.view_to_model(view_row))
                        .collect()
                };
                let changed = self.selection.write().replace(model_rows);
                self.refresh_anchors();
                if changed {
                    tracing::debug!(target: "trellis::selection", "adopted host selection");
                    self.signals.selection_changed.emit(());
                }
            }
        }
    }

    // =========================================================================
    // Selection (application API)
    // =========================================================================

    /// Selects the row at `model_row`.
    ///
    /// Clears the previous selection first unless multi-select is enabled.
    /// The host is told to select the corresponding view row when the row is
    /// visible; rows hidden by the filter are still recorded in the set.
    /// Raises `selection_changed` exactly once when the selection actually
    /// changed, despite the host's echoed callback.
    pub fn select_row(&self, model_row: usize) {
        self.phase.set(SelectionPhase::Changing);
        let changed = {
            let mut selection = self.selection.write();
            if self.multi_select() {
                selection.insert(model_row)
            } else if !selection.is_all_selected()
                && selection.explicit_rows().len() == 1
                && selection.is_selected(model_row)
            {
                false
            } else {
                let cleared = selection.clear();
                selection.insert(model_row) || cleared
            }
        };
        self.refresh_anchors();
        if let Some(host) = self.host()
            && let Some(view_row) = self.model_to_view(model_row)
        {
            host.select_row(view_row);
        }
        self.phase.set(SelectionPhase::Changed);
        if changed {
            self.signals.selection_changed.emit(());
        }
        self.phase.set(SelectionPhase::Normal);
    }

    /// Removes the row at `model_row` from the selection.
    pub fn unselect_row(&self, model_row: usize) {
        self.phase.set(SelectionPhase::Changing);
        let row_count = self.source().map(|s| s.count()).unwrap_or(0);
        let changed = self.selection.write().remove(model_row, row_count);
        self.refresh_anchors();
        if changed
            && let Some(host) = self.host()
            && let Some(view_row) = self.model_to_view(model_row)
        {
            host.deselect_row(view_row);
        }
        self.phase.set(SelectionPhase::Changed);
        if changed {
            self.signals.selection_changed.emit(());
        }
        self.phase.set(SelectionPhase::Normal);
    }

    /// Selects every row.
    ///
    /// Sets the all-selected fast path instead of materializing indices;
    /// [`selected_rows`](Self::selected_rows) expands it lazily on read.
    pub fn select_all(&self) {
        self.phase.set(SelectionPhase::Changing);
        let row_count = self.source().map(|s| s.count()).unwrap_or(0);
        let changed = self.selection.write().select_all(row_count);
        self.anchors.write().clear();
        if let Some(host) = self.host() {
            host.select_all();
        }
        self.phase.set(SelectionPhase::Changed);
        if changed {
            self.signals.selection_changed.emit(());
        }
        self.phase.set(SelectionPhase::Normal);
    }

    /// Clears the selection.
    pub fn unselect_all(&self) {
        self.phase.set(SelectionPhase::Changing);
        let changed = self.selection.write().clear();
        self.anchors.write().clear();
        if let Some(host) = self.host() {
            host.deselect_all();
        }
        self.phase.set(SelectionPhase::Changed);
        if changed {
            self.signals.selection_changed.emit(());
        }
        self.phase.set(SelectionPhase::Normal);
    }

    /// The selected model rows in ascending order.
    pub fn selected_rows(&self) -> Vec<usize> {
        let row_count = self.source().map(|s| s.count()).unwrap_or(0);
        self.selection.read().selected_rows(row_count)
    }

    /// Whether the row at `model_row` is selected.
    pub fn is_selected(&self, model_row: usize) -> bool {
        self.selection.read().is_selected(model_row)
    }

    /// Number of selected rows.
    pub fn selected_count(&self) -> usize {
        let selection = self.selection.read();
        if selection.is_all_selected() {
            drop(selection);
            self.source().map(|s| s.count()).unwrap_or(0)
        } else {
            selection.explicit_rows().len()
        }
    }

    // =========================================================================
    // Reload orchestration (application API)
    // =========================================================================

    /// Full reload: the host re-pulls everything, the projection is rebuilt,
    /// and selection is re-matched by item identity.
    ///
    /// `selection_changed` fires exactly once when a previously selected
    /// item is gone from the source, and not at all otherwise - even when
    /// surviving items moved to different model indices.
    pub fn reload_all(&self) {
        self.reload_with(None);
    }

    fn reload_with(&self, new_source: Option<Arc<dyn GridSource>>) {
        let (was_all, snapshot) = self.snapshot_selection();

        if let Some(source) = new_source {
            *self.source.write() = Some(source);
        }

        let mut dropped = false;
        {
            let _guard = self.suppression.enter();
            if let Some(host) = self.host() {
                host.reload();
            }
            self.rebuild_mapping();

            let source = self.source();
            if was_all {
                // Still everything; nothing to re-match.
                if let Some(host) = self.host() {
                    host.select_all();
                }
            } else if let Some(source) = &source {
                let wanted: HashSet<ItemKey> = snapshot.iter().map(ItemKey::of).collect();
                let mut model_rows = BTreeSet::new();
                for model_row in 0..source.count() {
                    let Some(item) = source.item_at(model_row) else {
                        break;
                    };
                    if wanted.contains(&ItemKey::of(&item)) {
                        model_rows.insert(model_row);
                    }
                }
                dropped = model_rows.len() != wanted.len();
                self.selection.write().replace(model_rows);
                self.refresh_anchors();
                if let Some(host) = self.host() {
                    self.apply_selection_to_host(&host);
                }
            } else {
                dropped = !snapshot.is_empty();
                self.selection.write().clear();
                self.anchors.write().clear();
            }
        }
        tracing::debug!(target: "trellis::reload", dropped, "grid reload complete");
        if dropped {
            self.signals.selection_changed.emit(());
        }
    }

    /// The selection by item identity, as resolved when it last changed.
    fn snapshot_selection(&self) -> (bool, Vec<GridItemRef>) {
        if self.selection.read().is_all_selected() {
            return (true, Vec::new());
        }
        (false, self.anchors.read().values().cloned().collect())
    }

    /// Re-resolves the explicit selection to item handles against the
    /// current source. Called whenever the selection changes, while the
    /// indices and the store still agree.
    fn refresh_anchors(&self) {
        let source = self.source();
        let mut anchors = HashMap::new();
        if let Some(source) = &source {
            let selection = self.selection.read();
            if !selection.is_all_selected() {
                for &model_row in selection.explicit_rows() {
                    if let Some(item) = source.item_at(model_row) {
                        anchors.insert(model_row, item);
                    }
                }
            }
        }
        *self.anchors.write() = anchors;
    }
}

static_assertions::assert_impl_all!(GridController: Send, Sync);
