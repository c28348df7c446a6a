//! Model/view index mapping for flat grids.
//!
//! A grid host displays rows in *view* order - the order after the current
//! filter and sort are applied - while the application addresses rows in
//! *model* order, their position in the raw store. [`ViewMapping`] is the
//! bidirectional projection between the two spaces.
//!
//! The mapping is rebuilt whenever the filter, the comparer, or the
//! underlying store changes. A rebuild is O(n) over the store and
//! idempotent: repeated rebuilds with no intervening mutation produce
//! identical mappings (the sort is stable).

use std::cmp::Ordering;
use std::sync::Arc;

use crate::source::{GridItemRef, GridSource};

/// Filter predicate over grid items.
///
/// Returns `true` if the item should be visible, `false` to filter it out.
pub type FilterFn = Arc<dyn Fn(&GridItemRef) -> bool + Send + Sync>;

/// Sort comparer over grid items.
pub type CompareFn = Arc<dyn Fn(&GridItemRef, &GridItemRef) -> Ordering + Send + Sync>;

/// Bidirectional projection between model and view row spaces.
#[derive(Default)]
pub struct ViewMapping {
    /// View row to model row.
    view_to_model: Vec<usize>,
    /// Model row to view row; `None` when filtered out.
    model_to_view: Vec<Option<usize>>,
}

impl ViewMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently visible rows.
    pub fn view_row_count(&self) -> usize {
        self.view_to_model.len()
    }

    /// Number of model rows covered by the last rebuild.
    pub fn model_row_count(&self) -> usize {
        self.model_to_view.len()
    }

    /// Maps a model row to its view row, or `None` when filtered out (or
    /// the model row is outside the last rebuild's range).
    pub fn model_to_view(&self, model_row: usize) -> Option<usize> {
        self.model_to_view.get(model_row).copied().flatten()
    }

    /// Maps a view row back to its model row.
    ///
    /// `None` only for view rows the mapping does not cover, which can
    /// happen when the host reports rows from a stale layout.
    pub fn view_to_model(&self, view_row: usize) -> Option<usize> {
        self.view_to_model.get(view_row).copied()
    }

    /// Drops the projection entirely.
    pub fn clear(&mut self) {
        self.view_to_model.clear();
        self.model_to_view.clear();
    }

    /// Recomputes the projection from the source and the current criteria.
    pub fn rebuild(
        &mut self,
        source: &dyn GridSource,
        filter: Option<&FilterFn>,
        compare: Option<&CompareFn>,
    ) {
        let count = source.count();
        self.view_to_model.clear();
        self.model_to_view.clear();
        self.model_to_view.resize(count, None);

        let mut visible: Vec<(usize, GridItemRef)> = Vec::with_capacity(count);
        for model_row in 0..count {
            // A None here means the source shrank mid-rebuild; the missing
            // tail simply stays unmapped.
            let Some(item) = source.item_at(model_row) else {
                break;
            };
            let keep = filter.map(|filter| filter(&item)).unwrap_or(true);
            if keep {
                visible.push((model_row, item));
            }
        }

        if let Some(compare) = compare {
            visible.sort_by(|a, b| compare(&a.1, &b.1));
        }

        for (view_row, (model_row, _)) in visible.iter().enumerate() {
            self.view_to_model.push(*model_row);
            self.model_to_view[*model_row] = Some(view_row);
        }

        tracing::trace!(
            target: "trellis::mapping",
            model_rows = count,
            view_rows = self.view_to_model.len(),
            "rebuilt view mapping"
        );
    }
}
