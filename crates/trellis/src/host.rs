//! The host-control contract.
//!
//! The engine never paints, scrolls, or handles input; it drives a native
//! list/tree widget - the *host control* - through the narrow command
//! surfaces below, and the host drives the engine back through the pull
//! protocol and notification entry points on the controllers
//! ([`TreeController`](crate::TreeController) /
//! [`GridController`](crate::GridController)).
//!
//! A host implementation holds a direct back-reference to the controller
//! that created it, injected at construction - typically a
//! `Weak<TreeController>` - rather than recovering it through any global
//! lookup table. The integration tests show the pattern.
//!
//! Command methods must be tolerant of redundant calls: expanding an
//! already-expanded wrapper, selecting a selected row, and reloading an
//! empty control are all no-ops, never errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::source::TreeItemRef;
use crate::wrapper::WrapperKey;

/// Commands the engine issues to a tree host.
///
/// View rows are indices into the host's current flattened row layout;
/// wrappers are the stable tokens handed out by the engine's pull protocol.
pub trait TreeHost: Send + Sync {
    /// Expands the given wrapper's row, pulling children through the
    /// engine's data-source protocol as needed.
    fn expand(&self, wrapper: WrapperKey);

    /// Collapses the given wrapper's row.
    fn collapse(&self, wrapper: WrapperKey);

    /// Adds the view row to the host's selection.
    fn select_row(&self, view_row: usize);

    /// Removes the view row from the host's selection.
    fn deselect_row(&self, view_row: usize);

    /// Selects every row.
    fn select_all(&self);

    /// Clears the host's selection.
    fn deselect_all(&self);

    /// Discards all rows and re-pulls from the engine.
    fn reload(&self);

    /// Discards the given wrapper's subtree and re-pulls it.
    fn reload_item(&self, wrapper: WrapperKey);

    /// Current view row of the wrapper, or `None` when not visible.
    fn row_of(&self, wrapper: WrapperKey) -> Option<usize>;

    /// Wrapper displayed at the view row, or `None` when out of range.
    fn wrapper_at(&self, view_row: usize) -> Option<WrapperKey>;

    /// Whether the wrapper's row is currently expanded in the host.
    fn is_expanded(&self, wrapper: WrapperKey) -> bool;

    /// The host's current view-space selection, ascending.
    fn selected_rows(&self) -> Vec<usize>;
}

/// Commands the engine issues to a grid host.
pub trait GridHost: Send + Sync {
    /// Adds the view row to the host's selection.
    fn select_row(&self, view_row: usize);

    /// Removes the view row from the host's selection.
    fn deselect_row(&self, view_row: usize);

    /// Selects every row.
    fn select_all(&self);

    /// Clears the host's selection.
    fn deselect_all(&self);

    /// Discards all rows and re-pulls from the engine.
    fn reload(&self);

    /// The host's current view-space selection, ascending.
    fn selected_rows(&self) -> Vec<usize>;
}

/// Payload of the cancelable `item_expanding` / `item_collapsing` signals.
///
/// Slots receive a shared reference; calling [`cancel`](Self::cancel) from
/// any slot vetoes the transition before any state is mutated. The event is
/// cheaply cloneable - clones share the cancel flag.
#[derive(Clone)]
pub struct ExpandEvent {
    inner: Arc<ExpandEventInner>,
}

struct ExpandEventInner {
    item: TreeItemRef,
    cancelled: AtomicBool,
}

impl ExpandEvent {
    pub(crate) fn new(item: TreeItemRef) -> Self {
        Self {
            inner: Arc::new(ExpandEventInner {
                item,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// The item whose expansion state is about to change.
    pub fn item(&self) -> &TreeItemRef {
        &self.inner.item
    }

    /// Vetoes the transition.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether any slot vetoed the transition.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}
