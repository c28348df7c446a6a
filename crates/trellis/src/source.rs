//! Data-source traits consumed by the engine.
//!
//! Applications expose their data to the engine through a small set of
//! composable capability traits rather than one deep item base class. A
//! concrete item type implements exactly the capabilities it has:
//!
//! - [`HasChildren`] - recursive container access
//! - [`HasText`] - a display label the host can render
//! - [`HasImage`] - an opaque image token the host resolves
//! - [`TreeItem`] - the full tree-item contract (children + expansion state
//!   + parent back-reference)
//! - [`GridItem`] / [`GridSource`] - flat stores that participate only in
//!   the model/view projection
//!
//! Items have reference semantics: they are handled as `Arc` trait objects
//! and compared by pointer identity ([`ItemKey`]), never by value. The
//! engine treats the item graph as read-only with a single exception: it
//! writes the expansion flag back through [`TreeItem::set_expanded`].
//!
//! Accessors on these traits are invoked while the engine holds internal
//! locks, so an implementation must not call back into the controller that
//! is querying it.

use std::sync::Arc;

/// Shared handle to a tree item.
pub type TreeItemRef = Arc<dyn TreeItem>;

/// Shared handle to a flat grid item.
pub type GridItemRef = Arc<dyn GridItem>;

/// Capability: the item is a recursive container.
///
/// `child_at` returns `None` for an out-of-range index. The engine relies on
/// this instead of panicking when a source shrinks between two queries.
pub trait HasChildren: Send + Sync {
    /// Number of direct children.
    fn child_count(&self) -> usize;

    /// Direct child at `index`, or `None` when out of range.
    fn child_at(&self, index: usize) -> Option<TreeItemRef>;
}

/// Capability: the item has a display label.
pub trait HasText {
    /// The primary display text for this item.
    fn text(&self) -> String;
}

/// An opaque image token.
///
/// The engine never interprets the value; hosts map it to whatever image
/// resource they manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u64);

/// Capability: the item has an associated image.
pub trait HasImage {
    /// The image token, or `None` for no image.
    fn image(&self) -> Option<ImageId> {
        None
    }
}

/// The full contract for hierarchical items.
///
/// The expansion flag is owned by the item itself so that it survives any
/// cache invalidation inside the engine; `set_expanded` is the only write
/// the engine ever performs on application data.
pub trait TreeItem: HasChildren {
    /// Whether the item can be expanded at all.
    ///
    /// The default derives this from `child_count`. Override for lazily
    /// loaded items that report expandability before their children exist.
    fn expandable(&self) -> bool {
        self.child_count() > 0
    }

    /// Current expansion state of this item.
    fn expanded(&self) -> bool;

    /// Writes the expansion state back to the item.
    fn set_expanded(&self, expanded: bool);

    /// The parent item, or `None` for a root-level item.
    ///
    /// This is a back-reference, never an ownership edge.
    fn parent(&self) -> Option<TreeItemRef>;
}

/// Marker for items held in flat grid stores.
///
/// Grid items carry no structure the engine cares about; they exist so the
/// engine can track identity across reloads and sort/filter projections.
pub trait GridItem: Send + Sync {}

/// A flat data store consumed by [`GridController`](crate::GridController).
///
/// `item_at` returns `None` for an out-of-range index, mirroring
/// [`HasChildren::child_at`].
pub trait GridSource: Send + Sync {
    /// Number of items in the store.
    fn count(&self) -> usize;

    /// Item at `index` in model order, or `None` when out of range.
    fn item_at(&self, index: usize) -> Option<GridItemRef>;
}

/// Reference identity of an item.
///
/// Derived from the `Arc`'s data pointer, so two handles to the same
/// allocation compare equal regardless of which trait object they travel
/// as. Valid only while something keeps the item alive; the engine's caches
/// hold strong references for exactly that reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey(usize);

impl ItemKey {
    /// The identity of the given item handle.
    pub fn of<T: ?Sized>(item: &Arc<T>) -> Self {
        Self(Arc::as_ptr(item) as *const () as usize)
    }
}

/// Returns `true` when two handles refer to the same item.
pub fn same_item<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    ItemKey::of(a) == ItemKey::of(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeNode;

    #[test]
    fn item_key_is_reference_identity() {
        let a = TreeNode::new("a");
        let b = TreeNode::new("a");

        assert_eq!(ItemKey::of(&a), ItemKey::of(&a.clone()));
        assert_ne!(ItemKey::of(&a), ItemKey::of(&b));
    }

    #[test]
    fn item_key_survives_trait_object_conversion() {
        let node = TreeNode::new("n");
        let as_item: TreeItemRef = node.clone();

        assert!(same_item(&node, &as_item));
    }
}
