//! Ready-made data sources.
//!
//! The engine only consumes the traits in [`crate::source`]; applications
//! with an existing store implement those directly. For everything else -
//! and for the test suite - this module provides working implementations:
//!
//! - [`TreeNode`]: an `Arc`-linked hierarchical item
//! - [`TreeStore`]: the root container holding top-level [`TreeNode`]s
//! - [`VecSource`]: a flat, vector-backed grid store
//!
//! # Example
//!
//! ```
//! use trellis::node::{TreeNode, TreeStore};
//! use trellis::source::HasChildren;
//!
//! let store = TreeStore::new();
//! let docs = TreeNode::new("Documents");
//! TreeNode::add_child(&docs, TreeNode::new("report.txt"));
//! store.add_root(docs);
//!
//! assert_eq!(store.child_count(), 1);
//! ```

use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::source::{
    GridItem, GridItemRef, GridSource, HasChildren, HasImage, HasText, ImageId, TreeItem,
    TreeItemRef,
};

/// An `Arc`-linked tree item with a label, an optional image, and an owned
/// expansion flag.
pub struct TreeNode {
    label: String,
    image: Option<ImageId>,
    expanded: AtomicBool,
    parent: RwLock<Weak<TreeNode>>,
    children: RwLock<Vec<Arc<TreeNode>>>,
}

impl TreeNode {
    /// Creates a detached node with the given label.
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            image: None,
            expanded: AtomicBool::new(false),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        })
    }

    /// Creates a node with an image token.
    pub fn with_image(label: impl Into<String>, image: ImageId) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            image: Some(image),
            expanded: AtomicBool::new(false),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        })
    }

    /// Appends `child` to `parent`, fixing up the child's back-reference.
    pub fn add_child(parent: &Arc<Self>, child: Arc<Self>) {
        *child.parent.write() = Arc::downgrade(parent);
        parent.children.write().push(child);
    }

    /// Removes the child at `index`, detaching its back-reference.
    ///
    /// Returns the removed child, or `None` when out of range.
    pub fn remove_child(parent: &Arc<Self>, index: usize) -> Option<Arc<Self>> {
        let mut children = parent.children.write();
        if index >= children.len() {
            return None;
        }
        let child = children.remove(index);
        *child.parent.write() = Weak::new();
        Some(child)
    }

    /// Removes all children.
    pub fn clear_children(&self) {
        let removed = std::mem::take(&mut *self.children.write());
        for child in removed {
            *child.parent.write() = Weak::new();
        }
    }

    /// The node's label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl HasChildren for TreeNode {
    fn child_count(&self) -> usize {
        self.children.read().len()
    }

    fn child_at(&self, index: usize) -> Option<TreeItemRef> {
        self.children
            .read()
            .get(index)
            .cloned()
            .map(|child| child as TreeItemRef)
    }
}

impl TreeItem for TreeNode {
    fn expanded(&self) -> bool {
        self.expanded.load(Ordering::SeqCst)
    }

    fn set_expanded(&self, expanded: bool) {
        self.expanded.store(expanded, Ordering::SeqCst);
    }

    fn parent(&self) -> Option<TreeItemRef> {
        self.parent
            .read()
            .upgrade()
            .map(|parent| parent as TreeItemRef)
    }
}

impl HasText for TreeNode {
    fn text(&self) -> String {
        self.label.clone()
    }
}

impl HasImage for TreeNode {
    fn image(&self) -> Option<ImageId> {
        self.image
    }
}

/// Root container for top-level [`TreeNode`]s.
///
/// A separate type rather than a hidden root node, so that top-level items
/// report no parent and ancestor chains terminate correctly.
#[derive(Default)]
pub struct TreeStore {
    roots: RwLock<Vec<Arc<TreeNode>>>,
}

impl TreeStore {
    /// Creates an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends a top-level node.
    pub fn add_root(&self, node: Arc<TreeNode>) {
        *node.parent.write() = Weak::new();
        self.roots.write().push(node);
    }

    /// Removes the top-level node at `index`.
    pub fn remove_root(&self, index: usize) -> Option<Arc<TreeNode>> {
        let mut roots = self.roots.write();
        if index >= roots.len() {
            return None;
        }
        Some(roots.remove(index))
    }

    /// Removes all nodes.
    pub fn clear(&self) {
        self.roots.write().clear();
    }
}

impl HasChildren for TreeStore {
    fn child_count(&self) -> usize {
        self.roots.read().len()
    }

    fn child_at(&self, index: usize) -> Option<TreeItemRef> {
        self.roots
            .read()
            .get(index)
            .cloned()
            .map(|node| node as TreeItemRef)
    }
}

/// A flat, vector-backed grid store.
#[derive(Default)]
pub struct VecSource {
    items: RwLock<Vec<GridItemRef>>,
}

impl VecSource {
    /// Creates an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a store from existing items.
    pub fn from_items(items: Vec<GridItemRef>) -> Arc<Self> {
        Arc::new(Self {
            items: RwLock::new(items),
        })
    }

    /// Appends an item.
    pub fn push(&self, item: GridItemRef) {
        self.items.write().push(item);
    }

    /// Removes the item at `index`.
    pub fn remove(&self, index: usize) -> Option<GridItemRef> {
        let mut items = self.items.write();
        if index >= items.len() {
            return None;
        }
        Some(items.remove(index))
    }

    /// Replaces the entire contents.
    pub fn replace(&self, items: Vec<GridItemRef>) {
        *self.items.write() = items;
    }

    /// Removes all items.
    pub fn clear(&self) {
        self.items.write().clear();
    }
}

impl GridSource for VecSource {
    fn count(&self) -> usize {
        self.items.read().len()
    }

    fn item_at(&self, index: usize) -> Option<GridItemRef> {
        self.items.read().get(index).cloned()
    }
}

/// A minimal text-labelled grid item.
pub struct GridRow {
    text: String,
}

impl GridRow {
    /// Creates a row with the given label.
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { text: text.into() })
    }
}

impl GridItem for GridRow {}

impl HasText for GridRow {
    fn text(&self) -> String {
        self.text.clone()
    }
}
