//! The identity cache: stable wrapper handles for logical items.
//!
//! Host controls track expansion and selection against opaque per-row
//! tokens. For that tracking to survive partial refreshes, the engine must
//! hand out the *same* token every time the same logical item is
//! materialized. [`WrapperStore`] provides that guarantee: an arena of
//! wrapper nodes addressed by stable [`WrapperKey`]s, indexed two ways -
//! positionally (parent + child index) and by item identity.
//!
//! Wrappers are created lazily, the first time a position is requested, and
//! torn down in bulk ([`WrapperStore::invalidate_all`]) or per subtree
//! ([`WrapperStore::invalidate`]).

use std::collections::{BTreeMap, HashMap};

use slotmap::{SlotMap, new_key_type};

use crate::error::{Error, Result};
use crate::source::{HasChildren, ItemKey, TreeItemRef};

new_key_type! {
    /// Stable handle to a cached wrapper.
    ///
    /// Copyable and cheap; the host control uses it as its opaque per-row
    /// token. A key stays valid until the wrapper is invalidated.
    pub struct WrapperKey;
}

/// Expansion state machine value, tracked per wrapper.
///
/// Transitions: `Collapsed -> Expanding -> Expanded -> Collapsing ->
/// Collapsed`, driven by the host's notification callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandState {
    /// Not expanded in the host control.
    #[default]
    Collapsed,
    /// The host announced an expand that has not completed yet.
    Expanding,
    /// Expanded in the host control.
    Expanded,
    /// The host announced a collapse that has not completed yet.
    Collapsing,
}

/// One cached wrapper.
pub(crate) struct WrapperNode {
    /// The wrapped logical item. Holding the strong reference keeps the
    /// item's [`ItemKey`] stable for as long as the wrapper lives.
    pub item: TreeItemRef,
    /// Parent wrapper, `None` for root-level wrappers.
    pub parent: Option<WrapperKey>,
    /// Positional sub-map: child index to child wrapper, created on demand.
    pub children: BTreeMap<usize, WrapperKey>,
    /// Current expansion state.
    pub state: ExpandState,
}

/// Arena of wrappers with positional and identity lookup.
#[derive(Default)]
pub(crate) struct WrapperStore {
    arena: SlotMap<WrapperKey, WrapperNode>,
    by_item: HashMap<ItemKey, WrapperKey>,
    roots: BTreeMap<usize, WrapperKey>,
}

impl WrapperStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapper for `(parent, index)`, creating it on first use.
    ///
    /// Positional lookup wins; on a miss the item is fetched from the
    /// source and the identity map is consulted so an item is never wrapped
    /// twice while cached. Re-registering an existing wrapper at a new
    /// position updates its parent link.
    pub fn get_or_create(
        &mut self,
        source: &dyn HasChildren,
        parent: Option<WrapperKey>,
        index: usize,
    ) -> Result<WrapperKey> {
        if let Some(existing) = self.positional(parent, index) {
            return Ok(existing);
        }

        let item = self.fetch_item(source, parent, index)?;
        let item_key = ItemKey::of(&item);

        let key = match self.by_item.get(&item_key).copied() {
            Some(known) if self.arena.contains_key(known) => {
                self.arena[known].parent = parent;
                known
            }
            _ => {
                let key = self.arena.insert(WrapperNode {
                    item,
                    parent,
                    children: BTreeMap::new(),
                    state: ExpandState::Collapsed,
                });
                self.by_item.insert(item_key, key);
                tracing::trace!(
                    target: "trellis::cache",
                    ?key,
                    index,
                    "created wrapper"
                );
                key
            }
        };

        match parent {
            Some(parent_key) => {
                if let Some(node) = self.arena.get_mut(parent_key) {
                    node.children.insert(index, key);
                }
            }
            None => {
                self.roots.insert(index, key);
            }
        }
        Ok(key)
    }

    fn positional(&self, parent: Option<WrapperKey>, index: usize) -> Option<WrapperKey> {
        let key = match parent {
            Some(parent_key) => self.arena.get(parent_key)?.children.get(&index).copied()?,
            None => self.roots.get(&index).copied()?,
        };
        self.contains(key).then_some(key)
    }

    fn fetch_item(
        &self,
        source: &dyn HasChildren,
        parent: Option<WrapperKey>,
        index: usize,
    ) -> Result<TreeItemRef> {
        let container: &dyn HasChildren = match parent {
            Some(parent_key) => {
                let node = self.arena.get(parent_key).ok_or(Error::ItemUnreachable)?;
                node.item.as_ref()
            }
            None => source,
        };
        container
            .child_at(index)
            .ok_or_else(|| Error::child_out_of_range(index, container.child_count()))
    }

    pub fn contains(&self, key: WrapperKey) -> bool {
        self.arena.contains_key(key)
    }

    /// The wrapped item, if the wrapper is still cached.
    pub fn item_of(&self, key: WrapperKey) -> Option<TreeItemRef> {
        self.arena.get(key).map(|node| node.item.clone())
    }

    /// The parent wrapper, `None` for root-level (or unknown) wrappers.
    pub fn parent_of(&self, key: WrapperKey) -> Option<WrapperKey> {
        self.arena.get(key).and_then(|node| node.parent)
    }

    /// Identity lookup: the cached wrapper for an item.
    pub fn wrapper_for_item(&self, item: ItemKey) -> Option<WrapperKey> {
        self.by_item
            .get(&item)
            .copied()
            .filter(|key| self.arena.contains_key(*key))
    }

    /// The already-materialized children of `key`, in child-index order.
    pub fn known_children(&self, key: WrapperKey) -> Vec<WrapperKey> {
        self.arena
            .get(key)
            .map(|node| node.children.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn set_state(&mut self, key: WrapperKey, state: ExpandState) {
        if let Some(node) = self.arena.get_mut(key) {
            node.state = state;
        }
    }

    pub fn state_of(&self, key: WrapperKey) -> ExpandState {
        self.arena
            .get(key)
            .map(|node| node.state)
            .unwrap_or_default()
    }

    /// Clears `key`'s subtree: every descendant wrapper is dropped from the
    /// arena and the identity map, and the positional sub-map is emptied.
    /// The wrapper itself survives.
    pub fn invalidate(&mut self, key: WrapperKey) {
        let children: Vec<WrapperKey> = self
            .arena
            .get(key)
            .map(|node| node.children.values().copied().collect())
            .unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }
        if let Some(node) = self.arena.get_mut(key) {
            node.children.clear();
        }
        tracing::debug!(
            target: "trellis::cache",
            ?key,
            remaining = self.len(),
            "invalidated subtree"
        );
    }

    /// Drops every wrapper (full reload).
    pub fn invalidate_all(&mut self) {
        self.arena.clear();
        self.by_item.clear();
        self.roots.clear();
        tracing::debug!(target: "trellis::cache", "invalidated all wrappers");
    }

    fn remove_subtree(&mut self, key: WrapperKey) {
        if let Some(node) = self.arena.remove(key) {
            self.by_item.remove(&ItemKey::of(&node.item));
            for child in node.children.values() {
                self.remove_subtree(*child);
            }
        }
    }

    /// Number of live wrappers.
    pub fn len(&self) -> usize {
        self.arena.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{TreeNode, TreeStore};
    use crate::source::same_item;

    fn sample_store() -> std::sync::Arc<TreeStore> {
        let store = TreeStore::new();
        let a = TreeNode::new("a");
        TreeNode::add_child(&a, TreeNode::new("a0"));
        TreeNode::add_child(&a, TreeNode::new("a1"));
        store.add_root(a);
        store.add_root(TreeNode::new("b"));
        store
    }

    #[test]
    fn same_position_yields_same_wrapper() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let first = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        let second = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        assert_eq!(first, second);

        let child_a = cache.get_or_create(source.as_ref(), Some(first), 1).unwrap();
        let child_b = cache.get_or_create(source.as_ref(), Some(first), 1).unwrap();
        assert_eq!(child_a, child_b);
        assert_ne!(first, child_a);
    }

    #[test]
    fn out_of_range_is_an_error_not_a_panic() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let err = cache.get_or_create(source.as_ref(), None, 7).unwrap_err();
        assert!(matches!(err, Error::ChildOutOfRange { index: 7, len: 2 }));
    }

    #[test]
    fn invalidate_drops_descendants_but_keeps_the_wrapper() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let root = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        let child = cache.get_or_create(source.as_ref(), Some(root), 0).unwrap();
        assert_eq!(cache.len(), 2);

        cache.invalidate(root);
        assert!(cache.contains(root));
        assert!(!cache.contains(child));
        assert_eq!(cache.len(), 1);

        // Children are recreated on demand - as new wrappers.
        let recreated = cache.get_or_create(source.as_ref(), Some(root), 0).unwrap();
        assert_ne!(recreated, child);
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let root = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        cache.get_or_create(source.as_ref(), Some(root), 0).unwrap();
        cache.invalidate_all();

        assert_eq!(cache.len(), 0);
        assert!(!cache.contains(root));
    }

    #[test]
    fn parent_links_follow_the_positional_structure() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let root = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        let child = cache.get_or_create(source.as_ref(), Some(root), 1).unwrap();

        assert_eq!(cache.parent_of(root), None);
        assert_eq!(cache.parent_of(child), Some(root));
    }

    #[test]
    fn identity_lookup_finds_the_wrapper() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let root = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        let item = cache.item_of(root).unwrap();
        assert_eq!(cache.wrapper_for_item(ItemKey::of(&item)), Some(root));

        let fetched = source.child_at(0).unwrap();
        assert!(same_item(&item, &fetched));
    }

    #[test]
    fn expand_state_round_trips() {
        let source = sample_store();
        let mut cache = WrapperStore::new();

        let root = cache.get_or_create(source.as_ref(), None, 0).unwrap();
        assert_eq!(cache.state_of(root), ExpandState::Collapsed);

        cache.set_state(root, ExpandState::Expanded);
        assert_eq!(cache.state_of(root), ExpandState::Expanded);
    }
}
