//! Node items: the mapped record of one tree position.

use crate::paths::{TreeNodePath, TreeNodePaths};
use crate::tree::{NodeId, PathToken, TreeArena};
use pathmap_index::TagSet;
use std::collections::HashMap;
use std::fmt;

/// The mapped record for one tree position: paths, meta attributes and
/// a live link back to the container the node sits in.
///
/// The link is a [`NodeId`] handle to the parent container plus the
/// key or index the node occupies there; the item never owns tree
/// data. The synthetic root item has neither.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNodeItem {
    paths: TreeNodePaths,
    parent_node: Option<NodeId>,
    real_key: Option<PathToken>,
}

impl TreeNodeItem {
    /// Creates an item from its path chains and live link.
    pub fn new(paths: TreeNodePaths, parent_node: NodeId, real_key: PathToken) -> Self {
        Self {
            paths,
            parent_node: Some(parent_node),
            real_key: Some(real_key),
        }
    }

    /// The synthetic root item used as the walker's implicit parent.
    pub fn synthetic_root() -> Self {
        Self {
            paths: TreeNodePaths::root(),
            parent_node: None,
            real_key: None,
        }
    }

    /// The rendered real path.
    pub fn real_path(&self) -> String {
        self.paths.real_path().to_string()
    }

    /// All path chains, real path first.
    pub fn tree_node_paths(&self) -> &TreeNodePaths {
        &self.paths
    }

    /// The rendered path of `slot`; blank paths render empty.
    pub fn rendered_path(&self, slot: usize) -> String {
        self.paths
            .path(slot)
            .map(|path| path.to_string())
            .unwrap_or_default()
    }

    /// The item's meta attributes.
    pub fn meta_attributes(&self) -> &TagSet {
        self.paths.meta_attributes()
    }

    /// Merges meta attributes into the item.
    pub fn add_meta_attributes(&mut self, attributes: &TagSet) {
        self.paths.add_meta_attributes(attributes);
    }

    /// Declares or replaces an additional path (slot >= 1).
    pub fn set_tree_path(&mut self, slot: usize, path: TreeNodePath) {
        self.paths.set_path(slot, path);
    }

    /// Handle to the parent container; `None` for the synthetic root.
    pub fn parent_node(&self) -> Option<NodeId> {
        self.parent_node
    }

    /// The key/index within the parent container.
    pub fn real_key(&self) -> Option<&PathToken> {
        self.real_key.as_ref()
    }

    /// True for the synthetic root item.
    pub fn is_root(&self) -> bool {
        self.parent_node.is_none()
    }

    /// Resolves the node this item points at inside `tree`.
    ///
    /// The root item resolves to the arena root. Returns `None` when
    /// the container no longer holds the item's key.
    pub fn node_id(&self, tree: &TreeArena) -> Option<NodeId> {
        match (&self.parent_node, &self.real_key) {
            (Some(parent), Some(key)) => tree.child_of(*parent, key),
            _ => Some(tree.root()),
        }
    }

    /// Builds the item of a child node.
    pub fn join(
        &self,
        segments: &[Vec<String>],
        meta_attributes: TagSet,
        parent_node: NodeId,
        real_key: PathToken,
    ) -> Self {
        Self::new(
            self.paths.join(segments, meta_attributes),
            parent_node,
            real_key,
        )
    }
}

impl fmt::Display for TreeNodeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeNodeItem({})", self.real_path())
    }
}

/// Insertion-ordered collection of node items keyed by real path.
///
/// A vector and a position map are kept in lockstep; adding an item
/// whose real path is already present replaces it in place.
#[derive(Debug, Clone, Default)]
pub struct TreeNodeItems {
    items: Vec<TreeNodeItem>,
    positions: HashMap<String, usize>,
}

impl TreeNodeItems {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from items, in order.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = TreeNodeItem>,
    {
        let mut collection = Self::new();
        for item in items {
            collection.add(item);
        }
        collection
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the collection holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one item, replacing any item with the same real path.
    /// Returns the item's real path.
    pub fn add(&mut self, item: TreeNodeItem) -> String {
        let real_path = item.real_path();
        match self.positions.get(&real_path) {
            Some(&position) => self.items[position] = item,
            None => {
                self.positions.insert(real_path.clone(), self.items.len());
                self.items.push(item);
            }
        }
        real_path
    }

    /// Adds many items; returns their real paths in input order.
    pub fn add_many(&mut self, items: TreeNodeItems) -> Vec<String> {
        items
            .items
            .into_iter()
            .map(|item| self.add(item))
            .collect()
    }

    /// Drops the items at the given real paths; unknown paths are
    /// ignored.
    pub fn drop_items(&mut self, real_paths: &[String]) {
        if real_paths.is_empty() {
            return;
        }
        for real_path in real_paths {
            self.positions.remove(real_path);
        }
        let positions = &self.positions;
        self.items
            .retain(|item| positions.contains_key(&item.real_path()));
        self.reindex();
    }

    /// The item at `real_path`.
    pub fn get(&self, real_path: &str) -> Option<&TreeNodeItem> {
        self.positions
            .get(real_path)
            .map(|&position| &self.items[position])
    }

    /// True if `real_path` is present.
    pub fn contains(&self, real_path: &str) -> bool {
        self.positions.contains_key(real_path)
    }

    /// The items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNodeItem> {
        self.items.iter()
    }

    /// The real paths in insertion order.
    pub fn real_paths(&self) -> Vec<String> {
        self.items.iter().map(|item| item.real_path()).collect()
    }

    fn reindex(&mut self) {
        self.positions = self
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.real_path(), position))
            .collect();
    }
}
