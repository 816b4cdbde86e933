//! Nested tree values and the arena that owns a mapped tree.
//!
//! A mapped tree lives in a [`TreeArena`]; node items refer back into
//! it with [`NodeId`] handles instead of references, so replacing a
//! subtree cannot leave dangling pointers. Freed slots are tombstoned
//! and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A terminal value of a nested tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Leaf {
    /// Absence of a value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Textual value.
    Text(String),
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Null => write!(f, "null"),
            Leaf::Bool(value) => write!(f, "{}", value),
            Leaf::Int(value) => write!(f, "{}", value),
            Leaf::Float(value) => write!(f, "{}", value),
            Leaf::Text(value) => write!(f, "{}", value),
        }
    }
}

/// An owned nested structure: ordered sequences and key-unique
/// mappings terminated by leaves.
///
/// Mapping keys keep their declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeValue {
    /// An ordered sequence, addressed by 0-based index.
    Seq(Vec<TreeValue>),
    /// A key-unique mapping, addressed by declared key.
    Map(Vec<(String, TreeValue)>),
    /// A terminal value.
    Leaf(Leaf),
}

impl TreeValue {
    /// Builds a leaf value.
    pub fn leaf(value: impl Into<Leaf>) -> Self {
        TreeValue::Leaf(value.into())
    }

    /// Builds a mapping from key/value pairs, keeping their order.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, TreeValue)>,
    {
        TreeValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Builds a sequence.
    pub fn seq<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = TreeValue>,
    {
        TreeValue::Seq(entries.into_iter().collect())
    }

    /// True if this value is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeValue::Leaf(_))
    }
}

impl From<&str> for Leaf {
    fn from(value: &str) -> Self {
        Leaf::Text(value.to_string())
    }
}

impl From<String> for Leaf {
    fn from(value: String) -> Self {
        Leaf::Text(value)
    }
}

impl From<i64> for Leaf {
    fn from(value: i64) -> Self {
        Leaf::Int(value)
    }
}

impl From<bool> for Leaf {
    fn from(value: bool) -> Self {
        Leaf::Bool(value)
    }
}

impl From<f64> for Leaf {
    fn from(value: f64) -> Self {
        Leaf::Float(value)
    }
}

impl From<Leaf> for TreeValue {
    fn from(value: Leaf) -> Self {
        TreeValue::Leaf(value)
    }
}

impl From<&str> for TreeValue {
    fn from(value: &str) -> Self {
        TreeValue::Leaf(Leaf::from(value))
    }
}

impl From<String> for TreeValue {
    fn from(value: String) -> Self {
        TreeValue::Leaf(Leaf::from(value))
    }
}

impl From<i64> for TreeValue {
    fn from(value: i64) -> Self {
        TreeValue::Leaf(Leaf::from(value))
    }
}

impl From<bool> for TreeValue {
    fn from(value: bool) -> Self {
        TreeValue::Leaf(Leaf::from(value))
    }
}

impl From<f64> for TreeValue {
    fn from(value: f64) -> Self {
        TreeValue::Leaf(Leaf::from(value))
    }
}

impl From<serde_json::Value> for TreeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TreeValue::Leaf(Leaf::Null),
            serde_json::Value::Bool(value) => TreeValue::Leaf(Leaf::Bool(value)),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    TreeValue::Leaf(Leaf::Int(int))
                } else {
                    TreeValue::Leaf(Leaf::Float(number.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(value) => TreeValue::Leaf(Leaf::Text(value)),
            serde_json::Value::Array(entries) => {
                TreeValue::Seq(entries.into_iter().map(TreeValue::from).collect())
            }
            serde_json::Value::Object(entries) => TreeValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, TreeValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// The key or index a node occupies within its parent container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathToken {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Key(key) => write!(f, "{}", key),
            PathToken::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Handle to a node inside a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A node stored in the arena: children are handles, not values.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Sequence container.
    Seq(Vec<NodeId>),
    /// Mapping container with declared key order.
    Map(Vec<(String, NodeId)>),
    /// Terminal value.
    Leaf(Leaf),
}

/// Owns the nodes of one mapped tree.
///
/// The arena is created by moving a [`TreeValue`] in; all later access
/// and mutation goes through [`NodeId`] handles. Replacing a child
/// frees the replaced subtree; freed slots stay tombstoned so stale
/// handles resolve to `None` instead of aliasing new nodes.
#[derive(Debug, Clone)]
pub struct TreeArena {
    nodes: Vec<Option<TreeNode>>,
    root: NodeId,
}

impl TreeArena {
    /// Moves `value` into a fresh arena.
    pub fn new(value: TreeValue) -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        arena.root = arena.alloc(value);
        arena
    }

    /// The root node of the arena.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node behind `id`, if it has not been freed.
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// True if `id` resolves to a leaf node.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(TreeNode::Leaf(_)))
    }

    /// The children of a container node as `(token, child)` pairs, in
    /// declared order. Leaves and freed nodes have no children.
    pub fn children(&self, id: NodeId) -> Vec<(PathToken, NodeId)> {
        match self.node(id) {
            Some(TreeNode::Seq(entries)) => entries
                .iter()
                .enumerate()
                .map(|(index, &child)| (PathToken::Index(index), child))
                .collect(),
            Some(TreeNode::Map(entries)) => entries
                .iter()
                .map(|(key, child)| (PathToken::Key(key.clone()), *child))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The child of `parent` at `token`, if present.
    pub fn child_of(&self, parent: NodeId, token: &PathToken) -> Option<NodeId> {
        match (self.node(parent), token) {
            (Some(TreeNode::Seq(entries)), PathToken::Index(index)) => {
                entries.get(*index).copied()
            }
            (Some(TreeNode::Map(entries)), PathToken::Key(key)) => entries
                .iter()
                .find(|(existing, _)| existing == key)
                .map(|(_, child)| *child),
            _ => None,
        }
    }

    /// Materializes the subtree under `id` as an owned value.
    pub fn value_of(&self, id: NodeId) -> Option<TreeValue> {
        match self.node(id)? {
            TreeNode::Leaf(leaf) => Some(TreeValue::Leaf(leaf.clone())),
            TreeNode::Seq(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for &child in entries {
                    values.push(self.value_of(child)?);
                }
                Some(TreeValue::Seq(values))
            }
            TreeNode::Map(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for (key, child) in entries {
                    values.push((key.clone(), self.value_of(*child)?));
                }
                Some(TreeValue::Map(values))
            }
        }
    }

    /// Replaces the child of `parent` at `token` with `value`.
    ///
    /// The previous subtree at that position is freed. Returns the new
    /// child's handle, or `None` when `parent`/`token` do not resolve
    /// to an existing slot (new keys are appended to mappings).
    pub fn set_child(
        &mut self,
        parent: NodeId,
        token: &PathToken,
        value: TreeValue,
    ) -> Option<NodeId> {
        let previous = self.child_of(parent, token);
        let fresh = self.alloc(value);
        match (self.nodes.get_mut(parent.0)?.as_mut()?, token) {
            (TreeNode::Seq(entries), PathToken::Index(index)) => {
                let slot = entries.get_mut(*index)?;
                *slot = fresh;
            }
            (TreeNode::Map(entries), PathToken::Key(key)) => {
                match entries.iter_mut().find(|(existing, _)| existing == key) {
                    Some(entry) => entry.1 = fresh,
                    None => entries.push((key.clone(), fresh)),
                }
            }
            _ => return None,
        }
        if let Some(previous) = previous {
            self.free_subtree(previous);
        }
        Some(fresh)
    }

    /// Frees `id` and every node below it.
    pub fn free_subtree(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).into_iter().map(|(_, child)| child).collect();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    fn alloc(&mut self, value: TreeValue) -> NodeId {
        match value {
            TreeValue::Leaf(leaf) => self.push(TreeNode::Leaf(leaf)),
            TreeValue::Seq(entries) => {
                let children: Vec<NodeId> =
                    entries.into_iter().map(|entry| self.alloc(entry)).collect();
                self.push(TreeNode::Seq(children))
            }
            TreeValue::Map(entries) => {
                let children: Vec<(String, NodeId)> = entries
                    .into_iter()
                    .map(|(key, entry)| (key, self.alloc(entry)))
                    .collect();
                self.push(TreeNode::Map(children))
            }
        }
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }
}
