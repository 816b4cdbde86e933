//! Tree node paths: ordered token chains rendered as strings.

use pathmap_index::{TagSet, TREE_NODE_PATH_DELIMITER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One path chain: the tokens from the root down to a node.
///
/// Rendering prefixes every token with the path delimiter, so the
/// chain `["a", "b"]` renders as `->a->b`. The empty chain renders as
/// the empty string and doubles as the root marker and as a blank
/// ("not applicable") additional path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeNodePath {
    tokens: Vec<String>,
}

impl TreeNodePath {
    /// Builds a path from tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// The root (and blank) path.
    pub fn root() -> Self {
        Self::default()
    }

    /// The path tokens in root-to-node order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True for the root/blank path.
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    /// This path extended by further tokens.
    pub fn join<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = self.tokens.clone();
        tokens.extend(segments.into_iter().map(Into::into));
        Self { tokens }
    }
}

impl fmt::Display for TreeNodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{}{}", TREE_NODE_PATH_DELIMITER, token)?;
        }
        Ok(())
    }
}

/// The path chains of one node item plus its meta attributes.
///
/// Slot 0 is the real path; slots 1..N are additional, application
/// declared paths, any of which may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNodePaths {
    paths: Vec<TreeNodePath>,
    meta_attributes: TagSet,
}

impl TreeNodePaths {
    /// Builds path chains with meta attributes.
    pub fn new(paths: Vec<TreeNodePath>, meta_attributes: TagSet) -> Self {
        let paths = if paths.is_empty() {
            vec![TreeNodePath::root()]
        } else {
            paths
        };
        Self {
            paths,
            meta_attributes,
        }
    }

    /// The root chains: a single root path, no attributes.
    pub fn root() -> Self {
        Self::new(vec![TreeNodePath::root()], TagSet::new())
    }

    /// The real path (slot 0).
    pub fn real_path(&self) -> &TreeNodePath {
        &self.paths[0]
    }

    /// The path at `slot`, if declared.
    pub fn path(&self, slot: usize) -> Option<&TreeNodePath> {
        self.paths.get(slot)
    }

    /// Number of declared path slots (at least 1).
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; slot 0 exists in every instance.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The node's meta attributes.
    pub fn meta_attributes(&self) -> &TagSet {
        &self.meta_attributes
    }

    /// Merges additional meta attributes, overwriting existing keys.
    pub fn add_meta_attributes(&mut self, attributes: &TagSet) {
        self.meta_attributes.extend(attributes);
    }

    /// Declares or replaces the additional path at `slot` (>= 1).
    ///
    /// Intermediate slots are filled with blank paths. Slot 0 is the
    /// real path and is not assignable; requests for it are ignored.
    pub fn set_path(&mut self, slot: usize, path: TreeNodePath) {
        if slot == 0 {
            return;
        }
        while self.paths.len() <= slot {
            self.paths.push(TreeNodePath::root());
        }
        self.paths[slot] = path;
    }

    /// Builds the chains of a child node.
    ///
    /// `segments[0]` extends the real path. For each additional slot an
    /// empty segment list yields a blank child path; a non-empty one
    /// extends the parent's path in that slot (blank parent paths act
    /// as a fresh root). The child inherits this node's meta attributes
    /// merged with `meta_attributes`.
    pub fn join(&self, segments: &[Vec<String>], meta_attributes: TagSet) -> Self {
        let slots = segments.len().max(self.paths.len());
        let mut paths = Vec::with_capacity(slots);
        for slot in 0..slots {
            let parent = self.paths.get(slot).cloned().unwrap_or_default();
            let segment = segments.get(slot);
            let child = match segment {
                Some(tokens) if !tokens.is_empty() => parent.join(tokens.iter().cloned()),
                Some(_) => TreeNodePath::root(),
                // Slots the child does not redeclare stay blank.
                None => TreeNodePath::root(),
            };
            paths.push(child);
        }
        let mut merged = self.meta_attributes.clone();
        merged.extend(&meta_attributes);
        Self::new(paths, merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathmap_index::TagValue;

    #[test]
    fn rendering_prefixes_every_token() {
        let path = TreeNodePath::new(["a", "b", "c"]);
        assert_eq!(path.to_string(), "->a->b->c");
        assert_eq!(TreeNodePath::root().to_string(), "");
    }

    #[test]
    fn join_extends_real_path() {
        let root = TreeNodePaths::root();
        let child = root.join(&[vec!["a".to_string()]], TagSet::new());
        assert_eq!(child.real_path().to_string(), "->a");
    }

    #[test]
    fn blank_segment_yields_blank_additional_path() {
        let root = TreeNodePaths::root();
        let first = root.join(
            &[vec!["a".to_string()], vec!["x".to_string()]],
            TagSet::from_pairs([("k1", 1i64)]),
        );
        let second = first.join(&[vec!["b".to_string()], vec![]], TagSet::new());
        assert_eq!(second.real_path().to_string(), "->a->b");
        assert!(second.path(1).unwrap().is_blank());
    }

    #[test]
    fn blank_parent_path_acts_as_root() {
        let root = TreeNodePaths::root();
        let first = root.join(&[vec!["a".to_string()], vec![]], TagSet::new());
        let second = first.join(
            &[vec!["d".to_string()], vec!["y".to_string()]],
            TagSet::new(),
        );
        assert_eq!(second.path(1).unwrap().to_string(), "->y");
    }

    #[test]
    fn meta_attributes_are_inherited_and_overridden() {
        let root = TreeNodePaths::root();
        let first = root.join(
            &[vec!["a".to_string()]],
            TagSet::from_pairs([("k1", TagValue::from(2i64)), ("k2", TagValue::from("n"))]),
        );
        let second = first.join(
            &[vec!["d".to_string()]],
            TagSet::from_pairs([("k2", TagValue::from("m"))]),
        );
        assert_eq!(second.meta_attributes().get("k1"), Some(&TagValue::Int(2)));
        assert_eq!(
            second.meta_attributes().get("k2"),
            Some(&TagValue::Text("m".to_string()))
        );
    }

    #[test]
    fn set_path_ignores_the_real_path_slot() {
        let mut paths = TreeNodePaths::root();
        paths.set_path(0, TreeNodePath::new(["hijack"]));
        assert_eq!(paths.real_path().to_string(), "");
        paths.set_path(2, TreeNodePath::new(["late"]));
        assert_eq!(paths.len(), 3);
        assert!(paths.path(1).unwrap().is_blank());
        assert_eq!(paths.path(2).unwrap().to_string(), "->late");
    }
}
