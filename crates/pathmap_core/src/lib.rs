//! Maps arbitrarily nested structures into flat, queryable path
//! tables with live links back into the tree.
//!
//! A tree of sequences, mappings and leaves is walked depth-first into
//! one row per node. Rows are addressed by their rendered *real path*
//! (`->a->b->0`), can carry additional application-declared paths and
//! key/value tags, and stay linked to the live tree, so narrowing a
//! [`PathMap`] and replacing values through it updates every other map
//! of the same tree.
//!
//! ```
//! use pathmap_core::{map_tree, TreeValue};
//!
//! let mut map = map_tree(TreeValue::map([(
//!     "a",
//!     TreeValue::map([("b", TreeValue::from("leaf"))]),
//! )]))?;
//! let narrowed = map.select(&["b"])?;
//! assert_eq!(narrowed.real_paths(), ["->a->b"]);
//!
//! map.tree_items().set_by_real_path("->a->b", "replaced")?;
//! assert_eq!(
//!     map.tree_items().by_real_path("->a->b")?,
//!     TreeValue::from("replaced"),
//! );
//! # Ok::<(), pathmap_core::MapError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod items;
mod map;
mod paths;
mod render;
mod table;
mod tree;
mod walker;

pub use error::{MapError, MapResult};
pub use items::{TreeNodeItem, TreeNodeItems};
pub use map::{map_tree, map_tree_with, NodeItemsView, PathMap, Slice, TagView, TreeItemsView};
pub use paths::{TreeNodePath, TreeNodePaths};
pub use table::{
    Dimension, PathMapTable, TagGroups, DEFAULT_META_ATTRIBUTES_GROUP, REAL_PATH_COLUMN,
};
pub use tree::{Leaf, NodeId, PathToken, TreeArena, TreeNode, TreeValue};
pub use walker::{map_tree_items, DefaultMappingBehavior, PathMappingBehavior};

pub use pathmap_index::{
    create_selection_pattern, wh_is, GroupTags, SearchPart, SelectionPattern, TagSet, TagValue,
    WhereSelectable, TREE_NODE_PATH_DELIMITER,
};
