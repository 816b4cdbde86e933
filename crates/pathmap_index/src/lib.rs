//! # pathmap_index
//!
//! Low-level building blocks for the pathmap engine.
//!
//! This crate knows nothing about nested trees. It provides:
//!
//! - [`SelectionPattern`] - a small `*`-wildcard matcher over rendered
//!   tree paths, used for prefix and sub-path scans
//! - [`PathIndex`] - an insertion-ordered table keyed by rendered real
//!   path, with named columns, positional row splicing and deletion
//! - [`GroupTags`] and the [`WhereSelectable`] capability - secondary
//!   indices associating arbitrary key/value tags with real paths,
//!   queryable by equality on a composite where string
//!
//! Rows are plain strings; the engine in `pathmap_core` owns all tree
//! semantics and keeps this table in sync with its node collection.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod pattern;
mod table;
mod tags;

pub use pattern::{create_selection_pattern, SelectionPattern};
pub use table::{PathIndex, PathIndexRow, SearchPart};
pub use tags::{
    wh_is, GroupTags, TagSet, TagValue, WhereSelectable, TAG_KEY_VALUE_DELIMITER,
    TAG_WHERE_BOUNDARY,
};

/// Delimiter between the tokens of a rendered tree path (`->a->b`).
pub const TREE_NODE_PATH_DELIMITER: &str = "->";
