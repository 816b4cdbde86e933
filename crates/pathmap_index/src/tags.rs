//! Tag storage: per-path key/value tags queryable by equality.
//!
//! Every tagged row carries a composite *where string*, a canonical
//! `//key/value//key/value//` encoding of its tags. Equality queries
//! (`where_select`) are substring scans over that encoding, which keeps
//! the query path free of per-row map lookups.

use crate::pattern::SelectionPattern;
use crate::table::SearchPart;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Delimiter between a tag key and its value inside a where string.
pub const TAG_KEY_VALUE_DELIMITER: &str = "/";

/// Boundary between the tag entries of a where string.
pub const TAG_WHERE_BOUNDARY: &str = "//";

/// A tag value: text or integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagValue {
    /// Textual value.
    Text(String),
    /// Integer value.
    Int(i64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(value) => write!(f, "{}", value),
            TagValue::Int(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

/// An ordered set of key/value tags.
///
/// Keys are unique; inserting an existing key overwrites its value in
/// place, preserving the original position. Order is significant
/// because it drives the composite where string and rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    entries: Vec<(String, TagValue)>,
}

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tag set from key/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<TagValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut tags = Self::new();
        for (key, value) in pairs {
            tags.insert(key.into(), value.into());
        }
        tags
    }

    /// Inserts or overwrites one tag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TagValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Merges `other` into this set, overwriting existing keys.
    pub fn extend(&mut self, other: &TagSet) {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Iterates the tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, TagValue)> {
        self.entries.iter()
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no tags are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the composite where string, e.g. `//k1/1//k2/m//`.
    ///
    /// An empty set renders as `////`.
    pub fn where_string(&self) -> String {
        if self.entries.is_empty() {
            return format!("{}{}", TAG_WHERE_BOUNDARY, TAG_WHERE_BOUNDARY);
        }
        let inner = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}{}{}", key, TAG_KEY_VALUE_DELIMITER, value))
            .collect::<Vec<String>>()
            .join(TAG_WHERE_BOUNDARY);
        format!("{}{}{}", TAG_WHERE_BOUNDARY, inner, TAG_WHERE_BOUNDARY)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// Builds a `key/value` where-part with the correct delimiter.
///
/// ```
/// use pathmap_index::wh_is;
///
/// assert_eq!(wh_is("category", "foo"), "category/foo");
/// ```
pub fn wh_is(key: &str, value: impl Into<TagValue>) -> String {
    format!("{}{}{}", key, TAG_KEY_VALUE_DELIMITER, value.into())
}

/// Capability of a tag group: equality selection and tag writes.
///
/// Groups are registered by name; implementations own their storage
/// schema. Row removal exists so the engine can cascade-drop tag rows
/// together with table rows.
pub trait WhereSelectable {
    /// The group's registered name.
    fn name(&self) -> &str;

    /// Restricts `pre_selection` (default: every tagged row, in
    /// insertion order) to rows whose where string matches every part.
    ///
    /// Parts combine with AND; a part's alternatives combine with OR.
    /// A part like `category/foo` matches rows whose where string
    /// contains `//category/foo//`; `*` wildcards are allowed.
    fn where_select(&self, parts: &[SearchPart], pre_selection: Option<&[String]>)
        -> Vec<String>;

    /// Overwrites the given tags for exactly `keys`, recomputing each
    /// affected row's where string.
    fn tag(&mut self, keys: &[String], values: &TagSet);

    /// Removes the rows for `keys`, if tagged.
    fn remove(&mut self, keys: &[String]);

    /// Tag keys seen so far, in first-seen order.
    fn columns(&self) -> Vec<String>;

    /// The tag set of one row.
    fn row(&self, key: &str) -> Option<&TagSet>;

    /// The composite where string of one row.
    fn where_string(&self, key: &str) -> Option<&str>;
}

/// One row of a tag group: its tags plus the cached where string.
#[derive(Debug, Clone)]
struct TagRow {
    values: TagSet,
    where_string: String,
}

impl TagRow {
    fn new(values: TagSet) -> Self {
        let where_string = values.where_string();
        Self {
            values,
            where_string,
        }
    }
}

/// The standard tag group implementation.
///
/// Rows may carry heterogeneous key sets; `columns` reports the union
/// of all keys in first-seen order. This covers both the default
/// meta-attribute group (seeded once at table construction) and
/// user-registered groups (created empty, populated via `tag`).
#[derive(Debug, Clone, Default)]
pub struct GroupTags {
    name: String,
    rows: HashMap<String, TagRow>,
    /// Row keys in first-tagged order, for scans without a pre-selection.
    order: Vec<String>,
    columns: Vec<String>,
}

impl GroupTags {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a group pre-populated from `(key, tags)` pairs.
    pub fn with_rows<I>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = (String, TagSet)>,
    {
        let mut group = Self::new(name);
        for (key, values) in rows {
            group.note_columns(&values);
            if !group.rows.contains_key(&key) {
                group.order.push(key.clone());
            }
            group.rows.insert(key, TagRow::new(values));
        }
        group
    }

    /// Number of tagged rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no row is tagged.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn note_columns(&mut self, values: &TagSet) {
        for key in values.keys() {
            if !self.columns.iter().any(|existing| existing == key) {
                self.columns.push(key.to_string());
            }
        }
    }

    fn part_matches(&self, part: &SearchPart, where_string: &str) -> bool {
        part.alternatives().iter().any(|alternative| {
            if alternative == "*" {
                return true;
            }
            let pattern = SelectionPattern::compile(&format!(
                "*{}{}{}*",
                TAG_WHERE_BOUNDARY, alternative, TAG_WHERE_BOUNDARY
            ));
            pattern.matches(where_string)
        })
    }
}

impl WhereSelectable for GroupTags {
    fn name(&self) -> &str {
        &self.name
    }

    fn where_select(
        &self,
        parts: &[SearchPart],
        pre_selection: Option<&[String]>,
    ) -> Vec<String> {
        let candidates: Vec<&String> = match pre_selection {
            Some(keys) => keys.iter().collect(),
            None => self.order.iter().collect(),
        };
        candidates
            .into_iter()
            .filter(|key| match self.rows.get(*key) {
                Some(row) => parts
                    .iter()
                    .all(|part| self.part_matches(part, &row.where_string)),
                None => false,
            })
            .cloned()
            .collect()
    }

    fn tag(&mut self, keys: &[String], values: &TagSet) {
        self.note_columns(values);
        for key in keys {
            match self.rows.get_mut(key) {
                Some(row) => {
                    row.values.extend(values);
                    row.where_string = row.values.where_string();
                }
                None => {
                    self.order.push(key.clone());
                    self.rows.insert(key.clone(), TagRow::new(values.clone()));
                }
            }
        }
    }

    fn remove(&mut self, keys: &[String]) {
        for key in keys {
            if self.rows.remove(key).is_some() {
                self.order.retain(|existing| existing != key);
            }
        }
    }

    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn row(&self, key: &str) -> Option<&TagSet> {
        self.rows.get(key).map(|row| &row.values)
    }

    fn where_string(&self, key: &str) -> Option<&str> {
        self.rows.get(key).map(|row| row.where_string.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group() -> GroupTags {
        GroupTags::with_rows(
            "sample",
            (1i64..=5).map(|number| {
                (
                    format!("->{}", number),
                    TagSet::from_pairs([("foo", number)]),
                )
            }),
        )
    }

    #[test]
    fn where_string_encoding() {
        let tags = TagSet::from_pairs([("k1", TagValue::Int(1)), ("k2", TagValue::from("m"))]);
        assert_eq!(tags.where_string(), "//k1/1//k2/m//");
        assert_eq!(TagSet::new().where_string(), "////");
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut tags = TagSet::from_pairs([("a", 1i64), ("b", 2i64)]);
        tags.insert("a", 3i64);
        assert_eq!(tags.get("a"), Some(&TagValue::Int(3)));
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn where_select_by_equality() {
        let group = sample_group();
        let found = group.where_select(&[SearchPart::from("foo/3")], None);
        assert_eq!(found, vec!["->3".to_string()]);
    }

    #[test]
    fn where_select_respects_pre_selection() {
        let group = sample_group();
        let pre = vec!["->2".to_string(), "->3".to_string(), "->4".to_string()];
        let found = group.where_select(&[SearchPart::from("foo/1")], Some(&pre));
        assert!(found.is_empty());
    }

    #[test]
    fn where_select_or_alternatives() {
        let group = sample_group();
        let found = group.where_select(&[SearchPart::any(["foo/1", "foo/4"])], None);
        assert_eq!(found, vec!["->1".to_string(), "->4".to_string()]);
    }

    #[test]
    fn tag_recomputes_where_string() {
        let mut group = GroupTags::new("ids");
        let keys = vec!["->a".to_string()];
        group.tag(&keys, &TagSet::from_pairs([("category", "foo")]));
        assert_eq!(group.where_string("->a"), Some("//category/foo//"));

        group.tag(&keys, &TagSet::from_pairs([("name", "bar")]));
        assert_eq!(group.where_string("->a"), Some("//category/foo//name/bar//"));
        assert_eq!(group.columns(), vec!["category", "name"]);
    }

    #[test]
    fn remove_drops_rows() {
        let mut group = sample_group();
        group.remove(&["->1".to_string(), "->2".to_string()]);
        assert_eq!(group.len(), 3);
        assert!(group.row("->1").is_none());
        let found = group.where_select(&[SearchPart::from("foo/1")], None);
        assert!(found.is_empty());
    }

    #[test]
    fn wh_is_formats_parts() {
        assert_eq!(wh_is("k1", 3i64), "k1/3");
        assert_eq!(wh_is("name", "bar"), "name/bar");
    }
}
