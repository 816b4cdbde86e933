//! The path map table: one node collection, one path index, and the
//! tag group registry, kept in sync under every mutation.

use crate::error::{MapError, MapResult};
use crate::items::{TreeNodeItem, TreeNodeItems};
use crate::render;
use crate::tree::{NodeId, TreeArena, TreeNode, TreeValue};
use pathmap_index::{GroupTags, PathIndex, PathIndexRow, SearchPart, TagSet, WhereSelectable};
use std::fmt;
use tracing::debug;

/// Name of the table's first path column, the real path.
pub const REAL_PATH_COLUMN: &str = "real_path";

/// Reserved name of the tag group seeded from node meta attributes.
pub const DEFAULT_META_ATTRIBUTES_GROUP: &str = "meta_attributes";

/// Addresses a path dimension by column name or ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension<'a> {
    /// A path column by name.
    Name(&'a str),
    /// A path column by position; 0 is the real path.
    Position(usize),
}

impl<'a> From<&'a str> for Dimension<'a> {
    fn from(name: &'a str) -> Self {
        Dimension::Name(name)
    }
}

impl From<usize> for Dimension<'_> {
    fn from(position: usize) -> Self {
        Dimension::Position(position)
    }
}

/// Registry of tag groups keyed by group name.
///
/// Groups are heterogeneous `WhereSelectable` implementations behind
/// boxes; requesting an unregistered name creates an empty standard
/// group lazily. The default meta-attribute group is seeded once at
/// table construction and never re-seeded.
#[derive(Default)]
pub struct TagGroups {
    groups: Vec<(String, Box<dyn WhereSelectable>)>,
}

impl TagGroups {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a group under `name`.
    pub fn register(&mut self, name: impl Into<String>, group: Box<dyn WhereSelectable>) {
        let name = name.into();
        match self.groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = group,
            None => self.groups.push((name, group)),
        }
    }

    /// The group registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&dyn WhereSelectable> {
        self.groups
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, group)| group.as_ref())
    }

    /// The group under `name`, created empty when missing.
    pub fn get_or_create(&mut self, name: &str) -> &mut Box<dyn WhereSelectable> {
        let position = match self.groups.iter().position(|(existing, _)| existing == name) {
            Some(position) => position,
            None => {
                self.groups
                    .push((name.to_string(), Box::new(GroupTags::new(name))));
                self.groups.len() - 1
            }
        };
        &mut self.groups[position].1
    }

    /// The registered group names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if no group is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Removes the rows for `keys` from every registered group.
    pub fn remove_rows(&mut self, keys: &[String]) {
        for (_, group) in &mut self.groups {
            group.remove(keys);
        }
    }
}

/// The table of real and additional tree paths of one mapped tree.
///
/// Owns the tree arena, the node collection, the path index and the
/// tag groups. Invariant: the index row-key set and the collection key
/// set are identical after every public call; every mutation updates
/// both sides before returning.
pub struct PathMapTable {
    tree: TreeArena,
    items: TreeNodeItems,
    index: PathIndex,
    tags: TagGroups,
}

impl PathMapTable {
    /// Builds a table from a tree arena and its mapped items.
    ///
    /// The number of path columns is the widest item's path count; the
    /// default tag group is seeded from every item's meta attributes.
    pub fn new(tree: TreeArena, items: TreeNodeItems) -> Self {
        let dimensions = items
            .iter()
            .map(|item| item.tree_node_paths().len())
            .max()
            .unwrap_or(1);
        let columns = path_columns(dimensions);
        let rows = items
            .iter()
            .map(|item| item_row(item, dimensions))
            .collect();
        let index = PathIndex::from_rows(columns, rows);

        let mut tags = TagGroups::new();
        tags.register(
            DEFAULT_META_ATTRIBUTES_GROUP,
            Box::new(GroupTags::with_rows(
                DEFAULT_META_ATTRIBUTES_GROUP,
                items
                    .iter()
                    .map(|item| (item.real_path(), item.meta_attributes().clone())),
            )),
        );

        debug!(rows = index.len(), dimensions, "built path map table");
        Self {
            tree,
            items,
            index,
            tags,
        }
    }

    /// The tree arena this table indexes.
    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    /// Mutable access to the tree arena.
    ///
    /// Reserved for the mutation path; outside callers must not change
    /// the tree behind the table's back.
    pub(crate) fn tree_mut(&mut self) -> &mut TreeArena {
        &mut self.tree
    }

    /// The table's columns, real path first.
    pub fn columns(&self) -> &[String] {
        self.index.columns()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The real paths in table order.
    pub fn real_paths(&self) -> Vec<String> {
        self.index.row_keys().map(str::to_string).collect()
    }

    /// True if `real_path` is a row of this table.
    pub fn contains_real_path(&self, real_path: &str) -> bool {
        self.index.contains(real_path)
    }

    /// Resolves a dimension to its column name.
    pub fn dimension_name(&self, dimension: Dimension<'_>) -> MapResult<String> {
        match dimension {
            Dimension::Name(name) => {
                if self.index.column_position(name).is_some() {
                    Ok(name.to_string())
                } else {
                    Err(MapError::unknown_dimension(name))
                }
            }
            Dimension::Position(position) => self
                .columns()
                .get(position)
                .cloned()
                .ok_or_else(|| MapError::unknown_dimension(position.to_string())),
        }
    }

    /// Restricts `pre_selection` (default: all rows) to rows whose
    /// value in `dimension` matches every search part.
    pub fn select(
        &self,
        dimension: &str,
        parts: &[SearchPart],
        pre_selection: Option<&[String]>,
    ) -> MapResult<Vec<String>> {
        self.dimension_name(Dimension::Name(dimension))?;
        Ok(self.index.select(dimension, parts, pre_selection))
    }

    /// Chained key/target selection: per pair, select by the key part
    /// in `dimension`, then keep rows whose live value renders equal
    /// to the target. An empty intermediate result short-circuits.
    pub fn where_select(
        &self,
        dimension: &str,
        parts: &[&str],
        pre_selection: Option<&[String]>,
    ) -> MapResult<Vec<String>> {
        self.dimension_name(Dimension::Name(dimension))?;
        if parts.len() % 2 != 0 {
            return Err(MapError::UnpairedWhereParts { count: parts.len() });
        }
        let mut current: Vec<String> = match pre_selection {
            Some(keys) => keys.to_vec(),
            None => self.real_paths(),
        };
        for pair in parts.chunks(2) {
            let (key, target) = (pair[0], pair[1]);
            current = self
                .index
                .select(dimension, &[SearchPart::from(key)], Some(&current));
            if current.is_empty() {
                return Ok(current);
            }
            current.retain(|real_path| self.value_renders_as(real_path, target));
            if current.is_empty() {
                return Ok(current);
            }
        }
        Ok(current)
    }

    /// The node item at `real_path` (table scope).
    pub fn item_by_real_path(&self, real_path: &str) -> MapResult<&TreeNodeItem> {
        self.items
            .get(real_path)
            .ok_or_else(|| MapError::unknown_real_path(real_path))
    }

    /// The table position of `real_path`.
    pub fn position_of_real_path(&self, real_path: &str) -> MapResult<usize> {
        self.index
            .position_of(real_path)
            .ok_or_else(|| MapError::unknown_real_path(real_path))
    }

    /// All proper sub-paths of `real_path`, in table order.
    pub fn get_sub_paths_of_real_path(&self, real_path: &str) -> Vec<String> {
        self.index.sub_paths_of(real_path)
    }

    /// Drops every sub-path of `real_path` from index, collection and
    /// tag groups.
    pub fn drop_all_sub_entities_of_real_path(&mut self, real_path: &str) {
        let sub_paths = self.index.sub_paths_of(real_path);
        self.drop_all_entities_by_real_paths(&sub_paths);
    }

    /// Drops the given rows from index, collection and tag groups
    /// atomically.
    pub fn drop_all_entities_by_real_paths(&mut self, real_paths: &[String]) {
        if real_paths.is_empty() {
            return;
        }
        debug!(dropped = real_paths.len(), "dropping path table entities");
        self.index.remove_keys(real_paths);
        self.items.drop_items(real_paths);
        self.tags.remove_rows(real_paths);
    }

    /// Inserts freshly mapped items underneath `parent`.
    ///
    /// Existing sub-paths of the parent are cascade-dropped first. The
    /// new rows are spliced in directly after the parent's row, which
    /// preserves the walker's contiguity guarantee; the default tag
    /// group is extended from the items' meta attributes. Returns the
    /// inserted real paths.
    ///
    /// Fails with [`MapError::RootInsertion`] without a parent item,
    /// since the implicit root has no row to splice after.
    pub fn insert_additional_tree_items(
        &mut self,
        items_to_insert: TreeNodeItems,
        parent: Option<&TreeNodeItem>,
    ) -> MapResult<Vec<String>> {
        let parent = parent.ok_or(MapError::RootInsertion)?;
        let parent_path = parent.real_path();
        // Validate before mutating; the cascade drop below only removes
        // rows after the parent, so its position stays valid.
        let insertion_position = self.position_of_real_path(&parent_path)? + 1;
        self.drop_all_sub_entities_of_real_path(&parent_path);

        let dimensions = items_to_insert
            .iter()
            .map(|item| item.tree_node_paths().len())
            .max()
            .unwrap_or(1);
        if dimensions > self.columns().len() {
            let missing = path_columns(dimensions)
                .into_iter()
                .skip(self.columns().len())
                .collect();
            self.index.add_columns(missing);
        }
        let width = self.columns().len();
        let rows = items_to_insert
            .iter()
            .map(|item| item_row(item, width))
            .collect();
        self.index.insert_rows_at(insertion_position, rows);

        let meta_rows: Vec<(String, TagSet)> = items_to_insert
            .iter()
            .map(|item| (item.real_path(), item.meta_attributes().clone()))
            .collect();
        let inserted = self.items.add_many(items_to_insert);
        let meta_group = self.tags.get_or_create(DEFAULT_META_ATTRIBUTES_GROUP);
        for (real_path, attributes) in meta_rows {
            meta_group.tag(&[real_path], &attributes);
        }
        debug!(
            inserted = inserted.len(),
            parent = %parent_path,
            "spliced tree items into path table"
        );
        Ok(inserted)
    }

    /// Stable-sorts the rows by their rendered value in `dimension`.
    pub fn sort_rows(&mut self, dimension: &str) -> MapResult<()> {
        self.dimension_name(Dimension::Name(dimension))?;
        self.index.sort_by_column(dimension);
        Ok(())
    }

    /// Reorders the rows to an explicit key order.
    pub fn reorder_rows(&mut self, real_paths: &[String]) {
        self.index.reorder(real_paths);
    }

    /// Row keys with a non-blank entry in `dimension`, table order.
    pub fn paths_with_dimension(&self, dimension: &str) -> Vec<String> {
        self.index.entries_with_value(dimension)
    }

    /// The tag group registry.
    pub fn tags(&self) -> &TagGroups {
        &self.tags
    }

    /// Mutable tag group registry.
    pub fn tags_mut(&mut self) -> &mut TagGroups {
        &mut self.tags
    }

    /// Equality selection through one tag group.
    ///
    /// An unregistered group holds no rows and yields an empty result.
    pub fn tag_where(
        &self,
        group: &str,
        parts: &[SearchPart],
        pre_selection: Option<&[String]>,
    ) -> Vec<String> {
        match self.tags.get(group) {
            Some(group) => group.where_select(parts, pre_selection),
            None => Vec::new(),
        }
    }

    /// Tags the given rows in `group`, creating the group lazily.
    pub fn tag_paths(&mut self, group: &str, real_paths: &[String], values: &TagSet) {
        self.tags.get_or_create(group).tag(real_paths, values);
    }

    /// Resolves the live node an item points at.
    pub fn node_id_of_item(&self, item: &TreeNodeItem) -> Option<NodeId> {
        item.node_id(&self.tree)
    }

    /// Materializes the live value of the node at `real_path`.
    pub fn live_value(&self, real_path: &str) -> MapResult<TreeValue> {
        let item = self.item_by_real_path(real_path)?;
        item.node_id(&self.tree)
            .and_then(|id| self.tree.value_of(id))
            .ok_or_else(|| MapError::unknown_real_path(real_path))
    }

    fn value_renders_as(&self, real_path: &str, target: &str) -> bool {
        let Some(item) = self.items.get(real_path) else {
            return false;
        };
        let Some(id) = item.node_id(&self.tree) else {
            return false;
        };
        match self.tree.node(id) {
            Some(TreeNode::Leaf(leaf)) => leaf.to_string() == target,
            _ => false,
        }
    }

    /// Check helper for tests and debugging: index row keys and
    /// collection keys as sorted sets.
    pub fn is_synchronized(&self) -> bool {
        let mut index_keys = self.real_paths();
        let mut item_keys = self.items.real_paths();
        index_keys.sort();
        item_keys.sort();
        index_keys == item_keys
    }
}

impl fmt::Display for PathMapTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render::detailed_representation(self, None))
    }
}

fn path_columns(dimensions: usize) -> Vec<String> {
    let mut columns = vec![REAL_PATH_COLUMN.to_string()];
    for dimension in 1..dimensions {
        columns.push(format!("additional_path_{}", dimension));
    }
    columns
}

fn item_row(item: &TreeNodeItem, width: usize) -> PathIndexRow {
    let cells = (0..width).map(|slot| item.rendered_path(slot)).collect();
    PathIndexRow::new(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PathToken;
    use crate::walker::{map_tree_items, DefaultMappingBehavior};
    use pathmap_index::wh_is;

    fn sample_table() -> PathMapTable {
        let tree = TreeArena::new(TreeValue::map([(
            "a",
            TreeValue::map([
                ("b", TreeValue::map([("d", TreeValue::from("leaf-1"))])),
                ("c", TreeValue::map([("e", TreeValue::from("leaf-2"))])),
            ]),
        )]));
        let items =
            map_tree_items(&tree, tree.root(), None, &DefaultMappingBehavior).unwrap();
        PathMapTable::new(tree, items)
    }

    #[test]
    fn construction_builds_one_row_per_item() {
        let table = sample_table();
        assert_eq!(
            table.real_paths(),
            vec!["->a", "->a->b", "->a->b->d", "->a->c", "->a->c->e"]
        );
        assert_eq!(table.columns(), ["real_path"]);
        assert!(table.is_synchronized());
    }

    #[test]
    fn default_tag_group_is_seeded() {
        let table = sample_table();
        let group = table.tags().get(DEFAULT_META_ATTRIBUTES_GROUP).unwrap();
        assert_eq!(group.where_string("->a"), Some("////"));
    }

    #[test]
    fn select_by_real_path_part() {
        let table = sample_table();
        let found = table
            .select(REAL_PATH_COLUMN, &[SearchPart::from("b")], None)
            .unwrap();
        assert_eq!(found, vec!["->a->b", "->a->b->d"]);
    }

    #[test]
    fn select_unknown_dimension_fails() {
        let table = sample_table();
        let result = table.select("no_such_column", &[SearchPart::from("*")], None);
        assert_eq!(
            result.unwrap_err(),
            MapError::unknown_dimension("no_such_column")
        );
    }

    #[test]
    fn where_select_filters_by_live_value() {
        let table = sample_table();
        let found = table
            .where_select(REAL_PATH_COLUMN, &["d", "leaf-1"], None)
            .unwrap();
        assert_eq!(found, vec!["->a->b->d"]);

        let found = table
            .where_select(REAL_PATH_COLUMN, &["d", "wrong"], None)
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn where_select_requires_pairs() {
        let table = sample_table();
        let result = table.where_select(REAL_PATH_COLUMN, &["d"], None);
        assert_eq!(
            result.unwrap_err(),
            MapError::UnpairedWhereParts { count: 1 }
        );
    }

    #[test]
    fn where_select_chains_pairs() {
        let table = sample_table();
        // First pair narrows to leaf rows under "b"; the second pair
        // cannot match anymore and short-circuits to empty.
        let found = table
            .where_select(REAL_PATH_COLUMN, &["d", "leaf-1", "e", "leaf-2"], None)
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn drop_sub_entities_keeps_sides_in_sync() {
        let mut table = sample_table();
        table.drop_all_sub_entities_of_real_path("->a->b");
        assert_eq!(
            table.real_paths(),
            vec!["->a", "->a->b", "->a->c", "->a->c->e"]
        );
        assert!(table.is_synchronized());
        assert!(table.item_by_real_path("->a->b->d").is_err());
    }

    #[test]
    fn insert_splices_directly_after_the_parent() {
        let mut table = sample_table();
        let parent = table.item_by_real_path("->a->b").unwrap().clone();
        let parent_node = table.node_id_of_item(&parent).unwrap();

        table
            .tree_mut()
            .set_child(
                parent_node,
                &PathToken::Key("fresh".to_string()),
                TreeValue::from("new leaf"),
            )
            .unwrap();
        let fresh_items = map_tree_items(
            table.tree(),
            parent_node,
            Some(&parent),
            &DefaultMappingBehavior,
        )
        .unwrap();

        let inserted = table
            .insert_additional_tree_items(fresh_items, Some(&parent))
            .unwrap();
        assert_eq!(inserted, vec!["->a->b->d", "->a->b->fresh"]);
        assert_eq!(
            table.real_paths(),
            vec!["->a", "->a->b", "->a->b->d", "->a->b->fresh", "->a->c", "->a->c->e"]
        );
        assert!(table.is_synchronized());
    }

    #[test]
    fn insert_without_parent_is_rejected() {
        let mut table = sample_table();
        let result = table.insert_additional_tree_items(TreeNodeItems::new(), None);
        assert_eq!(result.unwrap_err(), MapError::RootInsertion);
    }

    #[test]
    fn insert_under_a_vanished_parent_changes_nothing() {
        let mut table = sample_table();
        let stale_parent = table.item_by_real_path("->a->b").unwrap().clone();
        table.drop_all_entities_by_real_paths(&["->a->b".to_string()]);
        let before = table.real_paths();

        let result = table.insert_additional_tree_items(TreeNodeItems::new(), Some(&stale_parent));
        assert_eq!(result.unwrap_err(), MapError::unknown_real_path("->a->b"));
        // The rejected insert must not have cascade-dropped the
        // parent's old sub-rows.
        assert_eq!(table.real_paths(), before);
        assert!(table.contains_real_path("->a->b->d"));
        assert!(table.is_synchronized());
    }

    #[test]
    fn tag_and_tag_where() {
        let mut table = sample_table();
        let tagged = vec!["->a->b->d".to_string(), "->a->c->e".to_string()];
        table.tag_paths("ids", &tagged, &TagSet::from_pairs([("category", "foo")]));

        let found = table.tag_where(
            "ids",
            &[SearchPart::from(wh_is("category", "foo"))],
            Some(&table.real_paths()),
        );
        assert_eq!(found, tagged);
        assert!(table.tag_where("unknown", &[SearchPart::from("*")], None).is_empty());
    }

    #[test]
    fn live_value_resolves_through_the_arena() {
        let table = sample_table();
        assert_eq!(
            table.live_value("->a->b->d").unwrap(),
            TreeValue::from("leaf-1")
        );
        assert!(table.live_value("->nope").is_err());
    }

    #[test]
    fn sort_rows_orders_by_rendered_path() {
        let mut table = sample_table();
        let order = vec![
            "->a->c->e".to_string(),
            "->a".to_string(),
            "->a->b".to_string(),
            "->a->b->d".to_string(),
            "->a->c".to_string(),
        ];
        table.reorder_rows(&order);
        table.sort_rows(REAL_PATH_COLUMN).unwrap();
        assert_eq!(
            table.real_paths(),
            vec!["->a", "->a->b", "->a->b->d", "->a->c", "->a->c->e"]
        );
    }
}
