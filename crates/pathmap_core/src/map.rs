//! The path map: a selection window over one shared path map table.
//!
//! Every query clones a cheap handle to the shared table and narrows
//! the selection; mutation goes through the same handle, so all maps
//! derived from one tree observe each other's changes.

use crate::error::{MapError, MapResult};
use crate::items::TreeNodeItem;
use crate::render;
use crate::table::{Dimension, PathMapTable, DEFAULT_META_ATTRIBUTES_GROUP, REAL_PATH_COLUMN};
use crate::tree::TreeValue;
use crate::walker::{map_tree_items, DefaultMappingBehavior, PathMappingBehavior};
use pathmap_index::{SearchPart, TagSet};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Maps `value` into a path map with the default behavior.
///
/// Fails with [`MapError::LeafAtRoot`] when `value` is a leaf.
pub fn map_tree(value: impl Into<TreeValue>) -> MapResult<PathMap> {
    map_tree_with(value, Rc::new(DefaultMappingBehavior))
}

/// Maps `value` into a path map with an explicit mapping behavior.
pub fn map_tree_with(
    value: impl Into<TreeValue>,
    behavior: Rc<dyn PathMappingBehavior>,
) -> MapResult<PathMap> {
    let tree = crate::tree::TreeArena::new(value.into());
    let items = map_tree_items(&tree, tree.root(), None, behavior.as_ref())?;
    let table = PathMapTable::new(tree, items);
    Ok(PathMap {
        table: Rc::new(RefCell::new(table)),
        selection: None,
        dimension: REAL_PATH_COLUMN.to_string(),
        behavior,
    })
}

/// A queryable window onto a mapped tree.
///
/// Holds the shared table, the active path dimension and the current
/// selection. A freshly mapped map selects the whole table, following
/// it through later changes; narrowed maps hold an explicit subset
/// whose members are re-validated against the table on every read, so
/// a selection is always a subset of the table's rows, in table order.
#[derive(Clone)]
pub struct PathMap {
    table: Rc<RefCell<PathMapTable>>,
    /// `None` selects the whole table.
    selection: Option<Vec<String>>,
    dimension: String,
    behavior: Rc<dyn PathMappingBehavior>,
}

impl PathMap {
    /// Number of selected rows.
    pub fn len(&self) -> usize {
        match &self.selection {
            None => self.table.borrow().len(),
            Some(_) => self.real_paths().len(),
        }
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The selected real paths, in table order.
    pub fn real_paths(&self) -> Vec<String> {
        let table = self.table.borrow();
        match &self.selection {
            None => table.real_paths(),
            Some(selection) => selection
                .iter()
                .filter(|real_path| table.contains_real_path(real_path))
                .cloned()
                .collect(),
        }
    }

    /// The active path dimension.
    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// The table columns, real path first.
    pub fn columns(&self) -> Vec<String> {
        self.table.borrow().columns().to_vec()
    }

    /// True if `real_path` is a row of the underlying table,
    /// regardless of the current selection.
    pub fn real_path_exists(&self, real_path: &str) -> bool {
        self.table.borrow().contains_real_path(real_path)
    }

    /// A map over an explicit selection of the same table.
    ///
    /// Paths unknown to the table are dropped; the rest are taken in
    /// table order.
    pub fn with_selection(&self, real_paths: &[String]) -> PathMap {
        let requested: HashSet<&String> = real_paths.iter().collect();
        let selection = self
            .table
            .borrow()
            .real_paths()
            .into_iter()
            .filter(|real_path| requested.contains(real_path))
            .collect();
        self.derive(selection, self.dimension.clone())
    }

    /// All proper sub-paths of `real_path` in the table, table order.
    pub fn sub_paths_of(&self, real_path: &str) -> Vec<String> {
        self.table.borrow().get_sub_paths_of_real_path(real_path)
    }

    /// A map narrowed to rows with a non-blank path in `dimension`,
    /// querying that dimension from now on.
    pub fn at_dimension<'a>(&self, dimension: impl Into<Dimension<'a>>) -> MapResult<PathMap> {
        let name = self.table.borrow().dimension_name(dimension.into())?;
        let populated: HashSet<String> = self
            .table
            .borrow()
            .paths_with_dimension(&name)
            .into_iter()
            .collect();
        let selection = self
            .real_paths()
            .into_iter()
            .filter(|real_path| populated.contains(real_path))
            .collect();
        Ok(self.derive(selection, name))
    }

    /// Narrows the selection to rows whose active-dimension path
    /// matches every search part.
    pub fn select<P>(&self, parts: &[P]) -> MapResult<PathMap>
    where
        P: Clone + Into<SearchPart>,
    {
        let parts: Vec<SearchPart> = parts.iter().cloned().map(Into::into).collect();
        let current = self.real_paths();
        let selection = self
            .table
            .borrow()
            .select(&self.dimension, &parts, Some(&current))?;
        Ok(self.derive(selection, self.dimension.clone()))
    }

    /// Narrows the selection by chained `key, target-value` pairs; see
    /// [`PathMapTable::where_select`].
    pub fn where_select(&self, parts: &[&str]) -> MapResult<PathMap> {
        let current = self.real_paths();
        let selection = self
            .table
            .borrow()
            .where_select(&self.dimension, parts, Some(&current))?;
        Ok(self.derive(selection, self.dimension.clone()))
    }

    /// View onto the tag group `name`.
    pub fn tags(&self, name: &str) -> TagView<'_> {
        TagView {
            map: self,
            group: name.to_string(),
        }
    }

    /// View onto the default meta-attribute group.
    pub fn meta(&self) -> TagView<'_> {
        self.tags(DEFAULT_META_ATTRIBUTES_GROUP)
    }

    /// Read-only sequence façade over the selected node items.
    pub fn tree_node_items(&self) -> NodeItemsView<'_> {
        NodeItemsView { map: self }
    }

    /// Read/write sequence façade over the selected node values.
    pub fn tree_items(&mut self) -> TreeItemsView<'_> {
        TreeItemsView { map: self }
    }

    /// Stable-sorts the whole table by the active dimension; every
    /// selection keeps its members, in the new table order.
    pub fn sort(&mut self) -> MapResult<()> {
        self.table.borrow_mut().sort_rows(&self.dimension)?;
        self.reorder_selection();
        Ok(())
    }

    /// Stable-sorts the whole table by a custom item key.
    pub fn sort_by_key<K, F>(&mut self, key: F) -> MapResult<()>
    where
        K: Ord,
        F: Fn(&TreeNodeItem) -> K,
    {
        let order = {
            let table = self.table.borrow();
            let mut keyed: Vec<(K, String)> = Vec::with_capacity(table.len());
            for real_path in table.real_paths() {
                let item = table.item_by_real_path(&real_path)?;
                keyed.push((key(item), real_path));
            }
            keyed.sort_by(|left, right| left.0.cmp(&right.0));
            keyed
                .into_iter()
                .map(|(_, real_path)| real_path)
                .collect::<Vec<String>>()
        };
        self.table.borrow_mut().reorder_rows(&order);
        self.reorder_selection();
        Ok(())
    }

    /// The selected index rows as rendered cells, real path first.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let real_paths = self.real_paths();
        let table = self.table.borrow();
        let width = table.columns().len();
        real_paths
            .iter()
            .filter_map(|real_path| table.item_by_real_path(real_path).ok())
            .map(|item| (0..width).map(|slot| item.rendered_path(slot)).collect())
            .collect()
    }

    /// Materializes the selected rows as `(real path, live value)`
    /// pairs. Rows whose node vanished from the tree are skipped.
    pub fn to_values(&self) -> Vec<(String, TreeValue)> {
        let real_paths = self.real_paths();
        let table = self.table.borrow();
        real_paths
            .into_iter()
            .filter_map(|real_path| {
                table
                    .live_value(&real_path)
                    .ok()
                    .map(|value| (real_path, value))
            })
            .collect()
    }

    fn derive(&self, selection: Vec<String>, dimension: String) -> PathMap {
        PathMap {
            table: Rc::clone(&self.table),
            selection: Some(selection),
            dimension,
            behavior: Rc::clone(&self.behavior),
        }
    }

    /// Rewrites an explicit selection into the table's current order,
    /// dropping members that left the table.
    fn reorder_selection(&mut self) {
        let Some(selection) = &mut self.selection else {
            return;
        };
        let keep: HashSet<String> = selection.drain(..).collect();
        *selection = self
            .table
            .borrow()
            .real_paths()
            .into_iter()
            .filter(|real_path| keep.contains(real_path))
            .collect();
    }

    fn selected_path(&self, position: usize) -> MapResult<String> {
        let selection = self.real_paths();
        selection
            .get(position)
            .cloned()
            .ok_or_else(|| MapError::out_of_range(position, selection.len()))
    }

    fn require_selected(&self, real_path: &str) -> MapResult<()> {
        if !self.real_path_exists(real_path) {
            return Err(MapError::unknown_real_path(real_path));
        }
        match &self.selection {
            None => Ok(()),
            Some(selection) if selection.iter().any(|selected| selected == real_path) => Ok(()),
            Some(_) => Err(MapError::not_selected(real_path)),
        }
    }

    /// Replaces the value of one selected node.
    ///
    /// Sub-rows of the target are dropped first; when the new value is
    /// a container by the map's behavior, its subtree is remapped and
    /// spliced back in right after the target's row, and the inserted
    /// paths join this map's selection.
    fn set_value(&mut self, real_path: &str, value: TreeValue) -> MapResult<()> {
        self.require_selected(real_path)?;
        let item = self.table.borrow().item_by_real_path(real_path)?.clone();
        let parent_node = item.parent_node().ok_or(MapError::RootMutation)?;
        let real_key = item.real_key().cloned().ok_or(MapError::RootMutation)?;

        let inserted = {
            let mut table = self.table.borrow_mut();
            table.drop_all_sub_entities_of_real_path(real_path);
            let node = table
                .tree_mut()
                .set_child(parent_node, &real_key, value)
                .ok_or_else(|| MapError::unknown_real_path(real_path))?;
            if self.behavior.item_is_a_leaf(table.tree(), node) {
                Vec::new()
            } else {
                let fresh =
                    map_tree_items(table.tree(), node, Some(&item), self.behavior.as_ref())?;
                table.insert_additional_tree_items(fresh, Some(&item))?
            }
        };
        if let Some(selection) = &mut self.selection {
            selection.extend(inserted);
        }
        self.reorder_selection();
        Ok(())
    }
}

impl fmt::Debug for PathMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMap")
            .field("dimension", &self.dimension)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PathMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let real_paths = self.real_paths();
        write!(
            f,
            "{}",
            render::detailed_representation(&self.table.borrow(), Some(&real_paths))
        )
    }
}

/// Equality-tag view onto one tag group, scoped to a map's selection.
pub struct TagView<'a> {
    map: &'a PathMap,
    group: String,
}

impl TagView<'_> {
    /// The group name this view addresses.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Narrows the map's selection to rows whose tags match every
    /// part; parts AND, a part's alternatives OR. Unregistered groups
    /// yield an empty map.
    pub fn where_select<P>(&self, parts: &[P]) -> PathMap
    where
        P: Clone + Into<SearchPart>,
    {
        let parts: Vec<SearchPart> = parts.iter().cloned().map(Into::into).collect();
        let current = self.map.real_paths();
        let selection = self
            .map
            .table
            .borrow()
            .tag_where(&self.group, &parts, Some(&current));
        self.map.derive(selection, self.map.dimension.clone())
    }

    /// Tags every selected row with `values`, creating the group on
    /// first use.
    pub fn tag(&self, values: &TagSet) {
        let real_paths = self.map.real_paths();
        self.map
            .table
            .borrow_mut()
            .tag_paths(&self.group, &real_paths, values);
    }

    /// The tag set of one row, if tagged in this group.
    pub fn row(&self, real_path: &str) -> Option<TagSet> {
        self.map
            .table
            .borrow()
            .tags()
            .get(&self.group)
            .and_then(|group| group.row(real_path).cloned())
    }
}

/// A slice over the selection: `start..end` with a step.
///
/// Missing bounds default to the full selection; a step of 0 is
/// treated as 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    /// First selected position, inclusive.
    pub start: Option<usize>,
    /// Last selected position, exclusive.
    pub end: Option<usize>,
    /// Distance between picked positions.
    pub step: usize,
}

impl Slice {
    /// The full selection.
    pub fn full() -> Self {
        Self::default()
    }

    /// Every `step`-th position of the full selection.
    pub fn every(step: usize) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// An explicit `start..end` range with step 1.
    pub fn range(start: usize, end: usize) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            step: 1,
        }
    }

    fn positions(&self, len: usize) -> Vec<usize> {
        let start = self.start.unwrap_or(0).min(len);
        let end = self.end.unwrap_or(len).min(len);
        let step = self.step.max(1);
        (start..end).step_by(step).collect()
    }
}

/// Read-only, position-addressable façade over the selected items.
pub struct NodeItemsView<'a> {
    map: &'a PathMap,
}

impl NodeItemsView<'_> {
    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The item at `position` within the selection.
    pub fn by_position(&self, position: usize) -> MapResult<TreeNodeItem> {
        let real_path = self.map.selected_path(position)?;
        Ok(self
            .map
            .table
            .borrow()
            .item_by_real_path(&real_path)?
            .clone())
    }

    /// The selected item at `real_path`.
    pub fn by_real_path(&self, real_path: &str) -> MapResult<TreeNodeItem> {
        self.map.require_selected(real_path)?;
        Ok(self.map.table.borrow().item_by_real_path(real_path)?.clone())
    }

    /// The items picked by `slice`, in selection order.
    pub fn by_slice(&self, slice: Slice) -> Vec<TreeNodeItem> {
        let selection = self.map.real_paths();
        let table = self.map.table.borrow();
        slice
            .positions(selection.len())
            .into_iter()
            .filter_map(|position| {
                table.item_by_real_path(&selection[position]).ok().cloned()
            })
            .collect()
    }

    /// All selected items, in selection order.
    pub fn to_vec(&self) -> Vec<TreeNodeItem> {
        self.by_slice(Slice::full())
    }
}

/// Read/write, position-addressable façade over the selected values.
pub struct TreeItemsView<'a> {
    map: &'a mut PathMap,
}

impl TreeItemsView<'_> {
    /// Number of selected values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The live value at `position` within the selection.
    pub fn by_position(&self, position: usize) -> MapResult<TreeValue> {
        let real_path = self.map.selected_path(position)?;
        self.map.table.borrow().live_value(&real_path)
    }

    /// The live value of the selected row `real_path`.
    pub fn by_real_path(&self, real_path: &str) -> MapResult<TreeValue> {
        self.map.require_selected(real_path)?;
        self.map.table.borrow().live_value(real_path)
    }

    /// The live values picked by `slice`, in selection order.
    pub fn by_slice(&self, slice: Slice) -> Vec<TreeValue> {
        let selection = self.map.real_paths();
        let table = self.map.table.borrow();
        slice
            .positions(selection.len())
            .into_iter()
            .filter_map(|position| table.live_value(&selection[position]).ok())
            .collect()
    }

    /// Replaces the value at `position` within the selection.
    pub fn set_by_position(
        &mut self,
        position: usize,
        value: impl Into<TreeValue>,
    ) -> MapResult<()> {
        let real_path = self.map.selected_path(position)?;
        self.map.set_value(&real_path, value.into())
    }

    /// Replaces the value of the selected row `real_path`.
    pub fn set_by_real_path(
        &mut self,
        real_path: &str,
        value: impl Into<TreeValue>,
    ) -> MapResult<()> {
        self.map.set_value(real_path, value.into())
    }

    /// Replaces every value picked by `slice` with a clone of `value`.
    ///
    /// Targets are resolved against the selection up front; a target
    /// whose row was dropped by an earlier assignment of the same
    /// slice (a descendant of an already replaced node) is skipped,
    /// not an error.
    pub fn set_by_slice(&mut self, slice: Slice, value: impl Into<TreeValue>) -> MapResult<()> {
        let value = value.into();
        let selection = self.map.real_paths();
        let targets: Vec<String> = slice
            .positions(selection.len())
            .into_iter()
            .map(|position| selection[position].clone())
            .collect();
        for real_path in targets {
            if !self.map.real_path_exists(&real_path) {
                continue;
            }
            self.map.set_value(&real_path, value.clone())?;
        }
        Ok(())
    }
}
