//! The tree walker: turns an arena tree into an ordered collection of
//! node items.

use crate::error::{MapError, MapResult};
use crate::items::{TreeNodeItem, TreeNodeItems};
use crate::tree::{NodeId, TreeArena};
use pathmap_index::TagSet;
use tracing::trace;

/// The pluggable mapping behavior of a path map.
///
/// `item_is_a_leaf` decides where recursion stops; `adjust_node_item`
/// runs exactly once per item, immediately after construction and
/// before recursion, and may attach additional paths and meta
/// attributes. It cannot change the item's real path or which node is
/// recursed into.
pub trait PathMappingBehavior {
    /// True if the node must be treated as a terminal value.
    fn item_is_a_leaf(&self, tree: &TreeArena, node: NodeId) -> bool {
        tree.is_leaf(node)
    }

    /// Hook to enrich a freshly built node item.
    fn adjust_node_item(&self, tree: &TreeArena, item: &mut TreeNodeItem) {
        let _ = (tree, item);
    }
}

/// The default behavior: leaves are `Leaf` nodes, items stay untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMappingBehavior;

impl PathMappingBehavior for DefaultMappingBehavior {}

/// Maps the subtree under `node` into an ordered collection of node
/// items.
///
/// Traversal is depth-first pre-order: every container entry produces
/// one item, and the items of its descendants follow contiguously
/// before the next sibling. Without a `parent_item` an implicit
/// synthetic root item is used; it never appears in the result.
///
/// Fails with [`MapError::LeafAtRoot`] when `node` itself satisfies
/// the behavior's leaf predicate.
pub fn map_tree_items(
    tree: &TreeArena,
    node: NodeId,
    parent_item: Option<&TreeNodeItem>,
    behavior: &dyn PathMappingBehavior,
) -> MapResult<TreeNodeItems> {
    if behavior.item_is_a_leaf(tree, node) {
        return Err(MapError::LeafAtRoot);
    }
    let synthetic_root;
    let parent = match parent_item {
        Some(item) => item,
        None => {
            synthetic_root = TreeNodeItem::synthetic_root();
            &synthetic_root
        }
    };
    let mut mapped = TreeNodeItems::new();
    walk(tree, node, parent, behavior, &mut mapped);
    trace!(items = mapped.len(), "mapped tree items");
    Ok(mapped)
}

fn walk(
    tree: &TreeArena,
    node: NodeId,
    parent: &TreeNodeItem,
    behavior: &dyn PathMappingBehavior,
    mapped: &mut TreeNodeItems,
) {
    for (token, child_node) in tree.children(node) {
        let mut child_item = parent.join(
            &[vec![token.to_string()]],
            TagSet::new(),
            node,
            token.clone(),
        );
        behavior.adjust_node_item(tree, &mut child_item);
        let recurse = !behavior.item_is_a_leaf(tree, child_node);
        mapped.add(child_item.clone());
        if recurse {
            walk(tree, child_node, &child_item, behavior, mapped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::TreeNodePath;
    use crate::tree::TreeValue;
    use pathmap_index::TagValue;

    fn sample_arena() -> TreeArena {
        TreeArena::new(TreeValue::map([(
            "a",
            TreeValue::map([
                ("b", TreeValue::map([("d", TreeValue::from("leaf-1"))])),
                ("c", TreeValue::map([("e", TreeValue::from("leaf-2"))])),
            ]),
        )]))
    }

    #[test]
    fn depth_first_pre_order() {
        let tree = sample_arena();
        let items =
            map_tree_items(&tree, tree.root(), None, &DefaultMappingBehavior).unwrap();
        assert_eq!(
            items.real_paths(),
            vec!["->a", "->a->b", "->a->b->d", "->a->c", "->a->c->e"]
        );
    }

    #[test]
    fn sequences_use_indices() {
        let tree = TreeArena::new(TreeValue::map([(
            "1st",
            TreeValue::seq([
                TreeValue::seq([TreeValue::from("a set"), TreeValue::from("of")]),
                TreeValue::seq([TreeValue::from("items")]),
            ]),
        )]));
        let items =
            map_tree_items(&tree, tree.root(), None, &DefaultMappingBehavior).unwrap();
        assert_eq!(
            items.real_paths(),
            vec!["->1st", "->1st->0", "->1st->0->0", "->1st->0->1", "->1st->1", "->1st->1->0"]
        );
    }

    #[test]
    fn mapping_a_leaf_fails() {
        let tree = TreeArena::new(TreeValue::from("just a leaf"));
        let result = map_tree_items(&tree, tree.root(), None, &DefaultMappingBehavior);
        assert_eq!(result.unwrap_err(), MapError::LeafAtRoot);
    }

    #[test]
    fn adjust_hook_runs_before_recursion() {
        struct Tagging;
        impl PathMappingBehavior for Tagging {
            fn adjust_node_item(&self, _tree: &TreeArena, item: &mut TreeNodeItem) {
                item.add_meta_attributes(&TagSet::from_pairs([("some", "metadata")]));
                item.set_tree_path(1, TreeNodePath::new(["alt"]));
            }
        }

        let tree = sample_arena();
        let items = map_tree_items(&tree, tree.root(), None, &Tagging).unwrap();
        let first = items.get("->a").unwrap();
        assert_eq!(
            first.meta_attributes().get("some"),
            Some(&TagValue::Text("metadata".to_string()))
        );
        assert_eq!(first.rendered_path(1), "->alt");
        // The hook declared the same flat additional path on every
        // item; joins do not stack it.
        let deeper = items.get("->a->b").unwrap();
        assert_eq!(deeper.rendered_path(1), "->alt");
    }

    #[test]
    fn custom_leaf_predicate_stops_recursion() {
        struct ShallowLeaves;
        impl PathMappingBehavior for ShallowLeaves {
            fn item_is_a_leaf(&self, tree: &TreeArena, node: NodeId) -> bool {
                // Treat anything without grandchildren as a leaf.
                tree.is_leaf(node)
                    || tree
                        .children(node)
                        .iter()
                        .all(|(_, child)| tree.is_leaf(*child))
            }
        }

        let tree = sample_arena();
        let items = map_tree_items(&tree, tree.root(), None, &ShallowLeaves).unwrap();
        assert_eq!(items.real_paths(), vec!["->a", "->a->b", "->a->c"]);
    }

    #[test]
    fn walker_maps_under_an_explicit_parent() {
        let tree = sample_arena();
        let all = map_tree_items(&tree, tree.root(), None, &DefaultMappingBehavior).unwrap();
        let parent = all.get("->a->b").unwrap();
        let node = parent.node_id(&tree).unwrap();
        let items =
            map_tree_items(&tree, node, Some(parent), &DefaultMappingBehavior).unwrap();
        assert_eq!(items.real_paths(), vec!["->a->b->d"]);
    }
}
