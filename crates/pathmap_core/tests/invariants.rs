//! Property tests for the mapping and mutation invariants.

use pathmap_core::{map_tree, TreeValue};
use proptest::prelude::*;

fn leaves() -> impl Strategy<Value = TreeValue> {
    prop_oneof![
        any::<i64>().prop_map(TreeValue::from),
        any::<bool>().prop_map(TreeValue::from),
        "[a-z]{1,6}".prop_map(TreeValue::from),
    ]
}

fn trees() -> impl Strategy<Value = TreeValue> {
    leaves().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(TreeValue::seq),
            prop::collection::btree_map("[a-z]{1,4}", inner, 1..4)
                .prop_map(TreeValue::map),
        ]
    })
}

/// Containers only; leaves cannot be mapped at the root.
fn mappable_trees() -> impl Strategy<Value = TreeValue> {
    prop_oneof![
        prop::collection::vec(trees(), 1..4).prop_map(TreeValue::seq),
        prop::collection::btree_map("[a-z]{1,4}", trees(), 1..4).prop_map(TreeValue::map),
    ]
}

/// Reference traversal: depth-first pre-order (path, subtree) pairs.
fn reference_entries(value: &TreeValue, prefix: &str, out: &mut Vec<(String, TreeValue)>) {
    match value {
        TreeValue::Seq(entries) => {
            for (index, child) in entries.iter().enumerate() {
                let path = format!("{}->{}", prefix, index);
                out.push((path.clone(), child.clone()));
                reference_entries(child, &path, out);
            }
        }
        TreeValue::Map(entries) => {
            for (key, child) in entries {
                let path = format!("{}->{}", prefix, key);
                out.push((path.clone(), child.clone()));
                reference_entries(child, &path, out);
            }
        }
        TreeValue::Leaf(_) => {}
    }
}

fn descendants_are_contiguous(real_paths: &[String]) -> bool {
    real_paths.iter().enumerate().all(|(position, parent)| {
        let prefix = format!("{}->", parent);
        let descendants: Vec<usize> = real_paths
            .iter()
            .enumerate()
            .filter(|(_, path)| path.starts_with(&prefix))
            .map(|(other, _)| other)
            .collect();
        descendants
            .iter()
            .enumerate()
            .all(|(offset, &other)| other == position + 1 + offset)
    })
}

proptest! {
    #[test]
    fn mapping_matches_the_reference_traversal(value in mappable_trees()) {
        let map = map_tree(value.clone()).unwrap();
        let mut expected = Vec::new();
        reference_entries(&value, "", &mut expected);
        let expected_paths: Vec<String> =
            expected.iter().map(|(path, _)| path.clone()).collect();
        prop_assert_eq!(map.real_paths(), expected_paths);
        // Every row's live value round-trips, containers included.
        prop_assert_eq!(map.to_values(), expected);
    }

    #[test]
    fn mapped_rows_are_unique_and_contiguous(value in mappable_trees()) {
        let map = map_tree(value).unwrap();
        let real_paths = map.real_paths();
        let mut deduplicated = real_paths.clone();
        deduplicated.sort();
        deduplicated.dedup();
        prop_assert_eq!(deduplicated.len(), real_paths.len());
        prop_assert!(descendants_are_contiguous(&real_paths));
    }

    #[test]
    fn selection_is_a_subset_in_table_order(
        value in mappable_trees(),
        token in "[a-z]{1,3}",
    ) {
        let map = map_tree(value).unwrap();
        let narrowed = map.select(&[token.as_str()]).unwrap();
        let table_order = map.real_paths();
        let selected = narrowed.real_paths();
        let mut cursor = table_order.iter();
        for path in &selected {
            prop_assert!(
                cursor.any(|candidate| candidate == path),
                "selection out of table order or not a subset: {}",
                path
            );
        }
        // Narrowing again with the same part changes nothing.
        prop_assert_eq!(narrowed.select(&[token.as_str()]).unwrap().real_paths(), selected);
    }

    #[test]
    fn replacing_a_row_keeps_the_table_coherent(
        value in mappable_trees(),
        pick in any::<prop::sample::Index>(),
        replacement in trees(),
    ) {
        let mut map = map_tree(value).unwrap();
        let target = {
            let real_paths = map.real_paths();
            real_paths[pick.index(real_paths.len())].clone()
        };

        map.tree_items()
            .set_by_real_path(&target, replacement.clone())
            .unwrap();

        let real_paths = map.real_paths();
        prop_assert!(real_paths.contains(&target));
        let mut deduplicated = real_paths.clone();
        deduplicated.sort();
        deduplicated.dedup();
        prop_assert_eq!(deduplicated.len(), real_paths.len());
        prop_assert!(descendants_are_contiguous(&real_paths));
        // The target's live value is the replacement.
        prop_assert_eq!(
            map.tree_items().by_real_path(&target).unwrap(),
            replacement
        );
    }
}
