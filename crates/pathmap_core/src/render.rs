//! Multi-line detailed representation of tables and selections.

use crate::table::PathMapTable;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Renders the given rows (default: the whole table), one real path
/// per line, with non-blank additional paths and non-empty meta
/// attributes indented beneath it. An empty scope renders as
/// `<empty map>`.
pub(crate) fn detailed_representation(
    table: &PathMapTable,
    selection: Option<&[String]>,
) -> String {
    let real_paths: Vec<String> = match selection {
        Some(paths) => paths.to_vec(),
        None => table.real_paths(),
    };
    if real_paths.is_empty() {
        return "<empty map>".to_string();
    }
    let columns = table.columns();
    let mut rendered = String::new();
    for (row, real_path) in real_paths.iter().enumerate() {
        if row > 0 {
            rendered.push('\n');
        }
        rendered.push_str(real_path);
        let Ok(item) = table.item_by_real_path(real_path) else {
            continue;
        };
        for (slot, column) in columns.iter().enumerate().skip(1) {
            let path = item.rendered_path(slot);
            if !path.is_empty() {
                let _ = write!(rendered, "\n{}{}: {}", INDENT, column, path);
            }
        }
        let attributes = item.meta_attributes();
        if !attributes.is_empty() {
            let _ = write!(rendered, "\n{}meta attributes: {}", INDENT, attributes);
        }
    }
    rendered
}
