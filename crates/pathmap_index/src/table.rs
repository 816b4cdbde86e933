//! Insertion-ordered path table with named columns.
//!
//! The row key is column 0 (the rendered real path). A position map is
//! kept in lockstep with the row vector so key lookups stay O(1) while
//! splices remain simple vector operations.

use crate::pattern::{create_selection_pattern, SelectionPattern};
use crate::TREE_NODE_PATH_DELIMITER;
use std::collections::HashMap;

/// One search part of a path selection.
///
/// Parts combine with AND across a query; the alternatives inside one
/// part combine with OR. `*` matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPart {
    alternatives: Vec<String>,
}

impl SearchPart {
    /// A part with a single alternative.
    pub fn new(part: impl Into<String>) -> Self {
        Self {
            alternatives: vec![part.into()],
        }
    }

    /// A part whose alternatives combine with OR.
    pub fn any<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }

    /// The part's alternatives.
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
}

impl From<&str> for SearchPart {
    fn from(part: &str) -> Self {
        SearchPart::new(part)
    }
}

impl From<String> for SearchPart {
    fn from(part: String) -> Self {
        SearchPart::new(part)
    }
}

/// One row of a [`PathIndex`]; `cells[0]` is the row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIndexRow {
    cells: Vec<String>,
}

impl PathIndexRow {
    /// Creates a row from its cells. The first cell is the row key.
    pub fn new(cells: Vec<String>) -> Self {
        debug_assert!(!cells.is_empty(), "a path index row needs a key cell");
        Self { cells }
    }

    /// The row key (rendered real path).
    pub fn key(&self) -> &str {
        &self.cells[0]
    }

    /// All cells in column order.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    fn pad_to(&mut self, width: usize) {
        while self.cells.len() < width {
            self.cells.push(String::new());
        }
    }
}

/// An insertion-ordered table of rendered paths.
///
/// Column 0 holds the row key; the remaining columns hold additional
/// path dimensions. All cells are rendered path strings, with the
/// empty string meaning "not applicable".
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    columns: Vec<String>,
    rows: Vec<PathIndexRow>,
    positions: HashMap<String, usize>,
}

impl PathIndex {
    /// Creates an empty index with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Creates an index from columns and rows, in order.
    pub fn from_rows(columns: Vec<String>, rows: Vec<PathIndexRow>) -> Self {
        let mut index = Self::new(columns);
        index.append_rows(rows);
        index
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the index holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The column names, key column first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Appends columns, padding every existing row with blanks.
    pub fn add_columns(&mut self, columns: Vec<String>) {
        self.columns.extend(columns);
        let width = self.columns.len();
        for row in &mut self.rows {
            row.pad_to(width);
        }
    }

    /// Row keys in table order.
    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.key())
    }

    /// The key at `position`, if in range.
    pub fn key_at(&self, position: usize) -> Option<&str> {
        self.rows.get(position).map(|row| row.key())
    }

    /// The position of `key`, if present.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// True if `key` is a row of this index.
    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// The cell of `key` in `column`.
    pub fn cell(&self, key: &str, column: &str) -> Option<&str> {
        let row = self.positions.get(key).map(|&position| &self.rows[position])?;
        let column_position = self.column_position(column)?;
        row.cells.get(column_position).map(String::as_str)
    }

    /// The position of a column by name.
    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Appends rows at the end of the table.
    pub fn append_rows(&mut self, rows: Vec<PathIndexRow>) {
        let position = self.rows.len();
        self.insert_rows_at(position, rows);
    }

    /// Splices `rows` into the table starting at `position`.
    ///
    /// Rows narrower than the table are padded with blank cells;
    /// `position` is clamped to the table length. Positions of all rows
    /// at or behind the splice point are rebuilt.
    pub fn insert_rows_at(&mut self, position: usize, rows: Vec<PathIndexRow>) {
        let position = position.min(self.rows.len());
        let width = self.columns.len();
        let mut padded = rows;
        for row in &mut padded {
            row.pad_to(width);
        }
        self.rows.splice(position..position, padded);
        self.rebuild_positions_from(position);
    }

    /// Removes the rows for `keys`; unknown keys are ignored.
    pub fn remove_keys(&mut self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let first_removed = keys
            .iter()
            .filter_map(|key| self.positions.get(key).copied())
            .min();
        let Some(first_removed) = first_removed else {
            return;
        };
        for key in keys {
            self.positions.remove(key);
        }
        let positions = &self.positions;
        self.rows.retain(|row| positions.contains_key(row.key()));
        self.rebuild_positions_from(first_removed);
    }

    /// Reorders the table to the given key order.
    ///
    /// `keys` must be a permutation of the current row keys; keys not
    /// present are ignored, rows not named keep their relative order at
    /// the end.
    pub fn reorder(&mut self, keys: &[String]) {
        let mut ordered: Vec<PathIndexRow> = Vec::with_capacity(self.rows.len());
        let mut taken: Vec<bool> = vec![false; self.rows.len()];
        for key in keys {
            if let Some(&position) = self.positions.get(key) {
                if !taken[position] {
                    taken[position] = true;
                    ordered.push(self.rows[position].clone());
                }
            }
        }
        for (position, row) in self.rows.iter().enumerate() {
            if !taken[position] {
                ordered.push(row.clone());
            }
        }
        self.rows = ordered;
        self.rebuild_positions_from(0);
    }

    /// Stable-sorts the rows by their rendered value in `column`.
    pub fn sort_by_column(&mut self, column: &str) {
        let Some(column_position) = self.column_position(column) else {
            return;
        };
        self.rows
            .sort_by(|a, b| a.cells[column_position].cmp(&b.cells[column_position]));
        self.rebuild_positions_from(0);
    }

    /// Restricts `pre_selection` (default: all rows, table order) to
    /// rows whose cell in `column` matches every part.
    pub fn select(
        &self,
        column: &str,
        parts: &[SearchPart],
        pre_selection: Option<&[String]>,
    ) -> Vec<String> {
        let Some(column_position) = self.column_position(column) else {
            return Vec::new();
        };
        let candidates: Vec<&PathIndexRow> = match pre_selection {
            Some(keys) => keys
                .iter()
                .filter_map(|key| self.positions.get(key))
                .map(|&position| &self.rows[position])
                .collect(),
            None => self.rows.iter().collect(),
        };
        candidates
            .into_iter()
            .filter(|row| {
                let cell = &row.cells[column_position];
                parts.iter().all(|part| part_matches_path(part, cell))
            })
            .map(|row| row.key().to_string())
            .collect()
    }

    /// Row keys whose proper prefix is `key`, in table order.
    ///
    /// Because mapped descendants are stored contiguously after their
    /// parent, the result is one contiguous block.
    pub fn sub_paths_of(&self, key: &str) -> Vec<String> {
        let pattern = create_selection_pattern(key, "*");
        self.rows
            .iter()
            .filter(|row| pattern.matches(row.key()))
            .map(|row| row.key().to_string())
            .collect()
    }

    /// Row keys whose cell in `column` is non-blank, in table order.
    pub fn entries_with_value(&self, column: &str) -> Vec<String> {
        let Some(column_position) = self.column_position(column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter(|row| !row.cells[column_position].is_empty())
            .map(|row| row.key().to_string())
            .collect()
    }

    fn rebuild_positions_from(&mut self, start: usize) {
        for (offset, row) in self.rows[start..].iter().enumerate() {
            self.positions
                .insert(row.key().to_string(), start + offset);
        }
    }
}

/// True if `path` matches one of the part's alternatives.
///
/// An alternative is normalized to start with the path delimiter and
/// then matched either at the end of the path or followed by deeper
/// tokens, so `a` matches `->a` and `->x->a->y` but not `->another`.
fn part_matches_path(part: &SearchPart, path: &str) -> bool {
    part.alternatives().iter().any(|alternative| {
        if alternative == "*" {
            return true;
        }
        let normalized = if alternative.starts_with(TREE_NODE_PATH_DELIMITER) {
            alternative.clone()
        } else {
            format!("{}{}", TREE_NODE_PATH_DELIMITER, alternative)
        };
        let at_end = SelectionPattern::compile(&format!("*{}", normalized));
        if at_end.matches(path) {
            return true;
        }
        let inside = SelectionPattern::compile(&format!(
            "*{}{}*",
            normalized, TREE_NODE_PATH_DELIMITER
        ));
        inside.matches(path)
    })
}
