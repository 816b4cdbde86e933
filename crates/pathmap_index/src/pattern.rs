//! Wildcard selection patterns over rendered tree paths.

use crate::TREE_NODE_PATH_DELIMITER;

/// A compiled `*`-wildcard pattern.
///
/// `*` matches any run of characters (including none); every other
/// character matches itself. Patterns are compiled once and matched
/// against many rendered paths during a selection scan.
///
/// # Example
///
/// ```
/// use pathmap_index::SelectionPattern;
///
/// let pattern = SelectionPattern::compile("*->a->*");
/// assert!(pattern.matches("->a->b"));
/// assert!(!pattern.matches("->another"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPattern {
    chars: Vec<char>,
}

impl SelectionPattern {
    /// Compiles a pattern string.
    pub fn compile(pattern: &str) -> Self {
        Self {
            chars: pattern.chars().collect(),
        }
    }

    /// Returns true if `text` matches this pattern.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let pattern = &self.chars;
        let mut pi = 0;
        let mut ti = 0;
        // Position of the last `*` seen and the text position it was
        // tried against, for backtracking.
        let mut star: Option<usize> = None;
        let mut mark = 0;
        while ti < text.len() {
            if pi < pattern.len() && pattern[pi] != '*' && pattern[pi] == text[ti] {
                pi += 1;
                ti += 1;
            } else if pi < pattern.len() && pattern[pi] == '*' {
                star = Some(pi);
                mark = ti;
                pi += 1;
            } else if let Some(star_position) = star {
                pi = star_position + 1;
                mark += 1;
                ti = mark;
            } else {
                return false;
            }
        }
        while pi < pattern.len() && pattern[pi] == '*' {
            pi += 1;
        }
        pi == pattern.len()
    }
}

/// Builds the pattern used for sub-path scans: `root` joined with
/// `suffix` by the path delimiter.
///
/// `create_selection_pattern("->a", "*")` compiles to `->a->*`, which
/// matches every proper sub-path of `->a` and nothing else.
pub fn create_selection_pattern(root_path: &str, suffix: &str) -> SelectionPattern {
    SelectionPattern::compile(&format!(
        "{}{}{}",
        root_path, TREE_NODE_PATH_DELIMITER, suffix
    ))
}
