//! Error types for the pathmap core.

use thiserror::Error;

/// Result type for pathmap operations.
pub type MapResult<T> = Result<T, MapError>;

/// Errors raised by pathmap operations.
///
/// All variants are synchronous precondition failures: a mutating
/// operation either completes fully or is rejected before any state
/// changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// The real path is not present in the path map table at all.
    #[error("real path '{real_path}' does not exist in this path map")]
    UnknownRealPath {
        /// The requested real path.
        real_path: String,
    },

    /// The real path exists in the table but is outside the current
    /// selection.
    #[error("real path '{real_path}' is not part of this selection")]
    RealPathNotSelected {
        /// The requested real path.
        real_path: String,
    },

    /// An integer position outside `[0, len)` of the selection.
    #[error("position {position} out of range of {len} tree node items")]
    PositionOutOfRange {
        /// The requested position.
        position: usize,
        /// The selection's length.
        len: usize,
    },

    /// Assignment targeting the synthetic root item.
    #[error("the tree root cannot be assigned through a path map")]
    RootMutation,

    /// Item insertion without a parent item.
    #[error("tree node items cannot be inserted at root level; a parent item is required")]
    RootInsertion,

    /// The value handed to the tree walker is itself a leaf.
    #[error("expected a sequence or mapping to map, got a leaf")]
    LeafAtRoot,

    /// `where` arguments not supplied as complete key/target pairs.
    #[error("where search parts must come in key/target pairs, got {count} parts")]
    UnpairedWhereParts {
        /// Number of parts supplied.
        count: usize,
    },

    /// A path dimension name or position unknown to the table.
    #[error("path dimension '{dimension}' does not exist in this path map")]
    UnknownDimension {
        /// The requested dimension.
        dimension: String,
    },
}

impl MapError {
    /// Creates an unknown-real-path error.
    pub fn unknown_real_path(real_path: impl Into<String>) -> Self {
        Self::UnknownRealPath {
            real_path: real_path.into(),
        }
    }

    /// Creates a not-selected error.
    pub fn not_selected(real_path: impl Into<String>) -> Self {
        Self::RealPathNotSelected {
            real_path: real_path.into(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(position: usize, len: usize) -> Self {
        Self::PositionOutOfRange { position, len }
    }

    /// Creates an unknown-dimension error.
    pub fn unknown_dimension(dimension: impl Into<String>) -> Self {
        Self::UnknownDimension {
            dimension: dimension.into(),
        }
    }
}
