//! Error type for test selection.

use thiserror::Error;

/// Errors returned by the test selector and its input constructors.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Fewer than two groups were supplied.
    #[error("at least two groups have to be provided (got {found})")]
    TooFewGroups {
        /// Number of groups supplied.
        found: usize,
    },

    /// A group name was supplied more than once.
    #[error("duplicate group name `{0}`")]
    DuplicateGroup(String),

    /// A table row does not have one cell per column.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        /// Zero-based row index.
        row: usize,
        /// Number of columns in the header.
        expected: usize,
        /// Number of cells in the row.
        found: usize,
    },

    /// The selected test could not be computed for the data.
    #[error("{test} could not be computed for the given data")]
    TestFailed {
        /// Display name of the test or procedure that failed.
        test: &'static str,
    },

    /// Invalid selector configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
