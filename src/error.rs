//! Error types for the table and the timing harness

use std::io;

use thiserror::Error;

/// Failures raised by [`AssociativeTable`](crate::AssociativeTable).
///
/// A missing key is never an error: lookups return `None` and removals return `false`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// A table cannot be built around zero slots
    #[error("Invalid capacity request: {requested}, capacity must be at least 1")]
    InvalidCapacityRequest {
        /// The capacity that was asked for
        requested: usize,
    },
    /// An open-addressing walk ran out of distinct slots without finding a free one
    #[error("Probe sequence exhausted after {attempts} attempts in a table of capacity {capacity}")]
    ProbeExhausted {
        /// Capacity of the table at the time of the walk
        capacity: usize,
        /// Number of probe attempts made
        attempts: usize,
    },
}

/// Failures raised while measuring a table or persisting the measurements
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The results file could not be opened or written
    #[error("Couldnt write performance results: {0}")]
    Io(#[from] io::Error),
    /// The table under measurement rejected an operation
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Result alias used throughout the table API
pub type Result<T, E = TableError> = std::result::Result<T, E>;
