//! Errors surfaced by fallible table operations.

use std::collections::TryReserveError;
use thiserror::Error;

/// Allocation failures. A failed operation leaves the table as it was.
///
/// Missing keys and duplicate inserts are ordinary results, not errors.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("bucket array allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
    #[error("node arena is full ({0} nodes)")]
    CapacityOverflow(usize),
}
