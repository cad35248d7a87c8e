//! Error types for the shortest path run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or running a distributed
/// shortest path computation.
#[derive(Debug, Error)]
pub enum ApspError {
    /// Grid shape does not match the number of ranks.
    #[error("{requested} procs requested while only {available} procs available")]
    GridMismatch { requested: usize, available: usize },

    /// Grid dimensions cannot partition the matrix.
    #[error("invalid process grid: {0}")]
    InvalidGrid(String),

    /// Out of range run parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file could not be opened, read or written.
    #[error("could not access file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Matrix file content is malformed.
    #[error("failed to parse matrix on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Cell index outside the matrix.
    #[error("index ({row}, {col}) out of bounds for {n}x{n} matrix")]
    OutOfBounds { row: usize, col: usize, n: usize },

    /// Matrix shape does not match what the caller expects.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Another rank failed a shared precondition and the run was abandoned.
    #[error("a peer rank failed before the computation started")]
    PeerFailed,

    /// Distributed result differs from the sequential reference.
    #[error("verification failed at ({row}, {col}): expected {expected}, found {found}")]
    VerificationFailed {
        row: usize,
        col: usize,
        expected: u32,
        found: u32,
    },

    /// Collective operation could not complete.
    #[error("communication error: {0}")]
    Communication(String),
}

impl ApspError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ApspError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for shortest path operations.
pub type Result<T> = std::result::Result<T, ApspError>;
