//! Error types for ledger operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or persisting the status snapshot.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to read or write the snapshot file.
    #[error("ledger IO error at {path}: {source}")]
    Io {
        /// The snapshot path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// Creates an IO error with the snapshot path as context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
