//! Error types for ledger operations.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. `std::io::Error` and `serde_json::Error` are converted via
//! `From` impls. Use [`Error::kind`] when a caller only needs to branch on the
//! category of failure.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, mutating or persisting the mod ledger.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading or writing the ledger, reading a legacy ledger).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger document could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The ledger file does not exist. Call [`LedgerStore::create`](crate::LedgerStore::create) first.
    #[error("Ledger not found: {0}")]
    LedgerNotFound(Utf8PathBuf),

    /// No active ledger entry exists for the given archive path.
    #[error("Mod not found: {0}")]
    ModNotFound(String),

    /// No mod pack with the given name is recorded in the ledger.
    #[error("Mod pack not found: {0}")]
    ModPackNotFound(String),

    /// The caller passed an empty path, an unknown group selector, or similar.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The live index offset for a path matches neither offset recorded in the ledger.
    #[error(
        "Index offset {index_offset} for '{path}' matches neither the original offset \
         {original_offset} nor the mod offset {mod_offset}"
    )]
    IndexLedgerMismatch {
        path: String,
        index_offset: i64,
        original_offset: i64,
        mod_offset: i64,
    },

    /// The archive index rejected a read, write or descriptor removal.
    #[error("Index error: {0}")]
    Index(String),

    /// A record of a legacy ledger could not be decoded or redirected.
    #[error("Unable to disable legacy record {name} | {path} (line {line}): {source}")]
    MigrationRecord {
        line: usize,
        name: String,
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// A batch stopped at its first failure. Every path in `applied` already had
    /// its index entry redirected, but the ledger was not saved.
    #[error(
        "Batch interrupted at '{failed_path}' after {} of {total} entries were applied: {source}",
        .applied.len()
    )]
    BatchInterrupted {
        failed_path: String,
        applied: Vec<String>,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    /// Catch-all for errors raised by index implementations and other sources.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

/// Coarse failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing ledger, mod entry or mod pack.
    NotFound,
    /// Empty path, unknown group selector, duplicate entry.
    InvalidArgument,
    /// Ledger and archive index disagree about a path.
    IndexLedgerMismatch,
    /// Underlying storage fault (ledger file, archive index).
    Io,
    /// A legacy ledger record failed to migrate.
    MigrationRecord,
    /// A batch stopped part-way; some index writes are not recorded in the ledger.
    PartialBatch,
}

impl Error {
    /// Map this error onto its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LedgerNotFound(_) | Error::ModNotFound(_) | Error::ModPackNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::IndexLedgerMismatch { .. } => ErrorKind::IndexLedgerMismatch,
            Error::Io(_) | Error::Json(_) | Error::Index(_) | Error::Other(_) => ErrorKind::Io,
            Error::MigrationRecord { .. } => ErrorKind::MigrationRecord,
            Error::BatchInterrupted { .. } => ErrorKind::PartialBatch,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
