//! Library Error Types
//!
//! Only failures that abort a whole operation live here. Scoring
//! and lookup trouble is logged where it happens and degrades to "no cover".

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive could not be opened or read.
    #[display("cannot read archive {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    /// A cover could not be written into the cache directory.
    #[display("cannot write cover cache file {}", _0.display())]
    CacheWrite(#[error(not(source))] PathBuf),
    /// The books directory could not be listed.
    #[display("cannot list books in {}", _0.display())]
    Discovery(#[error(not(source))] PathBuf),
    /// The enrichment worker is gone; nothing will drain the queue.
    #[display("enrichment queue is closed")]
    QueueClosed,
    /// A [catalogue](folio_catalogue::Repository) lookup or update failed.
    #[display("catalogue operation failed")]
    Catalogue,
    /// The external bibliographic service could not provide a cover.
    #[display("cover lookup failed")]
    Lookup,
    /// A blocking task panicked or was cancelled.
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CacheWrite(_) | Self::Lookup)
    }
}
