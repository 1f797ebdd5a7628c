//! Extraction Error Types
//!
//! Only failures that make a whole operation pointless are errors here. A
//! sparse or broken package descriptor is reported through
//! [`Diagnostic`](crate::Diagnostic) instead, next to a usable package.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container could not be opened or is not a zip-compatible archive.
    #[display("cannot open archive: {}", _0.display())]
    ArchiveOpen(#[error(not(source))] PathBuf),
    /// No entry with the requested name exists in the archive.
    #[display("archive entry not found: {_0}")]
    EntryNotFound(#[error(not(source))] String),
    /// The entry exists but its bytes could not be read or written out.
    #[display("cannot read archive entry: {_0}")]
    EntryRead(#[error(not(source))] String),
    /// A markup document could not be tokenized.
    #[display("malformed markup in {_0}")]
    MalformedMarkup(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // An archive is either readable or it isn't; the only thing that can
        // change between attempts is the writer side of a copy.
        matches!(self, Self::EntryRead(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            ErrorKind::ArchiveOpen(PathBuf::from("books/a.epub")).to_string(),
            "cannot open archive: books/a.epub"
        );
        assert_eq!(ErrorKind::EntryNotFound("OEBPS/c.jpg".to_string()).to_string(), "archive entry not found: OEBPS/c.jpg");
    }

    #[test]
    fn test_error_kind_retryable() {
        assert!(!ErrorKind::ArchiveOpen(PathBuf::new()).is_retryable());
        assert!(!ErrorKind::EntryNotFound(String::new()).is_retryable());
        assert!(ErrorKind::EntryRead(String::new()).is_retryable());
    }
}
