//! Scorer Error Types

use derive_more::{Display, Error};

/// A scoring error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scoring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Either kind aborts the whole scoring pass; callers are expected to treat
/// it as "no candidate" and move on to the next fallback.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An image entry could not be read out of the archive.
    #[display("cannot read image entry: {_0}")]
    Archive(#[error(not(source))] String),
    /// An image entry is not a decodable JPEG.
    #[display("cannot decode image entry: {_0}")]
    Decode(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
