//! Catalogue Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalogue error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalogue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database schema error")]
    Schema,
    #[display("book not found: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("book already catalogued: {_0}")]
    AlreadyExists(#[error(not(source))] String),
    /// A value could not be converted to or from its stored form.
    #[display("invalid catalogue data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY surfaces as a plain database error; everything else is
        // about the data itself and will fail the same way again.
        matches!(self, Self::Database)
    }
}
