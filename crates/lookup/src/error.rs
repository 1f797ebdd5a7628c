//! Lookup Error Types
//!
//! None of these reach the caller that asked for a cover: lookups only run
//! on the background worker, which logs them and moves on.

use derive_more::{Display, Error};

/// A lookup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for lookup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed.
    #[display("cannot build HTTP client")]
    Client,
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[display("request failed: {_0}")]
    Request(#[error(not(source))] String),
    /// The service answered with a non-success status.
    #[display("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    /// The response body was not what the service documents.
    #[display("cannot decode response from {_0}")]
    Decode(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Client | Self::Decode(_) => false,
        }
    }
}
