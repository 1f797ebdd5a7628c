//! External bibliographic lookup.
//!
//! Finds a cover for a book by title and author when nothing inside the
//! archive is good enough. [`CoverSource`] is the seam the enrichment worker
//! talks to, [`OpenLibrary`] the production implementation.

pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod openlibrary;
mod source;

#[cfg(feature = "mock")]
pub use crate::mock::MockCoverSource;
pub use crate::openlibrary::{OpenLibrary, SearchDoc, SearchResponse, user_agent};
pub use crate::source::{CoverId, CoverSource};
