//! SQLite catalogue of imported books.
//!
//! The catalogue records every archive that has been imported, together
//! with its extracted metadata, the cover path resolved at import time and
//! the reader's own bookkeeping (status, reading date, rating). Archives are
//! keyed by file name.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{Book, ReadingStatus};
pub use crate::repo::Repository;
