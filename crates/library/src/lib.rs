//! Turns extracted packages into displayable covers.
//!
//! [`CoverResolver`] answers synchronously from the cache or the archive
//! itself, and hands everything else to the [`EnrichmentWorker`] through a
//! bounded [queue](channel). [`import`] drives the whole thing for a books
//! directory.

pub mod cache;
pub mod error;
mod import;
pub mod queue;
mod resolve;
mod worker;

pub use crate::cache::CoverCache;
pub use crate::import::{ImportEvent, Imported, extract_archive, import};
pub use crate::queue::{Enqueued, EnrichmentInbox, EnrichmentQueue, channel};
pub use crate::resolve::{CoverOrigin, CoverResolver, Resolution};
pub use crate::worker::{Enrichment, EnrichmentWorker, WorkerReport};

/// Archives imported at the same time. Each one holds a blocking thread
/// while it is unzipped and scored, so this stays small.
const MAX_IMPORT_CONCURRENCY: usize = 4;
