//! Background enrichment worker.

use crate::cache::CoverCache;
use crate::error::{ErrorKind, Result};
use crate::queue::EnrichmentInbox;
use exn::ResultExt;
use folio_catalogue::Repository;
use folio_epub::models::Package;
use folio_lookup::CoverSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// What happened to one dequeued book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// Another request for the same title already filled the cache.
    AlreadyCached(PathBuf),
    /// A cover was downloaded into the cache.
    Fetched(PathBuf),
    /// The service has no cover for this book.
    Unavailable,
}

/// Tally returned when the worker stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: usize,
    pub fetched: usize,
    pub already_cached: usize,
    pub unavailable: usize,
    pub failed: usize,
    /// Requests still queued when the worker was cancelled.
    pub discarded: usize,
}

/// Single consumer of the enrichment queue.
///
/// Runs until either every [`EnrichmentQueue`](crate::EnrichmentQueue)
/// handle is dropped (the backlog is drained first) or its cancellation
/// token fires (the backlog is discarded and counted). A book being looked
/// up when cancellation arrives is finished first; each request is bounded
/// by the client's timeout.
pub struct EnrichmentWorker {
    inbox: EnrichmentInbox,
    source: Arc<dyn CoverSource>,
    cache: CoverCache,
    pace: Duration,
    catalogue: Option<Repository>,
}

impl EnrichmentWorker {
    /// `pace` is the pause between two books, to stay within the service's
    /// rate limits.
    pub fn new(inbox: EnrichmentInbox, source: Arc<dyn CoverSource>, cache: CoverCache, pace: Duration) -> Self {
        Self { inbox, source, cache, pace, catalogue: None }
    }

    /// Also record fetched covers in the catalogue.
    pub fn with_catalogue(self, catalogue: Repository) -> Self {
        Self { catalogue: Some(catalogue), ..self }
    }

    #[instrument(name = "enrichment", skip_all)]
    pub async fn run(mut self, token: CancellationToken) -> WorkerReport {
        let mut report = WorkerReport::default();
        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => None,
                package = self.inbox.receiver.recv() => Some(package),
            };
            let package = match next {
                None => {
                    report.discarded = self.discard();
                    break;
                },
                // Every producer is gone and the backlog is empty.
                Some(None) => break,
                Some(Some(package)) => package,
            };

            report.processed += 1;
            match self.enrich(&package).await {
                Ok(Enrichment::Fetched(path)) => {
                    report.fetched += 1;
                    tracing::info!(book = %package.book_file, path = %path.display(), "Fetched cover");
                },
                Ok(Enrichment::AlreadyCached(_)) => report.already_cached += 1,
                Ok(Enrichment::Unavailable) => {
                    report.unavailable += 1;
                    tracing::info!(book = %package.book_file, "No external cover available");
                },
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(book = %package.book_file, error = ?err, "Cover enrichment failed");
                },
            }

            let paced = tokio::select! {
                biased;
                () = token.cancelled() => false,
                () = tokio::time::sleep(self.pace) => true,
            };
            if !paced {
                report.discarded = self.discard();
                break;
            }
        }
        tracing::info!(?report, "Enrichment worker stopped");
        report
    }

    fn discard(&mut self) -> usize {
        let discarded = self.inbox.discard();
        if discarded > 0 {
            tracing::warn!(discarded, "Shutting down; discarded pending enrichment requests");
        }
        discarded
    }

    #[instrument(skip_all, fields(book = %package.book_file))]
    async fn enrich(&self, package: &Package) -> Result<Enrichment> {
        let path = self.cache.path_for(package);
        // The same title may be queued several times; only the first one
        // has to hit the network.
        if self.cache.contains(&path).await {
            return Ok(Enrichment::AlreadyCached(path));
        }
        let id = self.source.find_cover(package.title(), package.author()).await.or_raise(|| ErrorKind::Lookup)?;
        let Some(id) = id else {
            return Ok(Enrichment::Unavailable);
        };
        let bytes = self.source.fetch_cover(id).await.or_raise(|| ErrorKind::Lookup)?;
        self.cache.store(&path, bytes).await?;
        if let Some(catalogue) = &self.catalogue
            && let Err(err) = catalogue.set_cover_path(&package.book_file, &path).await
        {
            tracing::warn!(error = ?err, "Cover fetched but not recorded in catalogue");
        }
        Ok(Enrichment::Fetched(path))
    }
}
