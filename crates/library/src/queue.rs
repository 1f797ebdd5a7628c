//! Bounded enrichment queue.
//!
//! Many producers (the resolution pipeline), one consumer (the
//! [`EnrichmentWorker`](crate::EnrichmentWorker)). Requests are served in
//! the order they were queued and are never deduplicated.

use crate::error::{ErrorKind, Result};
use folio_epub::models::Package;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender, error::SendTimeoutError};
use tracing::instrument;

/// Outcome of [`EnrichmentQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// The queue stayed full for the whole enqueue timeout; the request was
    /// not queued.
    Full,
}

/// Producer handle. Cheap to clone; the worker returns once every handle
/// has been dropped and the backlog is drained.
#[derive(Debug, Clone)]
pub struct EnrichmentQueue {
    sender: Sender<Arc<Package>>,
    enqueue_timeout: Duration,
}

/// Consumer end, handed to the worker.
#[derive(Debug)]
pub struct EnrichmentInbox {
    pub(crate) receiver: Receiver<Arc<Package>>,
}

/// Creates a queue holding at most `capacity` pending requests.
///
/// Producers facing a full queue wait up to `enqueue_timeout` for room.
pub fn channel(capacity: usize, enqueue_timeout: Duration) -> (EnrichmentQueue, EnrichmentInbox) {
    // A zero-capacity channel panics; configuration rejects it earlier.
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (EnrichmentQueue { sender, enqueue_timeout }, EnrichmentInbox { receiver })
}

impl EnrichmentQueue {
    #[instrument(level = "debug", skip_all, fields(book = %package.book_file))]
    pub async fn enqueue(&self, package: Arc<Package>) -> Result<Enqueued> {
        match self.sender.send_timeout(package, self.enqueue_timeout).await {
            Ok(()) => {
                tracing::debug!(pending = self.pending(), "Queued for enrichment");
                Ok(Enqueued::Queued)
            },
            Err(SendTimeoutError::Timeout(package)) => {
                tracing::warn!(
                    book = %package.book_file,
                    capacity = self.capacity(),
                    "Enrichment queue is full; request rejected"
                );
                Ok(Enqueued::Full)
            },
            Err(SendTimeoutError::Closed(_)) => exn::bail!(ErrorKind::QueueClosed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Requests queued and not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

impl EnrichmentInbox {
    /// Stops accepting requests and throws away whatever is still queued,
    /// returning how many requests were dropped.
    pub(crate) fn discard(&mut self) -> usize {
        self.receiver.close();
        let mut discarded = 0;
        while self.receiver.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}
