use crate::cache::{CoverCache, persist_entry};
use crate::error::{ErrorKind, Result};
use crate::queue::{Enqueued, EnrichmentQueue};
use exn::ResultExt;
use folio_epub::Archive;
use folio_epub::models::Package;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Which offline step produced a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOrigin {
    /// Picked by the quality scorer.
    Scored,
    /// The entry the package descriptor points at.
    Referenced,
}

/// Result of [`CoverResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The cache already had a cover for this title.
    Cached(PathBuf),
    /// A cover was copied out of the archive into the cache just now.
    Extracted { path: PathBuf, origin: CoverOrigin },
    /// Nothing usable offline; the book is queued for enrichment and its
    /// cover may show up in the cache later.
    Pending,
    /// Nothing usable offline and the enrichment queue stayed full.
    QueueFull,
}
impl Resolution {
    /// The local cover file, when one is available right now.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Cached(path) | Self::Extracted { path, .. } => Some(path),
            Self::Pending | Self::QueueFull => None,
        }
    }
}

/// The cover resolution pipeline.
///
/// Tries, in order: the cache, the quality scorer, the descriptor's cover
/// reference, and finally the enrichment queue. The first three answer
/// synchronously; the queue only promises to try later.
#[derive(Debug, Clone)]
pub struct CoverResolver {
    cache: CoverCache,
    queue: EnrichmentQueue,
}
impl CoverResolver {
    pub fn new(cache: CoverCache, queue: EnrichmentQueue) -> Self {
        Self { cache, queue }
    }

    pub fn cache(&self) -> &CoverCache {
        &self.cache
    }

    /// Produces a displayable cover for `package`, or queues it for enrichment.
    ///
    /// # Errors
    ///
    /// - [`CacheWrite`](ErrorKind::CacheWrite) if an archive entry was chosen
    ///   but couldn't be copied into the cache,
    /// - [`Archive`](ErrorKind::Archive) if the descriptor names a cover but
    ///   the archive can't be opened to read it,
    /// - [`QueueClosed`](ErrorKind::QueueClosed) if the worker has shut down.
    #[instrument(skip_all, fields(book = %package.book_file))]
    pub async fn resolve(&self, package: Arc<Package>) -> Result<Resolution> {
        let path = self.cache.path_for(&package);
        if self.cache.contains(&path).await {
            tracing::debug!(path = %path.display(), "Cover cache hit");
            return Ok(Resolution::Cached(path));
        }

        let offline = {
            let package = Arc::clone(&package);
            let dest = path.clone();
            tokio::task::spawn_blocking(move || extract_offline(&package, &dest))
                .await
                .or_raise(|| ErrorKind::Task)??
        };
        if let Some(origin) = offline {
            return Ok(Resolution::Extracted { path, origin });
        }

        Ok(match self.queue.enqueue(package).await? {
            Enqueued::Queued => Resolution::Pending,
            Enqueued::Full => Resolution::QueueFull,
        })
    }
}

/// Steps two and three of the pipeline; blocking.
fn extract_offline(package: &Package, dest: &Path) -> Result<Option<CoverOrigin>> {
    let mut archive = match Archive::open(&package.archive) {
        Ok(archive) => Some(archive),
        Err(err) => {
            tracing::warn!(error = ?err, "Cannot open archive for cover scoring");
            None
        },
    };

    if let Some(archive) = archive.as_mut() {
        match folio_cover::best_cover(archive) {
            Ok(Some(candidate)) => {
                persist_entry(archive, &candidate.entry, dest)?;
                return Ok(Some(CoverOrigin::Scored));
            },
            Ok(None) => {},
            Err(err) => tracing::warn!(error = ?err, "Cover scoring failed"),
        }
    }

    let Some(reference) = package.cover_path.as_deref() else {
        return Ok(None);
    };
    let mut archive = match archive {
        Some(archive) => archive,
        None => Archive::open(&package.archive).or_raise(|| ErrorKind::Archive(package.archive.clone()))?,
    };
    let Some(entry) = archive.find(reference).map(str::to_string) else {
        tracing::warn!(%reference, "Referenced cover is not in the archive");
        return Ok(None);
    };
    persist_entry(&mut archive, &entry, dest)?;
    Ok(Some(CoverOrigin::Referenced))
}
