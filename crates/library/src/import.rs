use crate::MAX_IMPORT_CONCURRENCY;
use crate::error::{ErrorKind, Result};
use crate::resolve::{CoverResolver, Resolution};
use async_stream::stream;
use exn::ResultExt;
use folio_catalogue::{Book, Repository};
use folio_epub::{Diagnostic, Extraction};
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

const ARCHIVE_EXTENSION: &str = "epub";

/// Progress events emitted by [`import`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of archives not yet in the catalogue.
/// 3. [`Imported`](Self::Imported) zero or more times, one per archive.
/// 4. [`Complete`](Self::Complete) exactly once.
///
/// Only a discovery failure ends the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum ImportEvent {
    Started,
    DiscoveryComplete(u64),
    Imported(Box<Imported>),
    Complete,
}

/// One archive that made it into the catalogue.
#[derive(Debug)]
pub struct Imported {
    pub book: Book,
    /// `None` when cover resolution failed; the book is catalogued anyway.
    pub resolution: Option<Resolution>,
    /// Set when the archive's descriptor was missing or damaged.
    pub diagnostic: Option<Diagnostic>,
}

/// Streams [`ImportEvent`]s while importing every archive in `books_dir`
/// that the catalogue doesn't know yet.
///
/// Each archive is extracted, its cover resolved through `resolver` and the
/// result inserted into `catalogue`. Up to `MAX_IMPORT_CONCURRENCY` archives
/// are in flight at once. A bad archive is yielded as an `Err` item without
/// terminating the stream.
pub fn import<'a>(
    books_dir: &'a Path,
    catalogue: &'a Repository,
    resolver: &'a CoverResolver,
) -> impl Stream<Item = Result<ImportEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(ImportEvent::Started);

        let files = match discover(books_dir, catalogue).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(ImportEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(0)));

        // Futures are created lazily, in discovery order, as slots free up.
        let mut pending = files.into_iter().map(|path| import_file(path, catalogue, resolver));
        let mut processing: FuturesUnordered<_> = pending.by_ref().take(MAX_IMPORT_CONCURRENCY).collect();
        while let Some(result) = processing.next().await {
            yield result.map(|imported| ImportEvent::Imported(Box::new(imported)));
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }

        yield Ok(ImportEvent::Complete);
    })
}

/// Archives in `books_dir` whose file name isn't catalogued, sorted by path.
async fn discover(books_dir: &Path, catalogue: &Repository) -> Result<Vec<PathBuf>> {
    let known: HashSet<String> =
        catalogue.file_names().await.or_raise(|| ErrorKind::Catalogue)?.into_iter().collect();
    let failed = || ErrorKind::Discovery(books_dir.to_path_buf());
    let mut entries = tokio::fs::read_dir(books_dir).await.or_raise(failed)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.or_raise(failed)? {
        let path = entry.path();
        let is_archive =
            path.extension().is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if !is_archive || !entry.file_type().await.or_raise(failed)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if known.contains(&name) {
            tracing::debug!(book = %name, "Already catalogued");
            continue;
        }
        files.push(path);
    }
    files.sort();
    tracing::info!(dir = %books_dir.display(), count = files.len(), "Discovered archives to import");
    Ok(files)
}

/// Extracts the archive at `path` on a blocking thread.
pub async fn extract_archive(path: impl Into<PathBuf>) -> Result<Extraction> {
    let path = path.into();
    let failed = || ErrorKind::Archive(path.clone());
    let source = path.clone();
    tokio::task::spawn_blocking(move || folio_epub::extract(source))
        .await
        .or_raise(|| ErrorKind::Task)?
        .or_raise(failed)
}

#[instrument(skip_all, fields(archive = %path.display()))]
async fn import_file(path: PathBuf, catalogue: &Repository, resolver: &CoverResolver) -> Result<Imported> {
    let Extraction { package, diagnostic } = extract_archive(&path).await?;
    let package = Arc::new(package);
    let resolution = match resolver.resolve(Arc::clone(&package)).await {
        Ok(resolution) => Some(resolution),
        Err(err) => {
            tracing::warn!(error = ?err, "Cover resolution failed; importing without cover");
            None
        },
    };
    let cover = resolution.as_ref().and_then(Resolution::path);
    let book = catalogue.insert(&package, cover).await.or_raise(|| ErrorKind::Catalogue)?;
    tracing::info!(book = %book.file_name, title = %book.metadata.title, "Imported");
    Ok(Imported { book, resolution, diagnostic })
}
