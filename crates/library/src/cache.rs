//! Cover cache directory.
//!
//! One file per title, named `<title with spaces as underscores>.jpg`. The
//! name is a pure function of the title so the synchronous pipeline and the
//! background worker agree on it without talking to each other. Two books
//! sharing a title share a slot, last writer wins.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_epub::Archive;
use folio_epub::models::Package;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const COVER_EXTENSION: &str = "jpg";

/// File stem of a package's cache slot.
///
/// Spaces become underscores, and so do path separators: a title such as
/// `/etc/passwd` or `../x` must stay a single file inside the cache
/// directory. Falls back to the archive's own file stem for untitled books,
/// so that they don't all end up in `.jpg`.
pub fn cache_key(package: &Package) -> String {
    let title = package.title();
    if !title.is_empty() {
        return sanitize(title);
    }
    Path::new(&package.book_file)
        .file_stem()
        .map(|stem| sanitize(&stem.to_string_lossy()))
        .unwrap_or_default()
}

fn sanitize(name: &str) -> String {
    name.chars().map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c }).collect()
}

/// Deterministic cache path of a package's cover inside `dir`.
pub fn cache_path(dir: &Path, package: &Package) -> PathBuf {
    dir.join(format!("{}.{COVER_EXTENSION}", cache_key(package)))
}

#[derive(Debug, Clone)]
pub struct CoverCache {
    dir: PathBuf,
}
impl CoverCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, package: &Package) -> PathBuf {
        cache_path(&self.dir, package)
    }

    /// Whether a cover file is present at `path`. Errors while checking
    /// count as a miss; the following write will surface them.
    pub async fn contains(&self, path: &Path) -> bool {
        match tokio::fs::try_exists(path).await {
            Ok(exists) => exists,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "Cannot check cache file; treating as miss");
                false
            },
        }
    }

    /// Writes downloaded cover bytes to `path`.
    pub async fn store(&self, path: &Path, bytes: Vec<u8>) -> Result<()> {
        let dest = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            persist_with(&dest, |file| file.write_all(&bytes).or_raise(|| ErrorKind::CacheWrite(dest.clone())))
        })
            .await
            .or_raise(|| ErrorKind::Task)?
    }
}

/// Streams an archive entry into `dest`.
pub(crate) fn persist_entry(archive: &mut Archive, entry: &str, dest: &Path) -> Result<u64> {
    let mut copied = 0;
    persist_with(dest, |file| {
        copied = archive.copy_to(entry, file).or_raise(|| ErrorKind::CacheWrite(dest.to_path_buf()))?;
        Ok(())
    })?;
    tracing::debug!(%entry, path = %dest.display(), bytes = copied, "Extracted cover into cache");
    Ok(copied)
}

/// Writes through a temporary file next to `dest` and renames it into
/// place, so readers never observe a half-written cover.
fn persist_with<F>(dest: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let parent = dest.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let failed = || ErrorKind::CacheWrite(dest.to_path_buf());
    fs::create_dir_all(parent).or_raise(failed)?;
    let mut temp = NamedTempFile::new_in(parent).or_raise(failed)?;
    fill(temp.as_file_mut())?;
    temp.as_file().sync_all().or_raise(failed)?;
    temp.persist(dest).or_raise(failed)?;
    Ok(())
}
