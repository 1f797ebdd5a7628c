//! Metadata and cover reference extraction for EPUB-style containers.
//!
//! The top-level entrypoint is [`extract`]: it opens an archive, parses its
//! package descriptor into a [`Package`](models::Package) and resolves which
//! entry is the cover image. Only an unreadable container is an error;
//! everything else degrades to a sparser package and a [`Diagnostic`].

pub mod archive;
mod consts;
mod descriptor;
pub mod error;
pub mod models;
pub mod path;
pub mod resolve;

pub use crate::archive::Archive;
use crate::error::Result;
use crate::models::Package;
use derive_more::Display;
use std::path::Path;
use tracing::instrument;

/// Why an extraction produced less than a full package.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The archive holds no `.opf` entry.
    #[display("no package descriptor in archive")]
    MissingDescriptor,
    /// The descriptor entry exists but couldn't be read out of the archive.
    #[display("package descriptor {entry} is unreadable")]
    UnreadableDescriptor { entry: String },
    /// Parsing stopped early; fields read before `reason` are kept.
    #[display("package descriptor {entry} is malformed: {reason}")]
    MalformedDescriptor { entry: String, reason: String },
}

/// A package plus the reason it may be incomplete.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub package: Package,
    pub diagnostic: Option<Diagnostic>,
}
impl Extraction {
    fn complete(package: Package) -> Self {
        Self { package, diagnostic: None }
    }

    fn degraded(package: Package, diagnostic: Diagnostic) -> Self {
        tracing::warn!(book = %package.book_file, %diagnostic, "Extraction degraded");
        Self { package, diagnostic: Some(diagnostic) }
    }

    pub fn is_complete(&self) -> bool {
        self.diagnostic.is_none()
    }

    pub fn into_package(self) -> Package {
        self.package
    }
}

/// Easy, top-level entrypoint: extract metadata and the cover reference
/// from the archive at `path`.
///
/// # Errors
///
/// Returns [`ArchiveOpen`](error::ErrorKind::ArchiveOpen) if the container
/// can't be opened. A missing or malformed descriptor is *not* an error, see
/// [`Extraction::diagnostic`].
#[instrument(skip_all, fields(archive = %path.as_ref().display()))]
pub fn extract(path: impl AsRef<Path>) -> Result<Extraction> {
    let mut archive = Archive::open(path)?;
    Ok(extract_from(&mut archive))
}

/// Same as [`extract`], for an archive that's already open.
pub fn extract_from(archive: &mut Archive) -> Extraction {
    let empty = Package::empty(archive.path());
    let Some(entry) = archive.descriptor().map(str::to_string) else {
        return Extraction::degraded(empty, Diagnostic::MissingDescriptor);
    };
    let bytes = match archive.read(&entry) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = ?err, "Descriptor read failed");
            return Extraction::degraded(empty, Diagnostic::UnreadableDescriptor { entry });
        },
    };
    let parsed = descriptor::parse(&bytes);
    let descriptor = parsed.descriptor;
    let package = Package {
        metadata: descriptor.metadata,
        markers: descriptor.markers,
        manifest: descriptor.manifest,
        guide: descriptor.guide,
        descriptor: Some(entry.clone()),
        ..empty
    };
    let package = resolve::resolve_cover(archive, package);
    match parsed.failure {
        None => Extraction::complete(package),
        Some(reason) => Extraction::degraded(package, Diagnostic::MalformedDescriptor { entry, reason }),
    }
}
