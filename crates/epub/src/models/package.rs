use super::{BookMetadata, GuideReference, ManifestItem, MetaMarker};
use std::path::{Path, PathBuf};

/// Everything known about one archive after extraction.
///
/// A `Package` is a snapshot: resolution steps produce new values (see
/// [`with_cover_path`](Self::with_cover_path)) instead of mutating a shared
/// one, so it can be handed to the enrichment queue behind an `Arc` without
/// further coordination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub metadata: BookMetadata,
    pub markers: Vec<MetaMarker>,
    pub manifest: Vec<ManifestItem>,
    pub guide: Vec<GuideReference>,
    /// Entry name of the package descriptor, if the archive has one
    pub descriptor: Option<String>,
    /// Archive-relative path of the cover image, once resolved
    pub cover_path: Option<String>,
    /// File name of the archive; the natural key everywhere downstream
    pub book_file: String,
    /// Where the archive was read from
    pub archive: PathBuf,
}
impl Package {
    /// A package with no metadata, for archives without (readable) descriptor.
    pub fn empty(archive: impl Into<PathBuf>) -> Self {
        let archive = archive.into();
        Self {
            metadata: BookMetadata::default(),
            markers: Vec::new(),
            manifest: Vec::new(),
            guide: Vec::new(),
            descriptor: None,
            cover_path: None,
            book_file: file_name(&archive),
            archive,
        }
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn author(&self) -> &str {
        &self.metadata.author
    }

    /// Directory containing the descriptor; descriptor hrefs are relative to it.
    pub fn base_dir(&self) -> &str {
        self.descriptor.as_deref().map(crate::path::parent).unwrap_or_default()
    }

    pub fn with_cover_path(self, cover_path: impl Into<String>) -> Self {
        let cover_path = cover_path.into();
        Self {
            cover_path: (!cover_path.is_empty()).then_some(cover_path),
            ..self
        }
    }
}

fn file_name(archive: &Path) -> String {
    archive.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_package_keys_on_file_name() {
        let package = Package::empty("books/The Hobbit.epub");
        assert_eq!(package.book_file, "The Hobbit.epub");
        assert_eq!(package.archive, PathBuf::from("books/The Hobbit.epub"));
        assert!(package.metadata.is_empty());
        assert_eq!(package.base_dir(), "");
    }

    #[test]
    fn test_with_cover_path_returns_new_snapshot() {
        let original = Package::empty("a.epub");
        let resolved = original.clone().with_cover_path("OEBPS/cover.jpg");
        assert_eq!(original.cover_path, None);
        assert_eq!(resolved.cover_path.as_deref(), Some("OEBPS/cover.jpg"));
        assert_eq!(resolved.clone().with_cover_path("").cover_path, None);
    }

    #[test]
    fn test_base_dir_follows_descriptor() {
        let package = Package {
            descriptor: Some("OEBPS/content.opf".to_string()),
            ..Package::empty("a.epub")
        };
        assert_eq!(package.base_dir(), "OEBPS");
    }
}
