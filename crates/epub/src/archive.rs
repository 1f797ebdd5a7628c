//! Random access to the entries of an e-book container.

use crate::consts::DESCRIPTOR_EXTENSION;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

/// An opened zip-compatible container.
///
/// Entry names are listed once on open and kept in central directory
/// order, which is the order every "first match wins" rule uses.
pub struct Archive {
    path: PathBuf,
    entries: Vec<String>,
    zip: ZipArchive<BufReader<File>>,
}
impl Archive {
    /// Opens the container at `path` for random access.
    ///
    /// # Errors
    ///
    /// [`ArchiveOpen`](ErrorKind::ArchiveOpen) if the file cannot be read or
    /// its central directory is not a valid zip directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).or_raise(|| ErrorKind::ArchiveOpen(path.clone()))?;
        let mut zip = ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::ArchiveOpen(path.clone()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let entry = zip.by_index_raw(index).or_raise(|| ErrorKind::ArchiveOpen(path.clone()))?;
            entries.push(entry.name().to_string());
        }
        tracing::trace!(archive = %path.display(), entries = entries.len(), "Opened archive");
        Ok(Self { path, entries, zip })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entry names, in central directory order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Looks an entry up by name, preferring an exact match and falling back
    /// to an ASCII case-insensitive one.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| *entry == name)
            .or_else(|| self.entries.iter().find(|entry| entry.eq_ignore_ascii_case(name)))
            .map(String::as_str)
    }

    /// The first entry carrying the package descriptor extension.
    pub fn descriptor(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.to_ascii_lowercase().ends_with(DESCRIPTOR_EXTENSION))
            .map(String::as_str)
    }

    /// Reads a whole entry into memory. `name` must match exactly.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.copy_to(name, &mut buffer)?;
        Ok(buffer)
    }

    /// Streams an entry's decompressed bytes into `writer`, returning the
    /// number of bytes copied. `name` must match exactly.
    pub fn copy_to(&mut self, name: &str, writer: &mut impl Write) -> Result<u64> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => exn::bail!(ErrorKind::EntryNotFound(name.to_string())),
            Err(err) => return Err(err).or_raise(|| ErrorKind::EntryRead(name.to_string())),
        };
        io::copy(&mut entry, writer).or_raise(|| ErrorKind::EntryRead(name.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Writes a zip archive with the given entries into `dir/name`.
    pub(crate) fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(name);
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        for (entry, data) in entries {
            writer.start_file(*entry, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_open_lists_entries_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a.epub", &[("mimetype", b"application/epub+zip"), ("OEBPS/content.opf", b"<package/>")]);
        let archive = Archive::open(&path).unwrap();
        assert_eq!(archive.entries(), &["mimetype".to_string(), "OEBPS/content.opf".to_string()]);
        assert_eq!(archive.descriptor(), Some("OEBPS/content.opf"));
        assert_eq!(archive.path(), path);
    }

    #[test]
    fn test_open_rejects_non_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"definitely not a zip file").unwrap();
        let err = Archive::open(&path).err().unwrap();
        assert!(matches!(&*err, ErrorKind::ArchiveOpen(p) if *p == path));
        let err = Archive::open(dir.path().join("missing.epub")).err().unwrap();
        assert!(matches!(&*err, ErrorKind::ArchiveOpen(_)));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a.epub", &[("OEBPS/Images/Cover.JPG", b"jpeg")]);
        let archive = Archive::open(&path).unwrap();
        assert_eq!(archive.find("OEBPS/Images/Cover.JPG"), Some("OEBPS/Images/Cover.JPG"));
        assert_eq!(archive.find("oebps/images/cover.jpg"), Some("OEBPS/Images/Cover.JPG"));
        assert_eq!(archive.find("OEBPS/cover.jpg"), None);
    }

    #[test]
    fn test_read_and_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a.epub", &[("cover.jpg", b"0123456789")]);
        let mut archive = Archive::open(&path).unwrap();
        assert_eq!(archive.read("cover.jpg").unwrap(), b"0123456789");
        let mut out = Vec::new();
        assert_eq!(archive.copy_to("cover.jpg", &mut out).unwrap(), 10);
        assert_eq!(out, b"0123456789");
        let err = archive.read("nope.jpg").unwrap_err();
        assert_eq!(*err, ErrorKind::EntryNotFound("nope.jpg".to_string()));
    }
}
