//! Cover reference resolution.
//!
//! Descriptors point at their cover in several competing ways. The rules
//! are tried in a fixed order and the first one that produces a manifest
//! item wins:
//!
//! 1. `<meta name="cover" content="{id}">` naming a manifest item id,
//! 2. `<reference type="cover" href="{href}">` matching a manifest href,
//! 3. a manifest item whose `properties` contain `cover-image`,
//! 4. a manifest item whose id is literally `cover`,
//! 5. the guide href from (2) on its own, even without a manifest item.
//!
//! When the chosen target is a markup document (a title page) the first
//! `<img src>` (or SVG `<image href>`) inside it replaces the reference.

use crate::archive::Archive;
use crate::consts::{COVER, MARKUP_EXTENSIONS};
use crate::descriptor::attribute;
use crate::error::{ErrorKind, Result};
use crate::models::{GuideReference, ManifestItem, MetaMarker, Package};
use crate::path;
use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::instrument;

/// Which rule produced a [`CoverReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverRule {
    Marker,
    Guide,
    Properties,
    CoverId,
    GuideFallback,
}

/// A resolved, archive-relative cover location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverReference {
    pub path: String,
    pub rule: CoverRule,
}

/// Applies the resolution rules to already-parsed descriptor parts. Hrefs
/// are joined onto `base_dir`, the directory holding the descriptor.
pub fn cover_reference(
    markers: &[MetaMarker],
    manifest: &[ManifestItem],
    guide: &[GuideReference],
    base_dir: &str,
) -> Option<CoverReference> {
    let marker_id = markers.iter().find(|m| m.name == COVER && !m.content.is_empty()).map(|m| m.content.as_str());
    let guide_href = guide.iter().find(|r| r.is_cover()).map(|r| path::clean_href(&r.href));

    let item = marker_id
        .and_then(|id| manifest.iter().find(|item| item.id == id))
        .map(|item| (item, CoverRule::Marker))
        .or_else(|| {
            let href = guide_href.as_deref()?;
            manifest.iter().find(|item| path::clean_href(&item.href) == href).map(|item| (item, CoverRule::Guide))
        })
        .or_else(|| manifest.iter().find(|item| item.is_cover_image()).map(|item| (item, CoverRule::Properties)))
        .or_else(|| manifest.iter().find(|item| item.is_named_cover()).map(|item| (item, CoverRule::CoverId)));

    match item {
        Some((item, rule)) => Some(CoverReference {
            path: path::join(base_dir, &path::clean_href(&item.href)),
            rule,
        }),
        None => guide_href.map(|href| CoverReference {
            path: path::join(base_dir, &href),
            rule: CoverRule::GuideFallback,
        }),
    }
}

/// `true` when the entry is a document that wraps the actual image.
pub fn is_markup(entry: &str) -> bool {
    path::extension(entry).is_some_and(|ext| MARKUP_EXTENSIONS.contains(&ext.as_str()))
}

/// Finds the first image referenced by a markup entry, resolved against
/// the entry's own directory.
///
/// Returns `Ok(None)` when the document contains no usable image element.
#[instrument(level = "debug", skip(archive))]
pub fn image_in_markup(archive: &mut Archive, entry: &str) -> Result<Option<String>> {
    let name = archive.find(entry).map(str::to_string).ok_or_raise(|| ErrorKind::EntryNotFound(entry.to_string()))?;
    let bytes = archive.read(&name)?;
    let mut reader = Reader::from_reader(bytes.as_slice());
    // Title pages are frequently HTML pretending to be XHTML.
    reader.config_mut().check_end_names = false;
    loop {
        match reader.read_event().or_raise(|| ErrorKind::MalformedMarkup(name.clone()))? {
            Event::Start(element) | Event::Empty(element) => {
                let local = element.local_name();
                let source = if local.as_ref().eq_ignore_ascii_case(b"img") {
                    attribute(&element, b"src")
                } else if local.as_ref().eq_ignore_ascii_case(b"image") {
                    attribute(&element, b"href")
                } else {
                    continue;
                };
                if let Some(source) = source.map(|s| path::clean_href(&s)).filter(|s| !s.is_empty()) {
                    return Ok(Some(path::join(path::parent(&name), &source)));
                }
            },
            Event::Eof => return Ok(None),
            _ => {},
        }
    }
}

/// Resolves the package's cover reference and, if it lands on markup,
/// follows it to the embedded image. Returns a new package snapshot.
///
/// A markup target that can't be followed is kept as-is; consumers have to
/// cope with cover paths that turn out to be unreadable.
#[instrument(level = "debug", skip_all, fields(book = %package.book_file))]
pub fn resolve_cover(archive: &mut Archive, package: Package) -> Package {
    let Some(reference) = cover_reference(&package.markers, &package.manifest, &package.guide, package.base_dir())
    else {
        tracing::debug!("No cover reference in descriptor");
        return package;
    };
    tracing::debug!(path = %reference.path, rule = ?reference.rule, "Cover reference resolved");
    if !is_markup(&reference.path) {
        return package.with_cover_path(reference.path);
    }
    match image_in_markup(archive, &reference.path) {
        Ok(Some(image)) => package.with_cover_path(image),
        Ok(None) => {
            tracing::warn!(markup = %reference.path, "Cover markup contains no image; keeping markup path");
            package.with_cover_path(reference.path)
        },
        Err(err) => {
            tracing::warn!(markup = %reference.path, error = ?err, "Cover markup could not be followed; keeping markup path");
            package.with_cover_path(reference.path)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::write_archive;

    fn item(id: &str, href: &str, properties: &str) -> ManifestItem {
        ManifestItem { id: id.to_string(), href: href.to_string(), properties: properties.to_string() }
    }

    fn marker(content: &str) -> MetaMarker {
        MetaMarker { name: "cover".to_string(), content: content.to_string() }
    }

    fn guide(href: &str) -> GuideReference {
        GuideReference { kind: "cover".to_string(), href: href.to_string(), title: "Cover".to_string() }
    }

    #[test]
    fn test_marker_wins() {
        let manifest = [item("cover", "a.jpg", ""), item("img", "b.jpg", "cover-image"), item("c1", "c.jpg", "")];
        let reference = cover_reference(&[marker("c1")], &manifest, &[guide("b.jpg")], "OEBPS").unwrap();
        assert_eq!(reference, CoverReference { path: "OEBPS/c.jpg".to_string(), rule: CoverRule::Marker });
    }

    #[test]
    fn test_guide_before_properties() {
        let manifest = [item("img", "b.jpg", "cover-image"), item("page", "Text/cover.xhtml", "")];
        let reference = cover_reference(&[], &manifest, &[guide("Text/cover.xhtml#top")], "").unwrap();
        assert_eq!(reference.path, "Text/cover.xhtml");
        assert_eq!(reference.rule, CoverRule::Guide);
    }

    #[test]
    fn test_marker_pointing_nowhere_falls_through() {
        let manifest = [item("img", "b.jpg", "cover-image")];
        let reference = cover_reference(&[marker("missing")], &manifest, &[], "").unwrap();
        assert_eq!(reference.rule, CoverRule::Properties);
    }

    #[test]
    fn test_properties_before_cover_id() {
        // Document order puts the `cover` id first; the properties rule still wins.
        let manifest = [item("cover", "named.jpg", ""), item("x", "flagged.jpg", "nav cover-image")];
        let reference = cover_reference(&[], &manifest, &[], "OPS").unwrap();
        assert_eq!(reference, CoverReference { path: "OPS/flagged.jpg".to_string(), rule: CoverRule::Properties });
    }

    #[test]
    fn test_cover_id() {
        let manifest = [item("ch1", "ch1.xhtml", ""), item("cover", "images/c.jpeg", "")];
        let reference = cover_reference(&[], &manifest, &[], "").unwrap();
        assert_eq!(reference.rule, CoverRule::CoverId);
        assert_eq!(reference.path, "images/c.jpeg");
    }

    #[test]
    fn test_guide_fallback_without_manifest_match() {
        let reference = cover_reference(&[], &[item("ch1", "ch1.xhtml", "")], &[guide("../cover.html")], "OEBPS/x").unwrap();
        assert_eq!(reference, CoverReference { path: "OEBPS/cover.html".to_string(), rule: CoverRule::GuideFallback });
    }

    #[test]
    fn test_nothing_matches() {
        assert_eq!(cover_reference(&[], &[item("ch1", "ch1.xhtml", "")], &[], ""), None);
        let toc = GuideReference { kind: "toc".to_string(), href: "toc.xhtml".to_string(), title: String::new() };
        assert_eq!(cover_reference(&[], &[], &[toc], ""), None);
    }

    #[test]
    fn test_is_markup() {
        assert!(is_markup("Text/cover.xhtml"));
        assert!(is_markup("cover.HTML"));
        assert!(is_markup("cover.xml"));
        assert!(!is_markup("cover.jpg"));
        assert!(!is_markup("cover"));
    }

    #[test]
    fn test_image_in_markup() {
        let dir = tempfile::tempdir().unwrap();
        let page = br#"<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Cover</title></head>
            <body><div><img alt="" src="../Images/cover.jpg"/></div><img src="second.jpg"/></body></html>"#;
        let path = write_archive(dir.path(), "a.epub", &[("OEBPS/Text/cover.xhtml", page)]);
        let mut archive = Archive::open(path).unwrap();
        let image = image_in_markup(&mut archive, "OEBPS/Text/cover.xhtml").unwrap();
        assert_eq!(image.as_deref(), Some("OEBPS/Images/cover.jpg"));
    }

    #[test]
    fn test_svg_image_in_markup() {
        let dir = tempfile::tempdir().unwrap();
        let page = br#"<html><body><svg xmlns:xlink="http://www.w3.org/1999/xlink">
            <image width="600" height="900" xlink:href="cover%201.jpeg"/></svg></body></html>"#;
        let path = write_archive(dir.path(), "a.epub", &[("titlepage.xhtml", page)]);
        let mut archive = Archive::open(path).unwrap();
        let image = image_in_markup(&mut archive, "titlepage.xhtml").unwrap();
        assert_eq!(image.as_deref(), Some("cover 1.jpeg"));
    }

    #[test]
    fn test_markup_without_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a.epub", &[("cover.html", b"<html><body><p>No cover<br></p></body></html>")]);
        let mut archive = Archive::open(path).unwrap();
        assert_eq!(image_in_markup(&mut archive, "cover.html").unwrap(), None);
        let err = image_in_markup(&mut archive, "missing.html").unwrap_err();
        assert!(matches!(&*err, ErrorKind::EntryNotFound(_)));
    }

    #[test]
    fn test_resolve_cover_keeps_markup_when_unfollowable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a.epub", &[("OEBPS/content.opf", b"<package/>")]);
        let mut archive = Archive::open(&path).unwrap();
        let package = Package {
            descriptor: Some("OEBPS/content.opf".to_string()),
            guide: vec![guide("cover.xhtml")],
            ..Package::empty(&path)
        };
        let resolved = resolve_cover(&mut archive, package);
        assert_eq!(resolved.cover_path.as_deref(), Some("OEBPS/cover.xhtml"));
    }
}
