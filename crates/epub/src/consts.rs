/// Extension of the package descriptor inside the container.
pub(crate) const DESCRIPTOR_EXTENSION: &str = ".opf";
/// Extensions of cover targets that are documents wrapping the real image.
pub(crate) const MARKUP_EXTENSIONS: [&str; 3] = ["xhtml", "html", "xml"];
/// `<meta name="cover">` and `<reference type="cover">`.
pub(crate) const COVER: &str = "cover";
/// Manifest `properties` token marking the cover image (EPUB 3).
pub(crate) const COVER_IMAGE_PROPERTY: &str = "cover-image";
