/// A `<meta name="..." content="..."/>` marker inside `<metadata>`.
///
/// EPUB 2 books point at their cover image with `name="cover"`, the content
/// being a manifest item id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaMarker {
    pub name: String,
    pub content: String,
}
