/// A `<reference>` from the descriptor's `<guide>`.
///
/// Only references with `kind == "cover"` matter for cover resolution, the
/// rest are kept so the package mirrors its descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideReference {
    /// The `type` attribute (`cover`, `toc`, `text`, ...)
    pub kind: String,
    /// Descriptor-relative path, as written in the descriptor
    pub href: String,
    pub title: String,
}
impl GuideReference {
    pub fn is_cover(&self) -> bool {
        self.kind == crate::consts::COVER && !self.href.is_empty()
    }
}
