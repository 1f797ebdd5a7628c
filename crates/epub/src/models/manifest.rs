use crate::consts::{COVER, COVER_IMAGE_PROPERTY};

/// An `<item>` from the descriptor's `<manifest>`.
///
/// Manifest order is significant: the first matching item wins every cover
/// heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Descriptor-relative path, as written in the descriptor
    pub href: String,
    /// Free-text `properties` attribute (EPUB 3), empty when absent
    pub properties: String,
}
impl ManifestItem {
    /// `properties` mentions `cover-image` anywhere.
    pub fn is_cover_image(&self) -> bool {
        self.properties.contains(COVER_IMAGE_PROPERTY)
    }

    /// The item is literally named `cover`.
    pub fn is_named_cover(&self) -> bool {
        self.id == COVER
    }
}
