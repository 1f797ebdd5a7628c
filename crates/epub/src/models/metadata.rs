use super::normalize_genres;

/// Bibliographic fields read from the descriptor's Dublin Core block.
///
/// Every field defaults to empty, which is exactly what an archive without a
/// descriptor produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    /// All `dc:creator` values joined by `", "` in document order
    pub author: String,
    /// First non-empty `dc:title`
    pub title: String,
    pub description: String,
    /// `dc:subject` values, normalized (see [`normalize_genres`])
    pub genres: Vec<String>,
    pub language: String,
}
impl BookMetadata {
    /// `true` when nothing at all could be read.
    pub fn is_empty(&self) -> bool {
        self.author.is_empty()
            && self.title.is_empty()
            && self.description.is_empty()
            && self.genres.is_empty()
            && self.language.is_empty()
    }

    /// Replaces the genres with their normalized form.
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.genres = normalize_genres(genres);
        self
    }
}
