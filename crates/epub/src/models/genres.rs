//! Genre (`dc:subject`) normalization.
//!
//! Descriptors in the wild carry subjects like `"Fantasy,"` or `" Fantasy"`,
//! and the catalogue stores genres as a single comma-joined column, so both
//! directions go through [`normalize_genres`].

use std::collections::HashSet;

const SEPARATOR: char = ',';

/// Trims whitespace and stray commas, drops empty entries, and removes
/// duplicates while keeping the first occurrence's position.
///
/// # Examples
///
/// ```
/// use folio_epub::models::normalize_genres;
/// assert_eq!(normalize_genres(["Fantasy", " Fantasy,", "", "Fantasy"]), vec!["Fantasy"]);
/// ```
pub fn normalize_genres<I, S>(genres: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for genre in genres {
        let genre = genre.as_ref().trim().trim_matches(SEPARATOR).trim();
        if !genre.is_empty() && seen.insert(genre.to_string()) {
            out.push(genre.to_string());
        }
    }
    out
}

/// Comma-joins genres for single-column storage.
pub fn join_genres(genres: &[String]) -> String {
    genres.join(",")
}

/// Inverse of [`join_genres`]; the result is normalized again.
pub fn split_genres(joined: &str) -> Vec<String> {
    normalize_genres(joined.split(SEPARATOR))
}
