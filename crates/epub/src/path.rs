//! Archive-relative path handling.
//!
//! Entry names inside a zip container always use `/` as the separator,
//! regardless of the host platform, so these helpers operate on `str`
//! instead of [`std::path::Path`].

/// Joins `href` onto `base_dir` and normalizes the result.
///
/// `.` segments and empty segments are dropped, `..` pops the previous
/// segment. A `..` that would climb above the archive root is discarded, an
/// entry can never live outside the container anyway.
///
/// # Examples
///
/// ```
/// use folio_epub::path::join;
/// assert_eq!(join("OEBPS", "images/cover.jpg"), "OEBPS/images/cover.jpg");
/// assert_eq!(join("OEBPS/text", "../images/cover.jpg"), "OEBPS/images/cover.jpg");
/// assert_eq!(join("", "cover.jpg"), "cover.jpg");
/// ```
pub fn join(base_dir: &str, href: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let joined = base_dir.split('/').chain(href.split('/'));
    for segment in joined {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Returns the directory part of an entry name (empty for root entries).
pub fn parent(entry: &str) -> &str {
    entry.rsplit_once('/').map(|(dir, _)| dir).unwrap_or_default()
}

/// Lower-cased extension of an entry name, without the dot.
pub fn extension(entry: &str) -> Option<String> {
    let file = entry.rsplit('/').next().unwrap_or(entry);
    file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).filter(|ext| !ext.is_empty())
}

/// Turns a descriptor `href` into a plain relative path: the fragment is
/// dropped and percent-escapes are decoded. Undecodable escapes are left as
/// they were.
///
/// # Examples
///
/// ```
/// use folio_epub::path::clean_href;
/// assert_eq!(clean_href("cover%20page.xhtml#start"), "cover page.xhtml");
/// ```
pub fn clean_href(href: &str) -> String {
    let href = href.split_once('#').map(|(path, _)| path).unwrap_or(href).trim();
    match urlencoding::decode(href) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => href.to_string(),
    }
}
