//! Offline cover quality scoring.
//!
//! Picks the best-looking JPEG embedded in an archive without trusting the
//! package descriptor at all. This is the safety net for archives whose
//! manifest points at the wrong image, or at nothing.
//!
//! Scoring happens in two passes. The first one only reads image headers and
//! throws away anything too small, too wide or square. The second decodes
//! the survivors and ranks them:
//!
//! - base score is the pixel area,
//! - doubled if the entry name contains `cover`,
//! - doubled again if the aspect ratio is exactly 2:3,
//! - plus the number of distinct colours sampled every 50 pixels, if there
//!   are at least 5 of them.
//!
//! The first candidate with the strictly highest score wins.

mod consts;
pub mod error;

use crate::consts::*;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_epub::Archive;
use image::{ImageFormat, ImageReader, RgbImage};
use std::collections::HashSet;
use std::io::Cursor;
use tracing::instrument;

/// An image that survived the header pass, with its final score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCandidate {
    /// Archive entry name, exactly as stored in the archive.
    pub entry: String,
    pub width: u32,
    pub height: u32,
    pub score: u64,
}
impl CoverCandidate {
    fn new(entry: String, image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let score = score(&entry, image);
        Self { entry, width, height, score }
    }
}

/// Whether an image of this size could be a front cover at all.
pub fn is_plausible(width: u32, height: u32) -> bool {
    let (w, h) = (u64::from(width), u64::from(height));
    width > MIN_WIDTH
        && height > MIN_HEIGHT
        // Integer form of `width / height <= 2 / 3`.
        && w * RATIO.1 <= h * RATIO.0
        && width != height
}

/// Scores a decoded image. See the [crate docs](crate) for the formula.
pub fn score(entry: &str, image: &RgbImage) -> u64 {
    let (width, height) = image.dimensions();
    let (w, h) = (u64::from(width), u64::from(height));
    let mut score = w * h;
    if entry.contains(COVER_HINT) {
        score *= 2;
    }
    if w * RATIO.1 == h * RATIO.0 {
        score *= 2;
    }
    let colours = distinct_colours(image);
    if colours >= MIN_DISTINCT_COLOURS {
        // Infallible: a usize always fits in a u64 on supported platforms.
        score += u64::try_from(colours).unwrap_or(0);
    }
    score
}

/// Number of distinct colours on a coarse sampling grid.
fn distinct_colours(image: &RgbImage) -> usize {
    let (width, height) = image.dimensions();
    let mut seen = HashSet::new();
    for x in (0..width).step_by(SAMPLE_STEP) {
        for y in (0..height).step_by(SAMPLE_STEP) {
            seen.insert(image.get_pixel(x, y).0);
        }
    }
    seen.len()
}

fn is_jpeg(entry: &str) -> bool {
    folio_epub::path::extension(entry).is_some_and(|ext| JPEG_EXTENSIONS.contains(&ext.as_str()))
}

/// Finds the best cover candidate among every JPEG entry of `archive`.
///
/// Returns `Ok(None)` when no image passes the size and shape filters.
///
/// # Errors
///
/// Any entry that can't be read or decoded aborts the whole pass, even if
/// other candidates were fine.
#[instrument(skip_all, fields(archive = %archive.path().display()))]
pub fn best_cover(archive: &mut Archive) -> Result<Option<CoverCandidate>> {
    let images: Vec<String> = archive.entries().iter().filter(|entry| is_jpeg(entry)).cloned().collect();
    let mut plausible = Vec::new();
    for entry in images {
        let bytes = archive.read(&entry).or_raise(|| ErrorKind::Archive(entry.clone()))?;
        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), ImageFormat::Jpeg)
            .into_dimensions()
            .or_raise(|| ErrorKind::Decode(entry.clone()))?;
        if is_plausible(width, height) {
            plausible.push(entry);
        } else {
            tracing::trace!(%entry, width, height, "Rejected cover candidate");
        }
    }

    let mut best: Option<CoverCandidate> = None;
    for entry in plausible {
        let bytes = archive.read(&entry).or_raise(|| ErrorKind::Archive(entry.clone()))?;
        let image = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .or_raise(|| ErrorKind::Decode(entry.clone()))?
            .into_rgb8();
        let candidate = CoverCandidate::new(entry, &image);
        tracing::trace!(entry = %candidate.entry, score = candidate.score, "Scored cover candidate");
        if best.as_ref().is_none_or(|best| candidate.score > best.score) {
            best = Some(candidate);
        }
    }
    match &best {
        Some(candidate) => tracing::debug!(entry = %candidate.entry, score = candidate.score, "Selected cover"),
        None => tracing::debug!("No embedded image looks like a cover"),
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// A JPEG with a colour gradient, so the sampling grid sees many colours.
    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x / 2 % 256) as u8, (y / 3 % 256) as u8, 96]));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg).unwrap();
        bytes
    }

    fn archive(dir: &Path, entries: &[(&str, Vec<u8>)]) -> PathBuf {
        let path = dir.join("book.epub");
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[rstest]
    #[case::portrait(500, 750, true)]
    #[case::narrow_portrait(401, 700, true)]
    #[case::too_narrow(400, 700, false)]
    #[case::too_short(500, 600, false)]
    #[case::too_wide(600, 800, false)]
    #[case::landscape(1200, 800, false)]
    #[case::square(700, 700, false)]
    fn test_is_plausible(#[case] width: u32, #[case] height: u32, #[case] expected: bool) {
        assert_eq!(is_plausible(width, height), expected);
    }

    #[test]
    fn test_score_bonuses() {
        let flat = RgbImage::from_pixel(500, 750, Rgb([255, 255, 255]));
        assert_eq!(score("images/front.jpg", &flat), 500 * 750 * 2);
        assert_eq!(score("images/cover.jpg", &flat), 500 * 750 * 4);
        let tall = RgbImage::from_pixel(500, 800, Rgb([255, 255, 255]));
        assert_eq!(score("images/front.jpg", &tall), 500 * 800);
        let busy = RgbImage::from_fn(500, 800, |x, y| Rgb([x as u8, y as u8, 0]));
        let colours = distinct_colours(&busy) as u64;
        assert!(colours >= 5);
        assert_eq!(score("images/front.jpg", &busy), 500 * 800 + colours);
    }

    #[test]
    fn test_selects_portrait_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive(
            dir.path(),
            &[
                ("images/logo.jpg", jpeg(120, 120)),
                ("images/cover.jpg", jpeg(500, 750)),
                ("images/map.jpg", jpeg(1200, 800)),
            ],
        );
        let mut archive = Archive::open(&path).unwrap();
        let candidate = best_cover(&mut archive).unwrap().unwrap();
        assert_eq!(candidate.entry, "images/cover.jpg");
        assert_eq!((candidate.width, candidate.height), (500, 750));
        assert!(candidate.score > 500 * 750 * 4);
    }

    #[test]
    fn test_cover_name_breaks_equal_area() {
        let dir = tempfile::tempdir().unwrap();
        let image = jpeg(500, 800);
        let path = archive(dir.path(), &[("images/plate.jpg", image.clone()), ("images/cover.jpg", image)]);
        let mut archive = Archive::open(&path).unwrap();
        assert_eq!(best_cover(&mut archive).unwrap().unwrap().entry, "images/cover.jpg");
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let dir = tempfile::tempdir().unwrap();
        let image = jpeg(500, 800);
        let path = archive(dir.path(), &[("b.jpg", image.clone()), ("a.jpg", image)]);
        let mut archive = Archive::open(&path).unwrap();
        assert_eq!(best_cover(&mut archive).unwrap().unwrap().entry, "b.jpg");
    }

    #[test]
    fn test_no_plausible_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive(
            dir.path(),
            &[("square.jpg", jpeg(800, 800)), ("small.jpg", jpeg(300, 450)), ("notes.txt", b"jpg".to_vec())],
        );
        let mut archive = Archive::open(&path).unwrap();
        assert_eq!(best_cover(&mut archive).unwrap(), None);
    }

    #[test]
    fn test_decode_error_aborts_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive(dir.path(), &[("images/cover.jpg", jpeg(500, 750)), ("images/broken.JPEG", b"nope".to_vec())]);
        let mut archive = Archive::open(&path).unwrap();
        let err = best_cover(&mut archive).unwrap_err();
        assert_eq!(*err, ErrorKind::Decode("images/broken.JPEG".to_string()));
    }
}
