/// Entries with these (lowercase) extensions are cover candidates.
pub(crate) const JPEG_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];
/// Anything this narrow or narrower is an icon or an inline illustration.
pub(crate) const MIN_WIDTH: u32 = 400;
/// Anything this short or shorter is an icon or an inline illustration.
pub(crate) const MIN_HEIGHT: u32 = 600;
/// Widest accepted aspect ratio, as `width:height`.
pub(crate) const RATIO: (u64, u64) = (2, 3);
/// Distance in pixels between colour samples on both axes.
pub(crate) const SAMPLE_STEP: usize = 50;
/// Fewer sampled colours than this looks like a blank or placeholder page.
pub(crate) const MIN_DISTINCT_COLOURS: usize = 5;
/// Entries whose name contains this get their score doubled.
pub(crate) const COVER_HINT: &str = "cover";
