use crate::error::Result;
use async_trait::async_trait;
use derive_more::Display;

/// Numeric cover identifier assigned by the bibliographic service.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoverId(pub u64);
impl CoverId {
    /// Only strictly positive identifiers point at an actual image.
    pub fn new(id: i64) -> Option<Self> {
        u64::try_from(id).ok().filter(|id| *id > 0).map(Self)
    }
}

/// A remote service that can find and serve cover images.
///
/// Implementations are stateless from the caller's point of view; pacing
/// between calls is the caller's job.
#[async_trait]
pub trait CoverSource: Send + Sync {
    /// Searches for a book and returns the cover identifier of the best match.
    ///
    /// `Ok(None)` means the service has nothing to offer, which is a normal
    /// outcome and not an error.
    async fn find_cover(&self, title: &str, author: &str) -> Result<Option<CoverId>>;

    /// Downloads the image for a cover identifier.
    async fn fetch_cover(&self, id: CoverId) -> Result<Vec<u8>>;
}
