//! In-memory cover source for testing.

use crate::error::{ErrorKind, Result};
use crate::source::{CoverId, CoverSource};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory [`CoverSource`] keyed by title.
///
/// Every call is recorded so tests can assert on how often (and in which
/// order) the service would have been hit. Titles registered with
/// [`failing`](Self::failing) simulate a network failure.
#[derive(Default)]
pub struct MockCoverSource {
    covers: HashMap<String, (CoverId, Vec<u8>)>,
    failing: Vec<String>,
    searches: RwLock<Vec<String>>,
}

impl MockCoverSource {
    /// Create a mock source that knows a cover for each given title.
    ///
    /// Identifiers are assigned in iteration order, starting at 1.
    pub fn with_covers(covers: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let covers = covers
            .into_iter()
            .zip(1..)
            .map(|((title, bytes), id)| (title.into(), (CoverId(id), bytes.into())))
            .collect();
        Self { covers, ..Self::default() }
    }

    /// Searches for `title` fail as if the network were down.
    pub fn failing(mut self, title: impl Into<String>) -> Self {
        self.failing.push(title.into());
        self
    }

    /// Titles searched for so far, in call order.
    pub async fn searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }
}

#[async_trait]
impl CoverSource for MockCoverSource {
    async fn find_cover(&self, title: &str, _author: &str) -> Result<Option<CoverId>> {
        self.searches.write().await.push(title.to_string());
        if self.failing.iter().any(|failing| failing == title) {
            exn::bail!(ErrorKind::Request(format!("mock://search/{title}")));
        }
        Ok(self.covers.get(title).map(|(id, _)| *id))
    }

    async fn fetch_cover(&self, id: CoverId) -> Result<Vec<u8>> {
        match self.covers.values().find(|(known, _)| *known == id) {
            Some((_, bytes)) => Ok(bytes.clone()),
            None => exn::bail!(ErrorKind::Status {
                status: 404,
                url: format!("mock://covers/{id}.jpg"),
            }),
        }
    }
}
