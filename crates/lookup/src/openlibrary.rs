//! Open Library search and covers API client.

use crate::error::{ErrorKind, Result};
use crate::source::{CoverId, CoverSource};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const SEARCH_URL: &str = "https://openlibrary.org/search.json";
const COVERS_URL: &str = "https://covers.openlibrary.org/b/id/";
const PRODUCT: &str = "Folio/0.1";

/// `User-Agent` value identifying this client and who to contact about it.
pub fn user_agent(contact: &str) -> String {
    format!("{PRODUCT} (contact: {contact})")
}

/// The subset of a `search.json` response that matters for covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}
impl SearchResponse {
    /// Cover identifier of the first result, if there is a usable one.
    pub fn cover_id(&self) -> Option<CoverId> {
        if self.num_found == 0 {
            return None;
        }
        self.docs.first()?.cover_i.and_then(CoverId::new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchDoc {
    #[serde(default)]
    pub cover_i: Option<i64>,
}

/// Client for the public Open Library APIs.
///
/// Every request carries the identifying `User-Agent` Open Library asks
/// for, and is bounded by the timeout given on construction.
#[derive(Debug, Clone)]
pub struct OpenLibrary {
    client: Client,
}
impl OpenLibrary {
    pub fn new(contact: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent(contact))
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client })
    }

    pub fn search_url(title: &str, author: &str) -> Result<Url> {
        // Only the first document is ever looked at.
        Url::parse_with_params(SEARCH_URL, &[("title", title), ("author", author), ("limit", "1")])
            .or_raise(|| ErrorKind::Request(SEARCH_URL.to_string()))
    }

    pub fn cover_url(id: CoverId) -> Result<Url> {
        let url = format!("{COVERS_URL}{id}.jpg");
        Url::parse(&url).or_raise(|| ErrorKind::Request(url))
    }

    async fn get(&self, url: Url) -> Result<Response> {
        let response = self.client.get(url.clone()).send().await.or_raise(|| ErrorKind::Request(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CoverSource for OpenLibrary {
    #[instrument(skip(self))]
    async fn find_cover(&self, title: &str, author: &str) -> Result<Option<CoverId>> {
        let url = Self::search_url(title, author)?;
        let context = url.to_string();
        let response: SearchResponse = self.get(url).await?.json().await.or_raise(|| ErrorKind::Decode(context))?;
        let id = response.cover_id();
        tracing::debug!(found = response.num_found, cover = ?id, "Searched Open Library");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn fetch_cover(&self, id: CoverId) -> Result<Vec<u8>> {
        let url = Self::cover_url(id)?;
        let context = url.to_string();
        let bytes = self.get(url).await?.bytes().await.or_raise(|| ErrorKind::Request(context))?;
        tracing::debug!(bytes = bytes.len(), "Downloaded cover");
        Ok(bytes.to_vec())
    }
}
