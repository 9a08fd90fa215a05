//! HTTP-backed tile source.
//!
//! Fetches tiles from `{base}/{level}/{index}` with plain GET requests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use url::Url;

use super::source::{sniff_image, TileKey, TileSource};
use crate::error::FetchError;

/// Tile source that issues one GET per tile.
///
/// Non-success statuses and payloads that are not images are reported as
/// errors so the cache can treat them as misses.
///
/// # Example
///
/// ```
/// use tile_viewport::tile::{HttpTileSource, TileKey};
///
/// let source = HttpTileSource::new("http://localhost:8000/nebula").unwrap();
/// let url = source.tile_url(TileKey::new(2, 3)).unwrap();
/// assert_eq!(url.as_str(), "http://localhost:8000/nebula/2/3");
/// ```
#[derive(Clone)]
pub struct HttpTileSource {
    client: Client,
    base: Url,
    identifier: String,
}

impl HttpTileSource {
    /// Create a source for `base_url` with a default client.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a source with a preconfigured client (timeouts, TLS, etc.).
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|e| FetchError::Connection(format!("invalid base URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::Connection(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            client,
            identifier: base.to_string(),
            base,
        })
    }

    /// Base URL tiles are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Full URL of one tile.
    pub fn tile_url(&self, key: TileKey) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Connection(format!("invalid base URL {}", self.base)))?
            .pop_if_empty()
            .push(&key.level.to_string())
            .push(&key.index.to_string());
        Ok(url)
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    async fn retrieve(&self, key: TileKey) -> Result<Bytes, FetchError> {
        let url = self.tile_url(key)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;
        sniff_image(&data)?;

        Ok(data)
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
