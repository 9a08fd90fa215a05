use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Cache and fetch key: a tile index together with the level it belongs to.
///
/// Indices from different levels never compare equal through this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    /// Resolution level (1 = coarsest)
    pub level: u32,

    /// Row-major tile index within the level
    pub index: u32,
}

impl TileKey {
    pub const fn new(level: u32, index: u32) -> Self {
        Self { level, index }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.level, self.index)
    }
}

/// Byte-oriented tile image source.
///
/// Implementations are addressed conceptually as `{base}/{level}/{index}`
/// and must be thread-safe; the cache may call them from several tasks.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Retrieve the encoded image bytes for `key`.
    async fn retrieve(&self, key: TileKey) -> Result<Bytes, FetchError>;

    /// Human-readable identifier for logging (for example the base URL).
    fn identifier(&self) -> &str;
}

#[async_trait]
impl<T: TileSource + ?Sized> TileSource for Arc<T> {
    async fn retrieve(&self, key: TileKey) -> Result<Bytes, FetchError> {
        (**self).retrieve(key).await
    }

    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}

/// Check that a payload looks like an encoded image and report its format.
///
/// Only the magic bytes are inspected; full decoding is left to the
/// presentation layer.
pub fn sniff_image(data: &[u8]) -> Result<ImageFormat, FetchError> {
    if data.is_empty() {
        return Err(FetchError::Decode("empty payload".to_string()));
    }
    image::guess_format(data).map_err(|e| FetchError::Decode(e.to_string()))
}

/// MIME type for a sniffed payload, falling back to `application/octet-stream`.
pub fn content_type_for(data: &[u8]) -> &'static str {
    sniff_image(data)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
