//! Test utilities for integration tests.
//!
//! This module provides a counting mock tile source and helpers for
//! creating small encoded tile images.

use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tile_viewport::error::FetchError;
use tile_viewport::tile::{TileKey, TileSource};

// =============================================================================
// Tile Images
// =============================================================================

/// Encode a small solid-color PNG whose color is derived from `key`.
pub fn png_tile(key: TileKey) -> Bytes {
    let color = Rgb([(key.level * 40) as u8, (key.index % 256) as u8, 128]);
    let img = RgbImage::from_pixel(4, 4, color);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG");
    Bytes::from(buf.into_inner())
}

/// Encode a small JPEG tile.
pub fn jpeg_tile() -> Bytes {
    let img = RgbImage::from_pixel(8, 8, Rgb([200, 10, 10]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    Bytes::from(buf.into_inner())
}

// =============================================================================
// Mock Tile Source with Request Tracking
// =============================================================================

/// A mock tile source that serves [`png_tile`] for every key and records
/// each retrieval.
///
/// Clones share their counters and failure set.
#[derive(Clone, Default)]
pub struct MockTileSource {
    calls: Arc<AtomicUsize>,
    per_key: Arc<Mutex<HashMap<TileKey, usize>>>,
    missing: Arc<Mutex<HashSet<TileKey>>>,
    delay: Option<Duration>,
}

impl MockTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every retrieval, to keep fetches in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `key` fail with `NotFound` until [`MockTileSource::restore`].
    pub fn remove(&self, key: TileKey) {
        self.missing.lock().unwrap().insert(key);
    }

    pub fn restore(&self, key: TileKey) {
        self.missing.lock().unwrap().remove(&key);
    }

    /// Total retrievals.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Retrievals of one key.
    pub fn calls_for(&self, key: TileKey) -> usize {
        self.per_key
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl TileSource for MockTileSource {
    async fn retrieve(&self, key: TileKey) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_key.lock().unwrap().entry(key).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.missing.lock().unwrap().contains(&key) {
            return Err(FetchError::NotFound(key.to_string()));
        }

        Ok(png_tile(key))
    }

    fn identifier(&self) -> &str {
        "mock://tiles"
    }
}

// =============================================================================
// Scratch Directories
// =============================================================================

/// Create an empty scratch directory unique to `name` under the system
/// temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tile-viewport-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Write `data` as `{root}/{level}/{index}.{ext}`.
pub fn write_tile(root: &std::path::Path, key: TileKey, ext: &str, data: &[u8]) {
    let dir = root.join(key.level.to_string());
    std::fs::create_dir_all(&dir).expect("Failed to create level dir");
    std::fs::write(dir.join(format!("{}.{}", key.index, ext)), data)
        .expect("Failed to write tile");
}
