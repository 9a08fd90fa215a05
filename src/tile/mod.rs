//! Tile retrieval and caching.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     ViewportController / HTTP layer     │
//! └────────────────────┬────────────────────┘
//!                      │ fetch(level, index)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileCache                 │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   entries    │  │    in_flight    │  │
//! │  │ (key → bytes)│  │ (key → waiters) │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │ retrieve(key)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           TileSource trait              │
//! └────────────────────┬────────────────────┘
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │ HttpTileSource  │    │ DirectoryTileSource │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileKey`]: `(level, index)` pair used for caching and addressing
//! - [`TileSource`]: byte-oriented retrieval of one tile
//! - [`TileCache`]: unbounded cache with one retrieval in flight per key
//! - [`HttpTileSource`]: GET `{base}/{level}/{index}`
//! - [`DirectoryTileSource`]: read `{root}/{level}/{index}[.ext]`

mod cache;
mod dir_source;
mod http_source;
mod source;

pub use cache::{CacheStats, TileCache, TileLookup};
pub use dir_source::DirectoryTileSource;
pub use http_source::HttpTileSource;
pub use source::{content_type_for, sniff_image, TileKey, TileSource};
