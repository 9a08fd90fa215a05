//! # Tile Viewport
//!
//! A multi-resolution tile-grid viewport engine.
//!
//! A square canvas is cut into a pyramid of tile grids: level 1 is one
//! tile, and every level doubles the grid in each direction. A viewport
//! (level, center, scale) selects a rectangle on the canvas, the engine
//! resolves the tiles it overlaps, and tiles are fetched once and cached
//! by `(level, index)`.
//!
//! ## Features
//!
//! - **Pure geometry**: tile counts, origins, and viewport intersection
//!   with no I/O
//! - **Immutable viewport state**: pan and zoom transitions return a new
//!   state or a rejection, never a half-applied one
//! - **Single-flight cache**: concurrent requests for the same tile share
//!   one retrieval; failures are never cached
//! - **Tile endpoint**: an Axum router serving `/tiles/{level}/{index}`
//!   from any tile source
//!
//! ## Architecture
//!
//! - [`grid`] - Tile grid geometry
//! - [`viewport`] - Viewport state and transitions
//! - [`tile`] - Tile sources and the tile cache
//! - [`controller`] - Input handling and frame assembly
//! - [`server`] - Axum-based HTTP tile endpoint
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use tile_viewport::{Point, TileGrid, ViewportState};
//!
//! let grid = TileGrid::default();
//! let tiles = grid.intersecting_tiles(2, Point::new(256.0, 256.0), 0.5).unwrap();
//! assert_eq!(tiles, vec![0, 1, 2, 3]);
//!
//! let state = ViewportState::new(grid).unwrap();
//! assert_eq!(state.visible_tiles(), &[0]);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod grid;
pub mod server;
pub mod tile;
pub mod viewport;

// Re-export commonly used types
pub use config::{
    Cli, Command, EngineArgs, EngineConfig, ReplayConfig, ServeConfig, TilesConfig,
};
pub use controller::{InputEvent, RenderFrame, TileStatus, TileUpdate, TileView, ViewportController};
pub use error::{FetchError, GridError, ServerError, ViewportError};
pub use grid::{
    scale_factor, subdivisions, tile_count, Extent, Point, TileGrid, TileOrigin, TileSize,
    WorldRect, DEFAULT_TILE_SIZE, MAX_SUPPORTED_LEVEL,
};
pub use server::{create_router, AppState, RouterConfig};
pub use tile::{
    CacheStats, DirectoryTileSource, HttpTileSource, TileCache, TileKey, TileLookup, TileSource,
};
pub use viewport::{PanMode, ViewportState, ZoomMode};
