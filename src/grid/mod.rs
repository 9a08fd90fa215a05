//! Tile-grid geometry.
//!
//! This module maps resolution levels to grid dimensions and finds the tiles
//! that a world-space rectangle touches.
//!
//! # Resolution Levels
//!
//! Level 1 is the coarsest level and covers the canvas with a single tile.
//! Each step doubles the number of tiles along each axis:
//!
//! ```text
//! level 1          level 2          level 3
//! ┌───────┐        ┌───┬───┐        ┌─┬─┬─┬─┐
//! │   0   │        │ 0 │ 1 │        │0│1│2│3│
//! │       │        ├───┼───┤        ├─┼─┼─┼─┤
//! └───────┘        │ 2 │ 3 │        │4│5│6│7│
//!                  └───┴───┘        ├─┼─┼─┼─┤
//!                                   │ ... │ │
//! ```
//!
//! Tiles keep the same pixel size at every level, so the canvas grows with the
//! level. Tile indices are row-major and only mean something together with
//! the level they were computed for.
//!
//! # Example
//!
//! ```
//! use tile_viewport::grid::{Point, TileGrid, TileSize};
//!
//! let grid = TileGrid::new(TileSize::default());
//!
//! // A centered view covering half the level 2 canvas touches all four tiles.
//! let tiles = grid
//!     .intersecting_tiles(2, Point::new(256.0, 256.0), 0.5)
//!     .unwrap();
//! assert_eq!(tiles, vec![0, 1, 2, 3]);
//! ```

mod geometry;

pub use geometry::{
    scale_factor, subdivisions, tile_count, Extent, Point, TileGrid, TileOrigin, TileSize,
    WorldRect, DEFAULT_TILE_SIZE, MAX_SUPPORTED_LEVEL,
};
