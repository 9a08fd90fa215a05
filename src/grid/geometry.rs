//! Pure geometry over `(level, tile size)`.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Default tile edge length in world-space pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Deepest level the grid accepts.
///
/// At level 16 there are 32768 tiles per axis, so the tile count still fits
/// in a `u32`.
pub const MAX_SUPPORTED_LEVEL: u32 = 16;

// =============================================================================
// Level Functions
// =============================================================================

/// Number of tiles along each axis at `level`: `2^(level-1)`.
pub fn subdivisions(level: u32) -> Result<u32, GridError> {
    check_level(level)?;
    Ok(1 << (level - 1))
}

/// Fraction of the canvas covered by one tile along each axis at `level`.
pub fn scale_factor(level: u32) -> Result<f64, GridError> {
    Ok(1.0 / f64::from(subdivisions(level)?))
}

/// Total number of tiles at `level`.
pub fn tile_count(level: u32) -> Result<u32, GridError> {
    let n = subdivisions(level)?;
    Ok(n * n)
}

fn check_level(level: u32) -> Result<(), GridError> {
    if level == 0 || level > MAX_SUPPORTED_LEVEL {
        return Err(GridError::InvalidLevel {
            level,
            max_level: MAX_SUPPORTED_LEVEL,
        });
    }
    Ok(())
}

// =============================================================================
// Value Types
// =============================================================================

/// Tile dimensions in world-space pixels, fixed for the lifetime of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    /// Create a tile size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidTileSize { width, height });
        }
        Ok(Self { width, height })
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
        }
    }
}

/// A point (or displacement) in world-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Full addressable canvas size at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub width: u64,
    pub height: u64,
}

/// Top-left corner of a tile in world-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileOrigin {
    pub x: u64,
    pub y: u64,
}

/// Axis-aligned rectangle in world space, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldRect {
    pub min: Point,
    pub max: Point,
}

impl WorldRect {
    /// Rectangle of the given size centered on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        let half = Point::new(width / 2.0, height / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Closed-interval overlap: rectangles that only share an edge or a
    /// corner overlap.
    pub fn overlaps(&self, other: &WorldRect) -> bool {
        // Entirely left, right, above, or below excludes; anything else touches.
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }
}

// =============================================================================
// Tile Grid
// =============================================================================

/// Stateless tile-grid geometry for one tile size.
///
/// Every level shares the same tile size; the canvas at level `L` is
/// `subdivisions(L)` tiles wide and tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileGrid {
    tile_size: TileSize,
}

impl TileGrid {
    pub fn new(tile_size: TileSize) -> Self {
        Self { tile_size }
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    /// Canvas size at `level`: `subdivisions(level) * tile size`.
    pub fn canvas_extent(&self, level: u32) -> Result<Extent, GridError> {
        let n = u64::from(subdivisions(level)?);
        Ok(Extent {
            width: n * u64::from(self.tile_size.width),
            height: n * u64::from(self.tile_size.height),
        })
    }

    /// Midpoint of the canvas at `level`.
    pub fn canvas_center(&self, level: u32) -> Result<Point, GridError> {
        let extent = self.canvas_extent(level)?;
        Ok(Point::new(
            extent.width as f64 / 2.0,
            extent.height as f64 / 2.0,
        ))
    }

    /// Top-left corner of tile `index` at `level` (row-major decode).
    pub fn tile_origin(&self, level: u32, index: u32) -> Result<TileOrigin, GridError> {
        let cols = subdivisions(level)?;
        let count = cols * cols;
        if index >= count {
            return Err(GridError::IndexOutOfRange {
                level,
                index,
                count,
            });
        }
        Ok(self.origin_unchecked(cols, index))
    }

    /// World-space bounds of tile `index` at `level`.
    pub fn tile_rect(&self, level: u32, index: u32) -> Result<WorldRect, GridError> {
        let origin = self.tile_origin(level, index)?;
        Ok(self.rect_at(origin))
    }

    /// Index of the tile containing `point` at `level`.
    ///
    /// Points on a shared edge belong to the tile to the right/below, so this
    /// inverts [`TileGrid::tile_origin`] exactly.
    pub fn tile_index_at(&self, level: u32, point: Point) -> Result<u32, GridError> {
        let extent = self.canvas_extent(level)?;
        let outside = !point.x.is_finite()
            || !point.y.is_finite()
            || point.x < 0.0
            || point.y < 0.0
            || point.x >= extent.width as f64
            || point.y >= extent.height as f64;
        if outside {
            return Err(GridError::OutsideCanvas {
                level,
                x: point.x,
                y: point.y,
            });
        }

        let cols = subdivisions(level)?;
        let col = (point.x / f64::from(self.tile_size.width)).floor() as u32;
        let row = (point.y / f64::from(self.tile_size.height)).floor() as u32;
        Ok(row * cols + col)
    }

    /// Visible rectangle for a view centered on `center` at scale `scale`:
    /// `center ± canvas_extent * scale / 2`.
    pub fn viewport_rect(
        &self,
        level: u32,
        center: Point,
        scale: f64,
    ) -> Result<WorldRect, GridError> {
        let extent = self.canvas_extent(level)?;
        Ok(WorldRect::centered(
            center,
            extent.width as f64 * scale,
            extent.height as f64 * scale,
        ))
    }

    /// Every tile at `level` whose bounds overlap the view rectangle, in
    /// ascending index order.
    ///
    /// Tiles that only touch the rectangle's boundary are included. Only the
    /// rows and columns the rectangle spans are visited, so the cost follows
    /// the number of visible tiles, not the size of the level.
    pub fn intersecting_tiles(
        &self,
        level: u32,
        center: Point,
        scale: f64,
    ) -> Result<Vec<u32>, GridError> {
        let view = self.viewport_rect(level, center, scale)?;
        let cols = subdivisions(level)?;

        let Some((col_lo, col_hi)) = span(view.min.x, view.max.x, self.tile_size.width, cols)
        else {
            return Ok(Vec::new());
        };
        let Some((row_lo, row_hi)) = span(view.min.y, view.max.y, self.tile_size.height, cols)
        else {
            return Ok(Vec::new());
        };

        // Row-major walk keeps indices ascending
        let mut tiles = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let index = row * cols + col;
                let tile = self.rect_at(self.origin_unchecked(cols, index));
                if view.overlaps(&tile) {
                    tiles.push(index);
                }
            }
        }
        Ok(tiles)
    }

    fn origin_unchecked(&self, cols: u32, index: u32) -> TileOrigin {
        TileOrigin {
            x: u64::from(index % cols) * u64::from(self.tile_size.width),
            y: u64::from(index / cols) * u64::from(self.tile_size.height),
        }
    }

    fn rect_at(&self, origin: TileOrigin) -> WorldRect {
        let min = Point::new(origin.x as f64, origin.y as f64);
        WorldRect {
            min,
            max: Point::new(
                min.x + f64::from(self.tile_size.width),
                min.y + f64::from(self.tile_size.height),
            ),
        }
    }
}

/// Inclusive range of tile positions along one axis that may touch
/// `[min, max]`, widened by one on each side to absorb division rounding.
/// Callers confirm each candidate with an exact overlap test.
fn span(min: f64, max: f64, edge: u32, count: u32) -> Option<(u32, u32)> {
    let extent = f64::from(edge) * f64::from(count);
    if !min.is_finite() || !max.is_finite() || max < 0.0 || min > extent {
        return None;
    }

    let edge = f64::from(edge);
    let last = f64::from(count - 1);
    let lo = ((min / edge).floor() - 1.0).clamp(0.0, last) as u32;
    let hi = ((max / edge).floor() + 1.0).clamp(0.0, last) as u32;
    Some((lo, hi))
}

// =============================================================================
// Tests
// =============================================================================
