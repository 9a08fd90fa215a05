use thiserror::Error;

/// Errors from the tile-grid geometry.
///
/// These are programmer errors when they come out of the viewport state
/// machine: its transition guards keep levels and indices in range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Resolution level is 0 or beyond the deepest supported level
    #[error("Invalid level: {level} (valid range: 1-{max_level})")]
    InvalidLevel { level: u32, max_level: u32 },

    /// Tile index does not exist at the given level
    #[error("Tile index {index} out of range for level {level} ({count} tiles)")]
    IndexOutOfRange { level: u32, index: u32, count: u32 },

    /// Tiles must have a non-zero width and height
    #[error("Invalid tile size: {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },

    /// A world-space point falls outside the canvas at the given level
    #[error("Point ({x}, {y}) is outside the level {level} canvas")]
    OutsideCanvas { level: u32, x: f64, y: f64 },
}

/// A viewport transition that was rejected.
///
/// The previous state remains current when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
    /// Continuous zoom would leave the `[0, 1]` scale range
    #[error("Scale out of range: {scale} (valid range: 0-1)")]
    ScaleOutOfRange { scale: f64 },

    /// Level stepping would leave `[1, max_level]`
    #[error("Level out of range: {level} (valid range: 1-{max_level})")]
    LevelOutOfRange { level: i64, max_level: u32 },

    /// Geometry failure while recomputing the visible tiles
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

/// Errors from a tile image source.
///
/// The tile cache turns every one of these into a miss; none are fatal.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Source answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Tile does not exist at the source
    #[error("Tile not found: {0}")]
    NotFound(String),

    /// Payload is not a recognizable image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors returned by the tile HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Requested level is outside the served range
    #[error("Invalid level: {level} (valid range: 1-{max_level})")]
    InvalidLevel { level: u32, max_level: u32 },

    /// Requested index does not exist at its level
    #[error("Tile index {index} out of range for level {level} ({count} tiles)")]
    IndexOutOfRange { level: u32, index: u32, count: u32 },

    /// The source could not produce the tile
    #[error("Tile unavailable: {level}/{index}")]
    TileUnavailable { level: u32, index: u32 },
}
