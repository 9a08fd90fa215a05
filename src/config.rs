//! Configuration management for the tile viewport engine.
//!
//! This module provides:
//! - [`EngineConfig`]: the parameters of one viewport engine instance
//! - Command-line arguments via clap, one subcommand per binary mode
//! - Environment variables with the `TILEVIEW_` prefix
//!
//! # Environment Variables
//!
//! - `TILEVIEW_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILEVIEW_PORT` - Server port (default: 8000)
//! - `TILEVIEW_TILES_DIR` - Directory holding `{level}/{index}` tiles
//! - `TILEVIEW_TILE_EXTENSION` - Extension appended to tile file names
//! - `TILEVIEW_BASE_URL` - Tile endpoint the replay command fetches from
//! - `TILEVIEW_TILE_WIDTH` / `TILEVIEW_TILE_HEIGHT` - Tile size (default: 256)
//! - `TILEVIEW_MAX_LEVEL` - Deepest resolution level (default: 6)
//! - `TILEVIEW_ZOOM_SENSITIVITY` - Wheel ticks per full scale range (default: 10)
//! - `TILEVIEW_ZOOM_MODE` - `scale` or `level` (default: scale)
//! - `TILEVIEW_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `TILEVIEW_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::grid::{TileGrid, TileSize, DEFAULT_TILE_SIZE, MAX_SUPPORTED_LEVEL};
use crate::viewport::ZoomMode;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default deepest resolution level.
pub const DEFAULT_MAX_LEVEL: u32 = 6;

/// Default number of wheel ticks spanning the full `[0, 1]` scale range.
pub const DEFAULT_ZOOM_SENSITIVITY: f64 = 10.0;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Default per-request timeout for the replay command's HTTP client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Engine Configuration
// =============================================================================

/// Parameters of one viewport engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Tile size shared by every level
    pub tile_size: TileSize,

    /// Deepest level reachable by level zoom
    pub max_level: u32,

    /// Wheel ticks per full scale range in scale mode
    pub zoom_sensitivity: f64,

    /// What a wheel tick changes
    pub zoom_mode: ZoomMode,
}

impl EngineConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size.width == 0 || self.tile_size.height == 0 {
            return Err("tile width and height must be greater than 0".to_string());
        }

        if self.max_level == 0 || self.max_level > MAX_SUPPORTED_LEVEL {
            return Err(format!(
                "max_level must be between 1 and {}",
                MAX_SUPPORTED_LEVEL
            ));
        }

        if !self.zoom_sensitivity.is_finite() || self.zoom_sensitivity <= 0.0 {
            return Err("zoom_sensitivity must be a positive number".to_string());
        }

        Ok(())
    }

    /// Tile grid for this configuration.
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.tile_size)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: TileSize::default(),
            max_level: DEFAULT_MAX_LEVEL,
            zoom_sensitivity: DEFAULT_ZOOM_SENSITIVITY,
            zoom_mode: ZoomMode::default(),
        }
    }
}

/// Engine options shared by commands that drive a viewport.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Tile width in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILEVIEW_TILE_WIDTH")]
    pub tile_width: u32,

    /// Tile height in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILEVIEW_TILE_HEIGHT")]
    pub tile_height: u32,

    /// Deepest resolution level.
    #[arg(long, default_value_t = DEFAULT_MAX_LEVEL, env = "TILEVIEW_MAX_LEVEL")]
    pub max_level: u32,

    /// Wheel ticks spanning the full scale range (scale mode).
    #[arg(long, default_value_t = DEFAULT_ZOOM_SENSITIVITY, env = "TILEVIEW_ZOOM_SENSITIVITY")]
    pub zoom_sensitivity: f64,

    /// What a wheel tick changes.
    #[arg(long, value_enum, default_value_t = ZoomMode::Scale, env = "TILEVIEW_ZOOM_MODE")]
    pub zoom_mode: ZoomMode,
}

impl EngineArgs {
    /// Build and validate the engine configuration.
    pub fn to_config(&self) -> Result<EngineConfig, String> {
        let tile_size = TileSize::new(self.tile_width, self.tile_height).map_err(|e| e.to_string())?;
        let config = EngineConfig {
            tile_size,
            max_level: self.max_level,
            zoom_sensitivity: self.zoom_sensitivity,
            zoom_mode: self.zoom_mode,
        };
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile viewport - a multi-resolution tile-grid viewport engine.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-viewport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve tiles from a directory at /tiles/{level}/{index}.
    Serve(ServeConfig),

    /// Replay viewport input events against a tile endpoint.
    Replay(ReplayConfig),

    /// Print the tiles a view intersects.
    Tiles(TilesConfig),
}

/// Options for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILEVIEW_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILEVIEW_PORT")]
    pub port: u16,

    /// Directory holding tiles as {level}/{index}[.ext].
    #[arg(long, env = "TILEVIEW_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Extension appended to tile file names (e.g. "png").
    #[arg(long, env = "TILEVIEW_TILE_EXTENSION")]
    pub extension: Option<String>,

    /// Deepest level served.
    #[arg(long, default_value_t = DEFAULT_MAX_LEVEL, env = "TILEVIEW_MAX_LEVEL")]
    pub max_level: u32,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILEVIEW_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILEVIEW_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.as_os_str().is_empty() {
            return Err(
                "Tiles directory is required. Set --tiles-dir or TILEVIEW_TILES_DIR".to_string(),
            );
        }

        if self.max_level == 0 || self.max_level > MAX_SUPPORTED_LEVEL {
            return Err(format!(
                "max_level must be between 1 and {}",
                MAX_SUPPORTED_LEVEL
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Options for the `replay` command.
#[derive(Args, Debug, Clone)]
pub struct ReplayConfig {
    /// Base URL tiles are fetched from as {base}/{level}/{index}.
    #[arg(long, env = "TILEVIEW_BASE_URL")]
    pub base_url: String,

    /// JSON Lines file of input events ("-" for stdin).
    #[arg(long, default_value = "-")]
    pub events: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Wait for tile fetches to finish after every event.
    #[arg(long, default_value_t = false)]
    pub settle_each: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ReplayConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Base URL is required. Set --base-url or TILEVIEW_BASE_URL".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        self.engine.to_config().map(|_| ())
    }

    /// Whether events are read from stdin.
    pub fn events_from_stdin(&self) -> bool {
        self.events.as_os_str() == "-"
    }
}

/// Options for the `tiles` command.
#[derive(Args, Debug, Clone)]
pub struct TilesConfig {
    /// Resolution level.
    #[arg(long, default_value_t = 1)]
    pub level: u32,

    /// View center X in world pixels (default: canvas midpoint).
    #[arg(long, allow_negative_numbers = true)]
    pub center_x: Option<f64>,

    /// View center Y in world pixels (default: canvas midpoint).
    #[arg(long, allow_negative_numbers = true)]
    pub center_y: Option<f64>,

    /// Fraction of the canvas visible (0-1).
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Tile width in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILEVIEW_TILE_WIDTH")]
    pub tile_width: u32,

    /// Tile height in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILEVIEW_TILE_HEIGHT")]
    pub tile_height: u32,
}

impl TilesConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.level == 0 || self.level > MAX_SUPPORTED_LEVEL {
            return Err(format!("level must be between 1 and {}", MAX_SUPPORTED_LEVEL));
        }

        if !(0.0..=1.0).contains(&self.scale) {
            return Err("scale must be between 0 and 1".to_string());
        }

        TileSize::new(self.tile_width, self.tile_height)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
