use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, ViewportError};
use crate::grid::{scale_factor, Point, TileGrid, WorldRect, MAX_SUPPORTED_LEVEL};

/// Distance from 0 or 1 within which an accumulated scale lands on the bound.
const SCALE_SNAP: f64 = 1e-9;

/// Drag state of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PanMode {
    /// No drag in progress
    Idle,

    /// Dragging; positions are relative to where the drag started
    Panning {
        anchor_pointer: Point,
        anchor_center: Point,
    },
}

/// How wheel input changes the view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// Continuous scale steps of `1 / sensitivity` at a fixed level
    #[default]
    Scale,

    /// Discrete resolution level steps
    Level,
}

/// Snapshot of the viewport.
///
/// Created at level 1, centered on the canvas, with the whole canvas visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    grid: TileGrid,
    level: u32,
    center: Point,
    scale: f64,
    mode: PanMode,
    visible: Vec<u32>,
}

impl ViewportState {
    /// Initial state: level 1, canvas midpoint, scale 1.
    pub fn new(grid: TileGrid) -> Result<Self, GridError> {
        let center = grid.canvas_center(1)?;
        Self::at(grid, 1, center, 1.0)
    }

    /// Idle state at an explicit view.
    pub fn at(grid: TileGrid, level: u32, center: Point, scale: f64) -> Result<Self, GridError> {
        let visible = grid.intersecting_tiles(level, center, scale)?;
        Ok(Self {
            grid,
            level,
            center,
            scale,
            mode: PanMode::Idle,
            visible,
        })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn mode(&self) -> PanMode {
        self.mode
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.mode, PanMode::Panning { .. })
    }

    /// Visible tile indices at the current level, ascending.
    pub fn visible_tiles(&self) -> &[u32] {
        &self.visible
    }

    /// The world-space rectangle currently in view.
    pub fn visible_rect(&self) -> WorldRect {
        let extent = self.grid.canvas_extent(self.level).map(|e| {
            (e.width as f64 * self.scale, e.height as f64 * self.scale)
        });
        let (width, height) = extent.unwrap_or((0.0, 0.0));
        WorldRect::centered(self.center, width, height)
    }

    // =========================================================================
    // Pan
    // =========================================================================

    /// Start a drag at `pointer`.
    ///
    /// Re-anchors if a drag is already in progress. Tiles are unchanged.
    pub fn begin_pan(&self, pointer: Point) -> Self {
        Self {
            mode: PanMode::Panning {
                anchor_pointer: pointer,
                anchor_center: self.center,
            },
            ..self.clone()
        }
    }

    /// Move the drag to `pointer`.
    ///
    /// The new center is the anchor center plus the pointer displacement
    /// since the drag started. Ignored while idle.
    pub fn move_pan(&self, pointer: Point) -> Result<Self, ViewportError> {
        let PanMode::Panning {
            anchor_pointer,
            anchor_center,
        } = self.mode
        else {
            return Ok(self.clone());
        };

        let center = anchor_center + (pointer - anchor_pointer);
        Ok(self.with_view(self.level, center, self.scale)?)
    }

    /// Finish the drag. Idempotent.
    pub fn end_pan(&self) -> Self {
        Self {
            mode: PanMode::Idle,
            ..self.clone()
        }
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    /// Continuous zoom: `scale + direction / sensitivity` at the same level.
    ///
    /// Positive directions show more of the canvas. A result outside `[0, 1]`
    /// is rejected rather than clamped, so wheel ticks past either end have no
    /// effect until the direction reverses.
    pub fn zoom(&self, direction: i32, sensitivity: f64) -> Result<Self, ViewportError> {
        let direction = direction.signum();
        if direction == 0 {
            return Ok(self.clone());
        }

        let scale = snap_scale(self.scale + f64::from(direction) / sensitivity);
        if !(0.0..=1.0).contains(&scale) {
            debug!(scale, "zoom rejected");
            return Err(ViewportError::ScaleOutOfRange { scale });
        }

        Ok(self.with_view(self.level, self.center, scale)?)
    }

    /// Discrete zoom: step the resolution level by `direction`.
    ///
    /// Rejected outside `[1, max_level]`. The center is reused verbatim at the
    /// new level, and the scale is rebased so the view keeps its world size.
    pub fn zoom_level(&self, direction: i32, max_level: u32) -> Result<Self, ViewportError> {
        let direction = direction.signum();
        if direction == 0 {
            return Ok(self.clone());
        }

        let max_level = max_level.min(MAX_SUPPORTED_LEVEL);
        let requested = i64::from(self.level) + i64::from(direction);
        if requested < 1 || requested > i64::from(max_level) {
            debug!(level = requested, max_level, "level change rejected");
            return Err(ViewportError::LevelOutOfRange {
                level: requested,
                max_level,
            });
        }

        let level = requested as u32;
        let scale = self.scale * scale_factor(level)? / scale_factor(self.level)?;
        Ok(self.with_view(level, self.center, scale)?)
    }

    fn with_view(&self, level: u32, center: Point, scale: f64) -> Result<Self, GridError> {
        let visible = self.grid.intersecting_tiles(level, center, scale)?;
        Ok(Self {
            grid: self.grid,
            level,
            center,
            scale,
            mode: self.mode,
            visible,
        })
    }
}

/// Put sums within rounding distance of 0 or 1 exactly on the bound.
fn snap_scale(scale: f64) -> f64 {
    if scale.abs() < SCALE_SNAP {
        0.0
    } else if (scale - 1.0).abs() < SCALE_SNAP {
        1.0
    } else {
        scale
    }
}

// =============================================================================
// Tests
// =============================================================================
