use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::grid::{Point, TileOrigin};
use crate::tile::TileKey;

/// Input delivered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    /// Only the sign of `delta` matters; zero is ignored
    Wheel { delta: f64 },
}

impl InputEvent {
    /// Wheel direction as -1, 0 or +1.
    pub fn wheel_direction(delta: f64) -> i32 {
        if delta > 0.0 {
            1
        } else if delta < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Presentation status of one visible tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    /// Payload cached and attached to the view
    Ready,
    /// Fetch started, not finished
    Pending,
    /// Last fetch failed; draw a placeholder
    Unavailable,
}

/// One visible tile in a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub index: u32,
    pub origin: TileOrigin,
    pub status: TileStatus,
    #[serde(skip)]
    pub data: Option<Bytes>,
}

/// Everything the presentation layer needs to draw the current view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub level: u32,
    pub center: Point,
    pub scale: f64,
    pub panning: bool,
    pub tiles: Vec<TileView>,
}

impl RenderFrame {
    /// Visible tile indices in ascending order.
    pub fn indices(&self) -> Vec<u32> {
        self.tiles.iter().map(|tile| tile.index).collect()
    }

    pub fn count(&self, status: TileStatus) -> usize {
        self.tiles.iter().filter(|tile| tile.status == status).count()
    }

    pub fn is_complete(&self) -> bool {
        self.tiles.iter().all(|tile| tile.status != TileStatus::Pending)
    }
}

/// Completion of one tile fetch.
///
/// Fetches started for an older view still report here; `visible` says
/// whether the tile is part of the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileUpdate {
    pub key: TileKey,
    pub ready: bool,
    pub visible: bool,
}
