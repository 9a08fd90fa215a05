//! Viewport state machine.
//!
//! A [`ViewportState`] holds the current level, world-space center, visible
//! scale and the tile indices visible under them. Transitions are pure: each
//! returns a new state (or a rejection) and leaves the original untouched.
//!
//! ```text
//!            begin_pan                 move_pan
//!   ┌──────┐ ─────────▶ ┌─────────┐ ◀───────────┐
//!   │ Idle │            │ Panning │ ────────────┘
//!   └──────┘ ◀───────── └─────────┘
//!      ▲  │    end_pan
//!      └──┘ zoom / zoom_level
//! ```
//!
//! Every accepted transition that moves the view recomputes the visible tiles
//! from scratch through [`TileGrid`](crate::grid::TileGrid), so the tile set
//! always agrees with `(level, center, scale)`.

mod state;

pub use state::{PanMode, ViewportState, ZoomMode};
