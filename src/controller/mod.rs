//! Viewport controller.
//!
//! The controller is the composition root of the engine. It owns a
//! [`ViewportState`](crate::viewport::ViewportState) and a shared
//! [`TileCache`](crate::tile::TileCache), turns input events into state
//! transitions, and starts tile fetches for whatever becomes visible.
//!
//! ```text
//!  pointer / wheel          ┌──────────────────────┐
//!  ──────────────────────▶  │  ViewportController  │ ──▶ RenderFrame
//!                           └──────┬────────┬──────┘
//!                   transitions    │        │   fetch (spawned)
//!                                  ▼        ▼
//!                       ViewportState      TileCache ──▶ TileUpdate
//! ```
//!
//! Drawing is left to the caller: a [`RenderFrame`] lists the visible tiles
//! with their status and, when ready, their encoded bytes.

mod events;
mod viewport_controller;

pub use events::{InputEvent, RenderFrame, TileStatus, TileUpdate, TileView};
pub use viewport_controller::ViewportController;
