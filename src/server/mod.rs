//! HTTP tile endpoint.
//!
//! Serves tiles from any [`TileSource`](crate::tile::TileSource) through a
//! shared [`TileCache`](crate::tile::TileCache), in the `{level}/{index}`
//! layout that [`HttpTileSource`](crate::tile::HttpTileSource) requests.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      HTTP Layer                      │
//! │               GET /tiles/{level}/{index}             │
//! │                                                      │
//! │  ┌──────────────────────┐  ┌──────────────────────┐  │
//! │  │       handlers       │  │        routes        │  │
//! │  │ (validate, respond)  │  │ (CORS, tracing)      │  │
//! │  └──────────────────────┘  └──────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, tile_handler, AppState, ErrorResponse, HealthResponse, TilePathParams,
    CACHE_HIT_HEADER,
};
pub use routes::{create_router, RouterConfig};
