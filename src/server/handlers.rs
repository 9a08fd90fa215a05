//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /tiles/{level}/{index}` - Serve one encoded tile
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DEFAULT_CACHE_MAX_AGE;
use crate::error::ServerError;
use crate::grid::{tile_count, MAX_SUPPORTED_LEVEL};
use crate::tile::{content_type_for, TileCache, TileKey, TileSource};

/// Header reporting whether the tile was served from the cache.
pub const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-tile-cache-hit");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile cache.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S> {
    /// Cache in front of the tile source
    pub cache: Arc<TileCache<S>>,

    /// Highest level served
    pub max_level: u32,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,
}

impl<S: TileSource> AppState<S> {
    /// Create state serving levels `1..=max_level`.
    ///
    /// `max_level` is clamped to the largest level the grid supports.
    pub fn new(cache: Arc<TileCache<S>>, max_level: u32) -> Self {
        Self {
            cache,
            max_level: max_level.min(MAX_SUPPORTED_LEVEL),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }

    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }

    /// Check that `key` addresses an existing tile.
    pub fn validate(&self, key: TileKey) -> Result<(), ServerError> {
        if key.level == 0 || key.level > self.max_level {
            return Err(ServerError::InvalidLevel {
                level: key.level,
                max_level: self.max_level,
            });
        }

        let count = tile_count(key.level).map_err(|_| ServerError::InvalidLevel {
            level: key.level,
            max_level: self.max_level,
        })?;
        if key.index >= count {
            return Err(ServerError::IndexOutOfRange {
                level: key.level,
                index: key.index,
                count,
            });
        }

        Ok(())
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            max_level: self.max_level,
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{level}/{index}`
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Resolution level (1 = whole canvas in one tile)
    pub level: u32,

    /// Row-major tile index within the level
    pub index: u32,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_level", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ServerError to HTTP response.
///
/// Unknown tiles are logged at DEBUG (frequent while a viewer pans across a
/// sparse tile set), everything else at WARN.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ServerError::InvalidLevel { .. } => (StatusCode::BAD_REQUEST, "invalid_level"),
            ServerError::IndexOutOfRange { .. } => (StatusCode::NOT_FOUND, "index_out_of_range"),
            ServerError::TileUnavailable { .. } => (StatusCode::NOT_FOUND, "not_found"),
        };
        let message = self.to_string();

        if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Tile not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Serve one tile.
///
/// # Response Headers
///
/// - `Content-Type`: sniffed from the payload (`image/png`, `image/jpeg`, ...)
/// - `Cache-Control`: `public, max-age={cache_max_age}`
/// - `X-Tile-Cache-Hit`: `true` when no retrieval was needed
///
/// # Errors
///
/// - 400 when the level is outside `1..=max_level`
/// - 404 when the index does not exist at that level
/// - 404 when the source could not produce the tile
pub async fn tile_handler<S: TileSource>(
    State(state): State<AppState<S>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, ServerError> {
    let key = TileKey::new(params.level, params.index);
    state.validate(key)?;

    let lookup = state.cache.lookup(key).await;
    let Some(data) = lookup.data else {
        return Err(ServerError::TileUnavailable {
            level: key.level,
            index: key.index,
        });
    };

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&data).to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (CACHE_HIT_HEADER, lookup.cache_hit.to_string()),
    ];

    Ok((StatusCode::OK, headers, data).into_response())
}

/// Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
