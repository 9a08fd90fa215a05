use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::{Id, JoinSet};
use tracing::{debug, error, warn};

use super::events::{InputEvent, RenderFrame, TileStatus, TileUpdate, TileView};
use crate::config::EngineConfig;
use crate::error::{GridError, ViewportError};
use crate::grid::Point;
use crate::tile::{TileCache, TileKey, TileSource};
use crate::viewport::{ViewportState, ZoomMode};

/// Drives a [`ViewportState`] from input events and resolves visible tiles.
///
/// Fetches run as spawned tasks on the current Tokio runtime. They are never
/// cancelled when their tile scrolls out of view; a late result still lands
/// in the cache under its own `(level, index)` key.
///
/// # Example
///
/// ```ignore
/// use tile_viewport::{EngineConfig, HttpTileSource, InputEvent, ViewportController};
///
/// let source = HttpTileSource::new("http://localhost:8000/tiles")?;
/// let mut controller = ViewportController::new(EngineConfig::default(), source)?;
///
/// let frame = controller.refresh().await;
/// controller.handle_event(InputEvent::PointerDown { x: 0.0, y: 0.0 }).await;
/// if let Some(frame) = controller.handle_event(InputEvent::PointerMove { x: 40.0, y: 0.0 }).await {
///     // redraw with frame.tiles
/// }
/// let settled = controller.settle().await;
/// ```
pub struct ViewportController<S> {
    config: EngineConfig,
    state: ViewportState,
    cache: Arc<TileCache<S>>,
    fetches: JoinSet<(TileKey, bool)>,
    /// Key of each running fetch task, for tasks that end without a result
    tasks: HashMap<Id, TileKey>,
    pending: HashSet<TileKey>,
    unavailable: HashSet<TileKey>,
}

impl<S: TileSource + 'static> ViewportController<S> {
    /// Create a controller with its own cache over `source`.
    pub fn new(config: EngineConfig, source: S) -> Result<Self, GridError> {
        Self::with_cache(config, Arc::new(TileCache::new(source)))
    }

    /// Create a controller over an existing cache.
    pub fn with_cache(config: EngineConfig, cache: Arc<TileCache<S>>) -> Result<Self, GridError> {
        let state = ViewportState::new(config.grid())?;
        Ok(Self {
            config,
            state,
            cache,
            fetches: JoinSet::new(),
            tasks: HashMap::new(),
            pending: HashSet::new(),
            unavailable: HashSet::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn cache(&self) -> &Arc<TileCache<S>> {
        &self.cache
    }

    /// Number of fetches started and not yet reported.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Request every visible tile that is neither cached nor in flight and
    /// return the current frame. Previously unavailable tiles are retried.
    pub async fn refresh(&mut self) -> RenderFrame {
        self.request_visible().await;
        self.frame().await
    }

    /// Apply one input event.
    ///
    /// Returns a frame when the view (level, center or scale) changed.
    /// Rejected transitions leave the state unchanged and return `None`.
    pub async fn handle_event(&mut self, event: InputEvent) -> Option<RenderFrame> {
        let next = match self.transition(event)? {
            Ok(next) => next,
            Err(ViewportError::Grid(err)) => {
                error!(error = %err, ?event, "viewport geometry failure");
                return None;
            }
            Err(err) => {
                debug!(error = %err, ?event, "transition rejected");
                return None;
            }
        };

        let view_changed = next.level() != self.state.level()
            || next.center() != self.state.center()
            || next.scale() != self.state.scale();
        let tiles_changed = next.level() != self.state.level()
            || next.visible_tiles() != self.state.visible_tiles();

        self.state = next;

        if tiles_changed {
            self.request_visible().await;
        }

        if view_changed {
            Some(self.frame().await)
        } else {
            None
        }
    }

    fn transition(&self, event: InputEvent) -> Option<Result<ViewportState, ViewportError>> {
        let result = match event {
            InputEvent::PointerDown { x, y } => Ok(self.state.begin_pan(Point::new(x, y))),
            InputEvent::PointerMove { x, y } => self.state.move_pan(Point::new(x, y)),
            InputEvent::PointerUp => Ok(self.state.end_pan()),
            InputEvent::Wheel { delta } => {
                let direction = InputEvent::wheel_direction(delta);
                if direction == 0 {
                    return None;
                }
                match self.config.zoom_mode {
                    ZoomMode::Scale => self.state.zoom(direction, self.config.zoom_sensitivity),
                    ZoomMode::Level => self.state.zoom_level(direction, self.config.max_level),
                }
            }
        };
        Some(result)
    }

    async fn request_visible(&mut self) {
        let level = self.state.level();
        let keys: Vec<TileKey> = self
            .state
            .visible_tiles()
            .iter()
            .map(|&index| TileKey::new(level, index))
            .collect();

        for key in keys {
            if self.pending.contains(&key) || self.cache.contains(&key).await {
                continue;
            }

            self.unavailable.remove(&key);
            self.pending.insert(key);

            let cache = Arc::clone(&self.cache);
            let handle = self.fetches.spawn(async move {
                let ready = cache.fetch(key).await.is_some();
                (key, ready)
            });
            self.tasks.insert(handle.id(), key);
        }

        debug!(level, pending = self.pending.len(), "visible tiles requested");
    }

    /// Wait for the next fetch to finish.
    ///
    /// Returns `None` once no fetches are outstanding.
    pub async fn next_update(&mut self) -> Option<TileUpdate> {
        loop {
            let (id, key, ready) = match self.fetches.join_next_with_id().await? {
                Ok((id, (key, ready))) => (id, key, ready),
                Err(err) => {
                    let Some(&key) = self.tasks.get(&err.id()) else {
                        warn!(error = %err, "tile fetch task failed");
                        continue;
                    };
                    warn!(%key, error = %err, "tile fetch task failed");
                    (err.id(), key, false)
                }
            };

            self.tasks.remove(&id);
            self.pending.remove(&key);
            if !ready {
                self.unavailable.insert(key);
            }
            return Some(TileUpdate {
                key,
                ready,
                visible: self.is_visible(key),
            });
        }
    }

    /// Wait for every outstanding fetch and return the resulting frame.
    pub async fn settle(&mut self) -> RenderFrame {
        while self.next_update().await.is_some() {}
        self.frame().await
    }

    /// Snapshot of the current view for presentation.
    pub async fn frame(&self) -> RenderFrame {
        let level = self.state.level();
        let grid = self.state.grid();
        let mut tiles = Vec::with_capacity(self.state.visible_tiles().len());

        for &index in self.state.visible_tiles() {
            let Ok(origin) = grid.tile_origin(level, index) else {
                continue;
            };
            let key = TileKey::new(level, index);
            let data = self.cache.get(&key).await;
            let status = if data.is_some() {
                TileStatus::Ready
            } else if self.unavailable.contains(&key) && !self.pending.contains(&key) {
                TileStatus::Unavailable
            } else {
                TileStatus::Pending
            };

            tiles.push(TileView {
                index,
                origin,
                status,
                data,
            });
        }

        RenderFrame {
            level,
            center: self.state.center(),
            scale: self.state.scale(),
            panning: self.state.is_panning(),
            tiles,
        }
    }

    fn is_visible(&self, key: TileKey) -> bool {
        key.level == self.state.level() && self.state.visible_tiles().binary_search(&key.index).is_ok()
    }
}

// =============================================================================
// Tests
// =============================================================================
