//! Tile Viewport - tile endpoint, viewport replay, and tile lookup.
//!
//! This binary wires the library components to the command line.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_viewport::{
    config::{Cli, Command, ReplayConfig, ServeConfig, TilesConfig},
    server::{create_router, RouterConfig},
    tile::{DirectoryTileSource, HttpTileSource, TileCache},
    InputEvent, RenderFrame, TileGrid, TileSize, ViewportController,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Replay(config) => run_replay(config).await,
        Command::Tiles(config) => run_tiles(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let mut source = DirectoryTileSource::new(config.tiles_dir.clone());
    if let Some(ref extension) = config.extension {
        source = source.with_extension(extension);
    }

    info!("Configuration:");
    info!("  Tiles directory: {}", config.tiles_dir.display());
    if let Some(ref extension) = config.extension {
        info!("  Tile extension: .{}", extension.trim_start_matches('.'));
    }
    info!("  Levels: 1-{}", config.max_level);
    info!("  Cache max-age: {}s", config.cache_max_age);

    let cache = Arc::new(TileCache::new(source));
    let router = create_router(cache, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!("  curl http://{}/tiles/1/0", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(config.max_level)
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Replay Command
// =============================================================================

async fn run_replay(config: ReplayConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let engine = match config.engine.to_config() {
        Ok(engine) => engine,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match HttpTileSource::with_client(client, &config.base_url) {
        Ok(source) => source,
        Err(e) => {
            error!("Invalid base URL {}: {}", config.base_url, e);
            return ExitCode::FAILURE;
        }
    };

    let script = match read_events(&config).await {
        Ok(script) => script,
        Err(e) => {
            error!("Failed to read events from {}: {}", config.events.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut controller = match ViewportController::new(engine, source) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Failed to create viewport: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut frame = controller.refresh().await;
    if config.settle_each {
        frame = controller.settle().await;
    }
    if let Err(e) = print_frame(&frame) {
        error!("Failed to write frame: {}", e);
        return ExitCode::FAILURE;
    }

    for (line_no, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: InputEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                error!("Invalid event on line {}: {}", line_no + 1, e);
                return ExitCode::FAILURE;
            }
        };

        let Some(mut frame) = controller.handle_event(event).await else {
            continue;
        };
        if config.settle_each {
            frame = controller.settle().await;
        }
        if let Err(e) = print_frame(&frame) {
            error!("Failed to write frame: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let frame = controller.settle().await;
    if let Err(e) = print_frame(&frame) {
        error!("Failed to write frame: {}", e);
        return ExitCode::FAILURE;
    }

    let stats = controller.cache().stats();
    info!(
        hits = stats.hits,
        retrievals = stats.retrievals,
        failures = stats.failures,
        coalesced = stats.coalesced,
        "Replay finished"
    );

    ExitCode::SUCCESS
}

/// Read the whole event script from a file or stdin.
async fn read_events(config: &ReplayConfig) -> std::io::Result<String> {
    if config.events_from_stdin() {
        use tokio::io::AsyncReadExt;

        let mut script = String::new();
        tokio::io::stdin().read_to_string(&mut script).await?;
        Ok(script)
    } else {
        tokio::fs::read_to_string(&config.events).await
    }
}

/// Write one frame as a JSON line on stdout.
fn print_frame(frame: &RenderFrame) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string(frame)?);
    Ok(())
}

// =============================================================================
// Tiles Command
// =============================================================================

fn run_tiles(config: TilesConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match lookup_tiles(&config) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Resolve the tiles a view overlaps and render them as pretty JSON.
fn lookup_tiles(config: &TilesConfig) -> Result<String, Box<dyn std::error::Error>> {
    let grid = TileGrid::new(TileSize::new(config.tile_width, config.tile_height)?);
    let default_center = grid.canvas_center(config.level)?;
    let center = tile_viewport::Point::new(
        config.center_x.unwrap_or(default_center.x),
        config.center_y.unwrap_or(default_center.y),
    );

    let rect = grid.viewport_rect(config.level, center, config.scale)?;
    let tiles = grid.intersecting_tiles(config.level, center, config.scale)?;

    let json = serde_json::json!({
        "level": config.level,
        "center": center,
        "scale": config.scale,
        "rect": rect,
        "tiles": tiles,
    });
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so `replay` and `tiles` output stays parseable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_viewport=debug,tower_http=debug"
    } else {
        "tile_viewport=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
