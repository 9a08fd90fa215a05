//! `HttpTileSource` against a real loopback server.
//!
//! The server side is the crate's own router over a [`MockTileSource`], so
//! these tests also cover the `{level}/{index}` layout end to end.

use std::net::SocketAddr;
use std::sync::Arc;

use tile_viewport::error::FetchError;
use tile_viewport::tile::{HttpTileSource, TileCache, TileKey, TileSource};
use tile_viewport::{
    create_router, EngineConfig, InputEvent, RouterConfig, TileStatus, ViewportController,
    ZoomMode,
};

use super::test_utils::{png_tile, MockTileSource};

/// Serve the router on an ephemeral port and return its address.
async fn spawn_server(source: MockTileSource, max_level: u32) -> SocketAddr {
    let router = create_router(
        Arc::new(TileCache::new(source)),
        RouterConfig::new(max_level).with_tracing(false),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn http_source(addr: SocketAddr) -> HttpTileSource {
    HttpTileSource::new(&format!("http://{}/tiles", addr)).unwrap()
}

#[tokio::test]
async fn test_retrieve_tile() {
    let addr = spawn_server(MockTileSource::new(), 6).await;
    let source = http_source(addr);

    let key = TileKey::new(3, 9);
    let data = source.retrieve(key).await.unwrap();
    assert_eq!(data, png_tile(key));
}

#[tokio::test]
async fn test_missing_tile_is_not_found() {
    let backend = MockTileSource::new();
    backend.remove(TileKey::new(2, 0));
    let addr = spawn_server(backend, 6).await;
    let source = http_source(addr);

    let err = source.retrieve(TileKey::new(2, 0)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn test_rejected_level_is_status_error() {
    let addr = spawn_server(MockTileSource::new(), 2).await;
    let source = http_source(addr);

    let err = source.retrieve(TileKey::new(3, 0)).await.unwrap_err();
    assert!(
        matches!(err, FetchError::Status { status: 400, .. }),
        "{:?}",
        err
    );
}

#[tokio::test]
async fn test_non_image_payload_is_decode_error() {
    let router = axum::Router::new().route(
        "/text/{level}/{index}",
        axum::routing::get(|| async { "plain text" }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let source = HttpTileSource::new(&format!("http://{}/text/", addr)).unwrap();
    let err = source.retrieve(TileKey::new(1, 0)).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)), "{:?}", err);
}

#[tokio::test]
async fn test_cache_over_http_source() {
    let backend = MockTileSource::new();
    let addr = spawn_server(backend.clone(), 6).await;
    let cache = Arc::new(TileCache::new(http_source(addr)));

    let key = TileKey::new(2, 1);
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.fetch(key).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Some(png_tile(key)));
    }

    assert_eq!(backend.calls_for(key), 1);
    assert_eq!(cache.stats().retrievals, 1);
}

#[tokio::test]
async fn test_controller_over_loopback() {
    let backend = MockTileSource::new();
    let addr = spawn_server(backend.clone(), 6).await;

    let config = EngineConfig {
        zoom_mode: ZoomMode::Level,
        ..EngineConfig::default()
    };
    let mut controller = ViewportController::new(config, http_source(addr)).unwrap();

    controller.refresh().await;
    controller
        .handle_event(InputEvent::Wheel { delta: 120.0 })
        .await
        .unwrap();
    let frame = controller.settle().await;

    assert_eq!(frame.level, 2);
    assert_eq!(frame.indices(), vec![0, 1, 2, 3]);
    assert_eq!(frame.count(TileStatus::Ready), 4);
    assert_eq!(
        frame.tiles[2].data.as_ref(),
        Some(&png_tile(TileKey::new(2, 2)))
    );
    assert_eq!(backend.calls(), 5);
}
