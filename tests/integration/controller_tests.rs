//! End-to-end viewport scenarios through `ViewportController`.

use std::time::Duration;

use tile_viewport::tile::TileKey;
use tile_viewport::{
    EngineConfig, InputEvent, Point, TileStatus, ViewportController, ZoomMode,
};

use super::test_utils::{png_tile, MockTileSource};

fn level_mode() -> EngineConfig {
    EngineConfig {
        zoom_mode: ZoomMode::Level,
        ..EngineConfig::default()
    }
}

fn wheel(delta: f64) -> InputEvent {
    InputEvent::Wheel { delta }
}

#[tokio::test]
async fn test_pan_fetches_only_new_tiles() {
    let source = MockTileSource::new();
    let mut controller = ViewportController::new(level_mode(), source.clone()).unwrap();
    controller.refresh().await;

    controller.handle_event(wheel(1.0)).await.unwrap();
    let frame = controller.handle_event(wheel(1.0)).await.unwrap();
    assert_eq!(frame.level, 3);
    assert_eq!(frame.scale, 0.25);
    assert_eq!(frame.indices(), vec![0, 1, 4, 5]);
    controller.settle().await;

    controller
        .handle_event(InputEvent::PointerDown { x: 0.0, y: 0.0 })
        .await;
    let frame = controller
        .handle_event(InputEvent::PointerMove { x: 300.0, y: 0.0 })
        .await
        .unwrap();
    assert_eq!(frame.center, Point::new(428.0, 128.0));
    assert_eq!(frame.indices(), vec![1, 2, 5, 6]);
    assert_eq!(frame.count(TileStatus::Ready), 2);

    let frame = controller.settle().await;
    assert!(frame.is_complete());
    assert_eq!(frame.count(TileStatus::Ready), 4);

    assert_eq!(source.calls_for(TileKey::new(3, 1)), 1);
    assert_eq!(source.calls_for(TileKey::new(3, 2)), 1);
    assert_eq!(source.calls_for(TileKey::new(3, 6)), 1);
    assert_eq!(source.calls(), 1 + 4 + 4 + 2);
}

#[tokio::test]
async fn test_pan_round_trip_restores_view() {
    let source = MockTileSource::new();
    let mut controller = ViewportController::new(level_mode(), source.clone()).unwrap();
    controller.handle_event(wheel(1.0)).await;
    controller.handle_event(wheel(1.0)).await;
    let before = controller.settle().await;

    controller
        .handle_event(InputEvent::PointerDown { x: 10.0, y: 10.0 })
        .await;
    controller
        .handle_event(InputEvent::PointerMove { x: 310.0, y: -90.0 })
        .await;
    controller.settle().await;
    let calls = source.calls();

    let after = controller
        .handle_event(InputEvent::PointerMove { x: 10.0, y: 10.0 })
        .await
        .unwrap();
    controller.handle_event(InputEvent::PointerUp).await;

    assert_eq!(after.center, before.center);
    assert_eq!(after.indices(), before.indices());
    assert!(after.is_complete());
    assert_eq!(source.calls(), calls);
}

#[tokio::test]
async fn test_level_ladder_stops_at_max_level() {
    let mut controller = ViewportController::new(level_mode(), MockTileSource::new()).unwrap();

    for expected in 2..=6 {
        let frame = controller.handle_event(wheel(1.0)).await.unwrap();
        assert_eq!(frame.level, expected);
    }

    for _ in 0..3 {
        assert!(controller.handle_event(wheel(1.0)).await.is_none());
        assert_eq!(controller.state().level(), 6);
    }

    controller.settle().await;
}

#[tokio::test]
async fn test_scale_zoom_saturates_at_full_view() {
    let source = MockTileSource::new();
    let mut controller = ViewportController::new(EngineConfig::default(), source.clone()).unwrap();
    let initial = controller.refresh().await;

    for _ in 0..4 {
        assert!(controller.handle_event(wheel(3.0)).await.is_none());
    }
    assert_eq!(controller.state().scale(), initial.scale);

    let frame = controller.handle_event(wheel(-3.0)).await.unwrap();
    assert!(frame.scale < 1.0);
    assert_eq!(frame.level, 1);
    controller.settle().await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_missing_tile_does_not_block_others() {
    let source = MockTileSource::new();
    let broken = TileKey::new(2, 1);
    source.remove(broken);

    let mut controller = ViewportController::new(level_mode(), source.clone()).unwrap();
    controller.handle_event(wheel(1.0)).await.unwrap();
    let frame = controller.settle().await;

    assert_eq!(frame.count(TileStatus::Ready), 3);
    assert_eq!(frame.tiles[1].status, TileStatus::Unavailable);
    assert!(frame.tiles[1].data.is_none());
    assert_eq!(frame.tiles[0].data, Some(png_tile(TileKey::new(2, 0))));

    // Leaving and re-entering the level retries the failed tile
    source.restore(broken);
    controller.handle_event(wheel(-1.0)).await.unwrap();
    controller.handle_event(wheel(1.0)).await.unwrap();
    let frame = controller.settle().await;

    assert_eq!(frame.count(TileStatus::Ready), 4);
    assert_eq!(source.calls_for(broken), 2);
}

#[tokio::test]
async fn test_pending_tiles_reported_until_settled() {
    let source = MockTileSource::new().with_delay(Duration::from_millis(50));
    let mut controller = ViewportController::new(level_mode(), source).unwrap();

    let frame = controller.refresh().await;
    assert_eq!(frame.tiles[0].status, TileStatus::Pending);
    assert!(!frame.is_complete());
    assert_eq!(controller.pending(), 1);

    let update = controller.next_update().await.unwrap();
    assert_eq!(update.key, TileKey::new(1, 0));
    assert!(update.ready);
    assert!(update.visible);
    assert!(controller.next_update().await.is_none());

    let frame = controller.frame().await;
    assert!(frame.is_complete());
}

#[tokio::test]
async fn test_stale_fetch_serves_later_view() {
    let source = MockTileSource::new().with_delay(Duration::from_millis(30));
    let mut controller = ViewportController::new(level_mode(), source.clone()).unwrap();

    controller.refresh().await;
    controller.handle_event(wheel(1.0)).await.unwrap();
    controller.settle().await;

    // Level 1 was fetched for a view that is gone; coming back is a hit
    let frame = controller.handle_event(wheel(-1.0)).await.unwrap();
    assert_eq!(frame.level, 1);
    assert_eq!(frame.tiles[0].status, TileStatus::Ready);
    assert_eq!(source.calls_for(TileKey::new(1, 0)), 1);
    assert_eq!(controller.pending(), 0);
}
