//! HTTP tile endpoint tests.
//!
//! These drive the router through `tower::ServiceExt::oneshot` without
//! binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tile_viewport::server::CACHE_HIT_HEADER;
use tile_viewport::tile::{DirectoryTileSource, TileCache, TileKey};
use tile_viewport::{create_router, RouterConfig};

use super::test_utils::{jpeg_tile, png_tile, scratch_dir, write_tile, MockTileSource};

fn mock_router(source: MockTileSource) -> axum::Router {
    create_router(
        Arc::new(TileCache::new(source)),
        RouterConfig::new(6).with_tracing(false),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_tile_retrieval_success() {
    let router = mock_router(MockTileSource::new());

    let response = router.oneshot(get("/tiles/2/3")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(response.headers().get(CACHE_HIT_HEADER).unwrap(), "false");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body, png_tile(TileKey::new(2, 3)));
}

#[tokio::test]
async fn test_cache_hit_header() {
    let source = MockTileSource::new();
    let router = mock_router(source.clone());

    let first = router.clone().oneshot(get("/tiles/3/5")).await.unwrap();
    assert_eq!(first.headers().get(CACHE_HIT_HEADER).unwrap(), "false");

    let second = router.oneshot(get("/tiles/3/5")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get(CACHE_HIT_HEADER).unwrap(), "true");

    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_invalid_level() {
    let source = MockTileSource::new();
    let router = mock_router(source.clone());

    for uri in ["/tiles/0/0", "/tiles/7/0"] {
        let response = router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_level");
        assert_eq!(json["status"], 400);
    }

    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_index_out_of_range() {
    let source = MockTileSource::new();
    let router = mock_router(source.clone());

    // Level 2 has indices 0..=3
    let response = router.oneshot(get("/tiles/2/4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "index_out_of_range");
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_tile_is_retried() {
    let source = MockTileSource::new();
    let key = TileKey::new(1, 0);
    source.remove(key);
    let router = mock_router(source.clone());

    let response = router.clone().oneshot(get("/tiles/1/0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");

    source.restore(key);
    let response = router.oneshot(get("/tiles/1/0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(source.calls_for(key), 2);
}

#[tokio::test]
async fn test_non_numeric_path_rejected() {
    let router = mock_router(MockTileSource::new());

    let response = router.oneshot(get("/tiles/one/0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = mock_router(MockTileSource::new());

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_any_origin() {
    let router = mock_router(MockTileSource::new());

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://viewer.example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let router = create_router(
        Arc::new(TileCache::new(MockTileSource::new())),
        RouterConfig::new(6)
            .with_cache_max_age(60)
            .with_tracing(false),
    );

    let response = router.oneshot(get("/tiles/1/0")).await.unwrap();
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=60"
    );
}

#[tokio::test]
async fn test_directory_source_behind_router() {
    let root = scratch_dir("router");
    write_tile(&root, TileKey::new(2, 1), "jpg", &jpeg_tile());
    write_tile(&root, TileKey::new(2, 2), "jpg", b"not an image");

    let source = DirectoryTileSource::new(root.clone()).with_extension("jpg");
    let router = create_router(
        Arc::new(TileCache::new(source)),
        RouterConfig::new(3).with_tracing(false),
    );

    let response = router.clone().oneshot(get("/tiles/2/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    // Present but not an image
    let response = router.clone().oneshot(get("/tiles/2/2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Absent
    let response = router.oneshot(get("/tiles/2/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let _ = std::fs::remove_dir_all(&root);
}
