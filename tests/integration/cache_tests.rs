//! Integration tests for page caching behavior.
//!
//! Tests verify:
//! - Repeat requests are served from cache without touching upstream
//! - Cache keys separate quality variants and normalize scramble epochs
//! - Concurrent identical requests share one upstream fetch

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::test_utils::{
    create_test_png, fake_gif_bytes, media_url, test_router, MockPageFetcher,
};

const TEN_SLICE_PHOTO: &str = "250000";

const HOST: &str = "cdn-a.example.net";

fn page_request(uri: impl AsRef<str>) -> Request<Body> {
    Request::builder()
        .uri(uri.as_ref())
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Cache Hits
// =============================================================================

#[tokio::test]
async fn test_second_request_hits_cache() {
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        create_test_png(16, 40),
        Some("image/webp"),
    ));
    let router = test_router(fetcher.clone(), &[HOST]);
    let uri = format!("/photos/{}/00001.webp", TEN_SLICE_PHOTO);

    let first = router.clone().oneshot(page_request(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-page-cache-hit").unwrap(), "false");
    let first_body = first.into_body().collect().await.unwrap().to_bytes();

    let second = router.clone().oneshot(page_request(&uri)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-page-cache-hit").unwrap(), "true");
    assert_eq!(second.headers().get("x-page-slices").unwrap(), "10");
    let second_body = second.into_body().collect().await.unwrap().to_bytes();

    // Cached pages are byte-identical and skip the upstream entirely
    assert_eq!(first_body, second_body);
    assert_eq!(fetcher.fetch_count(), 1);
}

#[tokio::test]
async fn test_passthrough_pages_are_cached() {
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.gif"),
        fake_gif_bytes(),
        None,
    ));
    let router = test_router(fetcher.clone(), &[HOST]);
    let uri = format!("/photos/{}/00001.gif", TEN_SLICE_PHOTO);

    let first = router.clone().oneshot(page_request(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router.clone().oneshot(page_request(&uri)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-page-cache-hit").unwrap(), "true");
    assert_eq!(fetcher.fetch_count(), 1);
}

// =============================================================================
// Cache Keys
// =============================================================================

#[tokio::test]
async fn test_quality_variants_are_cached_separately() {
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        create_test_png(16, 40),
        Some("image/webp"),
    ));
    let router = test_router(fetcher.clone(), &[HOST]);
    let base = format!("/photos/{}/00001.webp", TEN_SLICE_PHOTO);

    let first = router.clone().oneshot(page_request(&base)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Different quality means a different cache entry and a fresh build
    let variant = router
        .clone()
        .oneshot(page_request(format!("{}?quality=50", base)))
        .await
        .unwrap();
    assert_eq!(variant.status(), StatusCode::OK);
    assert_eq!(variant.headers().get("x-page-cache-hit").unwrap(), "false");
    assert_eq!(fetcher.fetch_count(), 2);

    // Repeating the variant hits its own entry
    let repeat = router
        .clone()
        .oneshot(page_request(format!("{}?quality=50", base)))
        .await
        .unwrap();
    assert_eq!(repeat.headers().get("x-page-cache-hit").unwrap(), "true");
    assert_eq!(fetcher.fetch_count(), 2);
}

#[tokio::test]
async fn test_explicit_baseline_epoch_shares_cache_entry() {
    // scramble_id=220980 normalizes to the same epoch as no override at
    // all, so both spellings must map to one cache entry.
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        create_test_png(16, 40),
        Some("image/webp"),
    ));
    let router = test_router(fetcher.clone(), &[HOST]);
    let base = format!("/photos/{}/00001.webp", TEN_SLICE_PHOTO);

    let first = router.clone().oneshot(page_request(&base)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let explicit = router
        .clone()
        .oneshot(page_request(format!("{}?scramble_id=220980", base)))
        .await
        .unwrap();
    assert_eq!(explicit.status(), StatusCode::OK);
    assert_eq!(explicit.headers().get("x-page-cache-hit").unwrap(), "true");
    assert_eq!(fetcher.fetch_count(), 1);
}

// =============================================================================
// Single-flight
// =============================================================================

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        create_test_png(16, 40),
        Some("image/webp"),
    ));
    let router = test_router(fetcher.clone(), &[HOST]);
    let uri = format!("/photos/{}/00001.webp", TEN_SLICE_PHOTO);

    let (a, b, c) = tokio::join!(
        router.clone().oneshot(page_request(&uri)),
        router.clone().oneshot(page_request(&uri)),
        router.clone().oneshot(page_request(&uri)),
    );

    let mut bodies = Vec::new();
    for response in [a.unwrap(), b.unwrap(), c.unwrap()] {
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(
            response
                .into_body()
                .collect()
                .await
                .unwrap()
                .to_bytes()
                .to_vec(),
        );
    }

    // However the requests interleave, the page is built exactly once
    assert_eq!(fetcher.fetch_count(), 1);
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}
