//! Integration tests for the descrambling pipeline behind the page route.
//!
//! Tests verify:
//! - Animated pages bypass the pipeline (by name and by magic bytes)
//! - Undecodable bytes fail open for untouched pages, fail closed otherwise
//! - Candidate-host fallback ordering
//! - Scramble epoch overrides via query parameter

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::test_utils::{
    create_test_png, fake_gif_bytes, media_url, test_router, MockPageFetcher,
};

const UNSCRAMBLED_PHOTO: &str = "200000";
const TEN_SLICE_PHOTO: &str = "250000";

const HOST: &str = "cdn-a.example.net";
const FALLBACK_HOST: &str = "cdn-b.example.net";

// =============================================================================
// Animated Page Passthrough
// =============================================================================

#[tokio::test]
async fn test_gif_extension_bypasses_descrambling() {
    let gif = fake_gif_bytes();
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.gif"),
        gif.clone(),
        None,
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.gif", TEN_SLICE_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/gif");
    assert_eq!(response.headers().get("x-page-slices").unwrap(), "0");

    // Animated pages must never be re-encoded
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), gif);
}

#[tokio::test]
async fn test_gif_magic_bypasses_descrambling() {
    // Mislabeled upload: .webp name, GIF bytes. The sniffer must win.
    let gif = fake_gif_bytes();
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        gif.clone(),
        None,
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", TEN_SLICE_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/gif");
    assert_eq!(response.headers().get("x-page-slices").unwrap(), "0");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), gif);
}

// =============================================================================
// Undecodable Bytes
// =============================================================================

#[tokio::test]
async fn test_unscrambled_garbage_passes_through() {
    // Untouched pages are never decoded, so bytes we cannot parse still
    // flow to the client unchanged.
    let garbage = b"definitely not an image".to_vec();
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, UNSCRAMBLED_PHOTO, "00001.webp"),
        garbage.clone(),
        None,
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", UNSCRAMBLED_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), garbage);
}

#[tokio::test]
async fn test_garbage_passthrough_keeps_upstream_content_type() {
    // When sniffing fails, the upstream header is the next best answer.
    let garbage = b"<html>not found page from a confused cdn</html>".to_vec();
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, UNSCRAMBLED_PHOTO, "00001.webp"),
        garbage,
        Some("text/html"),
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", UNSCRAMBLED_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/html");
}

#[tokio::test]
async fn test_scrambled_garbage_is_decode_error() {
    // A page that must be reassembled cannot fail open
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        b"definitely not an image".to_vec(),
        Some("image/webp"),
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", TEN_SLICE_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "decode_error");
}

// =============================================================================
// Host Fallback
// =============================================================================

#[tokio::test]
async fn test_fallback_to_second_host() {
    // Page only exists on the second candidate host
    let png = create_test_png(12, 24);
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(FALLBACK_HOST, UNSCRAMBLED_PHOTO, "00001.webp"),
        png.clone(),
        None,
    ));
    let router = test_router(fetcher.clone(), &[HOST, FALLBACK_HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", UNSCRAMBLED_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), png);

    // Both hosts were tried, in order, exactly once each
    assert_eq!(
        fetcher
            .request_count(&media_url(HOST, UNSCRAMBLED_PHOTO, "00001.webp"))
            .await,
        1
    );
    assert_eq!(
        fetcher
            .request_count(&media_url(FALLBACK_HOST, UNSCRAMBLED_PHOTO, "00001.webp"))
            .await,
        1
    );
}

#[tokio::test]
async fn test_first_host_wins_when_available() {
    let png = create_test_png(12, 24);
    let mut fetcher = MockPageFetcher::new();
    for host in [HOST, FALLBACK_HOST] {
        fetcher = fetcher.with_page(
            media_url(host, UNSCRAMBLED_PHOTO, "00001.webp"),
            png.clone(),
            None,
        );
    }
    let fetcher = Arc::new(fetcher);
    let router = test_router(fetcher.clone(), &[HOST, FALLBACK_HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", UNSCRAMBLED_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The fallback host is never consulted
    assert_eq!(fetcher.fetch_count(), 1);
    assert_eq!(
        fetcher
            .request_count(&media_url(FALLBACK_HOST, UNSCRAMBLED_PHOTO, "00001.webp"))
            .await,
        0
    );
}

#[tokio::test]
async fn test_all_hosts_exhausted_is_not_found() {
    let fetcher = Arc::new(MockPageFetcher::new());
    let router = test_router(fetcher.clone(), &[HOST, FALLBACK_HOST]);

    let request = Request::builder()
        .uri(format!("/photos/{}/00001.webp", UNSCRAMBLED_PHOTO))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "not_found");

    // Every candidate host was tried before giving up
    assert_eq!(fetcher.fetch_count(), 2);
}

// =============================================================================
// Scramble Epoch Overrides
// =============================================================================

#[tokio::test]
async fn test_scramble_id_override_disables_descrambling() {
    // With the epoch raised above the photo id, the photo predates
    // scrambling and must pass through untouched.
    let png = create_test_png(16, 40);
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        png.clone(),
        None,
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!(
            "/photos/{}/00001.webp?scramble_id=300000",
            TEN_SLICE_PHOTO
        ))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-page-slices").unwrap(), "0");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), png);
}

#[tokio::test]
async fn test_non_numeric_scramble_id_uses_baseline() {
    // Junk overrides fall back to the baseline epoch, so a photo in the
    // ten-slice era still gets descrambled.
    let png = create_test_png(16, 40);
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        media_url(HOST, TEN_SLICE_PHOTO, "00001.webp"),
        png,
        Some("image/webp"),
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!(
            "/photos/{}/00001.webp?scramble_id=banana",
            TEN_SLICE_PHOTO
        ))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-page-slices").unwrap(), "10");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
}
