//! Integration tests for the pass-through image proxy route.
//!
//! Tests verify:
//! - Upstream bytes and content type are forwarded untouched
//! - URL validation (missing, unparseable, wrong scheme)
//! - Upstream error mapping

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::test_utils::{create_test_png, test_router, MockPageFetcher};

const HOST: &str = "cdn-a.example.net";
const COVER_URL: &str = "https://img.example.net/covers/412000.png";

// =============================================================================
// Success Path
// =============================================================================

#[tokio::test]
async fn test_proxy_forwards_upstream_bytes() {
    let png = create_test_png(8, 8);
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        COVER_URL.to_string(),
        png.clone(),
        Some("image/png"),
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/proxy?url={}", COVER_URL))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");

    // Proxied images get the shorter cache lifetime
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=86400"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), png);
}

#[tokio::test]
async fn test_proxy_sniffs_missing_content_type() {
    let png = create_test_png(8, 8);
    let fetcher = Arc::new(MockPageFetcher::new().with_page(
        COVER_URL.to_string(),
        png,
        None,
    ));
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/proxy?url={}", COVER_URL))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
}

// =============================================================================
// URL Validation
// =============================================================================

#[tokio::test]
async fn test_proxy_requires_url_param() {
    let fetcher = Arc::new(MockPageFetcher::new());
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri("/proxy")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_proxy_rejects_unparseable_url() {
    let fetcher = Arc::new(MockPageFetcher::new());
    let router = test_router(fetcher.clone(), &[HOST]);

    let request = Request::builder()
        .uri("/proxy?url=notaurl")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "invalid_request");
    assert_eq!(fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_proxy_rejects_non_http_scheme() {
    let fetcher = Arc::new(MockPageFetcher::new());
    let router = test_router(fetcher.clone(), &[HOST]);

    let request = Request::builder()
        .uri("/proxy?url=ftp://img.example.net/covers/412000.png")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "invalid_request");

    // Nothing is forwarded upstream for rejected schemes
    assert_eq!(fetcher.fetch_count(), 0);
}

// =============================================================================
// Upstream Errors
// =============================================================================

#[tokio::test]
async fn test_proxy_upstream_not_found() {
    let fetcher = Arc::new(MockPageFetcher::new());
    let router = test_router(fetcher, &[HOST]);

    let request = Request::builder()
        .uri(format!("/proxy?url={}", COVER_URL))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "not_found");
}
