//! HTTP request handlers for the descrambling proxy API.
//!
//! This module contains the Axum handlers for serving restored pages,
//! proxied media, and health checks.
//!
//! # Endpoints
//!
//! - `GET /photos/{photo_id}/{image_name}` - Serve a descrambled page
//! - `GET /proxy?url=...` - Proxy any upstream media URL
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::{DEFAULT_CACHE_MAX_AGE, DEFAULT_PROXY_CACHE_MAX_AGE};
use crate::error::{FetchError, PageError};
use crate::fetch::PageFetcher;
use crate::page::{sniff_content_type, PageRequest, PageService, DEFAULT_PAGE_QUALITY};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the page service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<F: PageFetcher> {
    /// The page service for fetching and restoring pages
    pub page_service: Arc<PageService<F>>,

    /// Cache-Control max-age for page responses, in seconds
    pub cache_max_age: u32,

    /// Cache-Control max-age for proxied responses, in seconds
    pub proxy_cache_max_age: u32,

    /// JPEG quality used when the request does not specify one
    pub default_quality: u8,
}

impl<F: PageFetcher> AppState<F> {
    /// Create a new application state with default cache max-ages.
    pub fn new(page_service: PageService<F>) -> Self {
        Self {
            page_service: Arc::new(page_service),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            proxy_cache_max_age: DEFAULT_PROXY_CACHE_MAX_AGE,
            default_quality: DEFAULT_PAGE_QUALITY,
        }
    }

    /// Create a new application state with custom cache max-ages.
    pub fn with_max_ages(
        page_service: PageService<F>,
        cache_max_age: u32,
        proxy_cache_max_age: u32,
    ) -> Self {
        Self {
            page_service: Arc::new(page_service),
            cache_max_age,
            proxy_cache_max_age,
            default_quality: DEFAULT_PAGE_QUALITY,
        }
    }

    /// Set the JPEG quality used when requests omit the parameter.
    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.default_quality = quality;
        self
    }
}

impl<F: PageFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            page_service: Arc::clone(&self.page_service),
            cache_max_age: self.cache_max_age,
            proxy_cache_max_age: self.proxy_cache_max_age,
            default_quality: self.default_quality,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for page requests.
///
/// Extracted from: `/photos/{photo_id}/{image_name}`
#[derive(Debug, Deserialize)]
pub struct PagePathParams {
    /// Photo (chapter) identifier, decimal string
    pub photo_id: String,

    /// Page image name within the photo (e.g., "00001.webp")
    pub image_name: String,
}

/// Query parameters for page requests.
#[derive(Debug, Deserialize)]
pub struct PageQueryParams {
    /// Scramble epoch id override (defaults to the baseline epoch)
    #[serde(default)]
    pub scramble_id: Option<String>,

    /// JPEG quality for reassembled output (1-100); falls back to the
    /// configured server default
    #[serde(default)]
    pub quality: Option<u8>,
}

/// Query parameters for proxy requests.
#[derive(Debug, Deserialize)]
pub struct ProxyQueryParams {
    /// Absolute http(s) URL to fetch upstream
    pub url: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_request")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
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

/// Convert PageError to HTTP response.
///
/// This implementation logs errors appropriately based on their severity:
/// - Upstream failures surface as 502 and are logged at WARN level (the
///   fault is outside this process)
/// - Local 5xx errors are logged at ERROR level
/// - Client errors are logged at WARN or DEBUG level
impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            // 400 Bad Request - rejected before any upstream work
            PageError::InvalidRequest { reason } => (
                StatusCode::BAD_REQUEST,
                "invalid_request",
                format!("Invalid request: {}", reason),
            ),

            // 404 Not Found - the upstream does not have this page
            PageError::Fetch(FetchError::NotFound(url)) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Page not found: {}", url),
            ),

            PageError::Fetch(FetchError::ExhaustedHosts {
                photo_id,
                image_name,
            }) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!(
                    "No upstream host produced {} for photo {}",
                    image_name, photo_id
                ),
            ),

            // 502 Bad Gateway - the upstream misbehaved
            PageError::Fetch(FetchError::Status { status, url }) => (
                StatusCode::BAD_GATEWAY,
                "upstream_status",
                format!("Upstream returned {} for {}", status, url),
            ),

            PageError::Fetch(FetchError::Request(msg)) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                format!("Upstream request failed: {}", msg),
            ),

            PageError::Fetch(FetchError::Timeout(msg)) => (
                StatusCode::BAD_GATEWAY,
                "upstream_timeout",
                format!("Upstream timed out: {}", msg),
            ),

            // Upstream sent bytes that are not a decodable image
            PageError::Decode(msg) => (
                StatusCode::BAD_GATEWAY,
                "decode_error",
                format!("Failed to decode page: {}", msg),
            ),

            // 500 Internal Server Error - re-encoding is our own work
            PageError::Encode(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encode_error",
                format!("Failed to encode page: {}", msg),
            ),
        };

        // Log errors based on severity
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            // 404s are common and expected
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else if self.is_upstream() {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Upstream error: {}",
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

/// Handle page requests.
///
/// # Endpoint
///
/// `GET /photos/{photo_id}/{image_name}`
///
/// # Path Parameters
///
/// - `photo_id`: Photo (chapter) identifier
/// - `image_name`: Page image name (e.g., "00001.webp")
///
/// # Query Parameters
///
/// - `scramble_id`: Scramble epoch id override (optional)
/// - `quality`: JPEG quality 1-100 for reassembled output (default: 85)
///
/// # Response
///
/// - `200 OK`: Page image, descrambled when the source was sliced
/// - `400 Bad Request`: Invalid photo id, image name or quality
/// - `404 Not Found`: No upstream host has this page
/// - `502 Bad Gateway`: Upstream failure or undecodable upstream bytes
/// - `500 Internal Server Error`: Re-encoding error
///
/// # Headers
///
/// - `Content-Type: image/jpeg` (or the original type for passthrough)
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Page-Cache-Hit: true|false`
/// - `X-Page-Slices: {n}`
pub async fn page_handler<F: PageFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(params): Path<PagePathParams>,
    Query(query): Query<PageQueryParams>,
) -> Result<Response, PageError> {
    let quality = query.quality.unwrap_or(state.default_quality);

    let mut request = PageRequest::with_quality(&params.photo_id, &params.image_name, quality);
    request.scramble_id = query.scramble_id;

    let response = state.page_service.get_page(request).await?;

    // Upstream content types pass through verbatim when decodable as a
    // header value; anything else degrades to a generic binary type
    let content_type = HeaderValue::from_str(&response.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let http_response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        )
        .header("X-Page-Cache-Hit", response.cache_hit.to_string())
        .header("X-Page-Slices", response.slice_count.to_string())
        .body(axum::body::Body::from(response.bytes))
        .unwrap();

    Ok(http_response)
}

/// Handle proxy requests.
///
/// # Endpoint
///
/// `GET /proxy?url=https://...`
///
/// # Query Parameters
///
/// - `url`: Absolute http(s) URL to fetch (required)
///
/// # Response
///
/// - `200 OK`: Upstream body, byte for byte
/// - `400 Bad Request`: Missing, unparseable or non-http(s) URL
/// - `404 Not Found`: Upstream answered 404
/// - `502 Bad Gateway`: Upstream transport failure
///
/// # Headers
///
/// - `Content-Type`: Upstream value, or sniffed from the body
/// - `Cache-Control: public, max-age={proxy_cache_max_age}`
pub async fn proxy_handler<F: PageFetcher + 'static>(
    State(state): State<AppState<F>>,
    Query(query): Query<ProxyQueryParams>,
) -> Result<Response, PageError> {
    let fetched = state.page_service.proxy(&query.url).await?;

    // Prefer the upstream header; sniff the body when it is absent
    let content_type = fetched
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
        .or_else(|| {
            sniff_content_type(&fetched.bytes).map(HeaderValue::from_static)
        })
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let http_response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.proxy_cache_max_age),
        )
        .body(axum::body::Body::from(fetched.bytes))
        .unwrap();

    Ok(http_response)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
