//! Router configuration for the descrambling proxy.
//!
//! This module defines the HTTP routes and applies CORS and tracing
//! middleware.
//!
//! # Route Structure
//!
//! ```text
//! /health                            - Health check
//! /photos/{photo_id}/{image_name}    - Descrambled page endpoint
//! /proxy?url=...                     - Passthrough proxy endpoint
//! ```
//!
//! # Example
//!
//! ```ignore
//! use comic_descrambler::server::routes::{create_router, RouterConfig};
//! use comic_descrambler::page::PageService;
//! use comic_descrambler::fetch::HttpPageFetcher;
//!
//! // Create the page service
//! let fetcher = HttpPageFetcher::new(referer, user_agent, timeout)?;
//! let page_service = PageService::new(fetcher, hosts);
//!
//! // Configure and create router
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(page_service, config);
//!
//! // Run the server
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, page_handler, proxy_handler, AppState};
use crate::config::{DEFAULT_CACHE_MAX_AGE, DEFAULT_PROXY_CACHE_MAX_AGE};
use crate::fetch::PageFetcher;
use crate::page::{PageService, DEFAULT_PAGE_QUALITY};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age for page responses, in seconds
    pub cache_max_age: u32,

    /// Cache-Control max-age for proxied responses, in seconds
    pub proxy_cache_max_age: u32,

    /// JPEG quality used when requests omit the parameter
    pub default_quality: u8,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Page cache max-age is 1 year (pages are immutable once published)
    /// - Proxy cache max-age is 1 day
    /// - JPEG quality defaults to 85
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None, // Allow any origin by default
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            proxy_cache_max_age: DEFAULT_PROXY_CACHE_MAX_AGE,
            default_quality: DEFAULT_PAGE_QUALITY,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the page Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Set the proxy Cache-Control max-age in seconds.
    pub fn with_proxy_cache_max_age(mut self, seconds: u32) -> Self {
        self.proxy_cache_max_age = seconds;
        self
    }

    /// Set the JPEG quality used when requests omit the parameter.
    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.default_quality = quality;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Health check route
/// - Page and proxy routes
/// - CORS configuration
/// - Request tracing (optional)
///
/// # Arguments
///
/// * `page_service` - The page service for handling page requests
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<F>(page_service: PageService<F>, config: RouterConfig) -> Router
where
    F: PageFetcher + 'static,
{
    // Create application state
    let app_state = AppState::with_max_ages(
        page_service,
        config.cache_max_age,
        config.proxy_cache_max_age,
    )
    .with_default_quality(config.default_quality);

    // Build CORS layer
    let cors = build_cors_layer(&config);

    // Build the router
    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/photos/{photo_id}/{image_name}",
            get(page_handler::<F>),
        )
        .route("/proxy", get(proxy_handler::<F>))
        .with_state(app_state)
        .layer(cors);

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Create a router with default configuration.
pub fn create_default_router<F>(page_service: PageService<F>) -> Router
where
    F: PageFetcher + 'static,
{
    create_router(page_service, RouterConfig::new())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            // Parse origins into HeaderValues
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
