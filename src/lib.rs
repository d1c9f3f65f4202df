//! # Comic Descrambler
//!
//! A descrambling proxy for comic page images served in scrambled form.
//!
//! This library provides the core functionality for fetching scrambled page
//! images from upstream CDNs, computing the slice layout from the page's
//! digest fingerprint, and reassembling the original image before serving
//! it over HTTP. It also ships the viewer-side primitives for deferred,
//! cancellation-safe page loading.
//!
//! ## Features
//!
//! - **Digest-driven segmentation**: Slice count derived from MD5 of the
//!   photo id and page name, with epoch thresholds matching the host site
//! - **Lossless passthrough**: Unscrambled pages and GIFs are served byte
//!   for byte, with no re-encode
//! - **Host fallback**: Multiple CDN hosts tried in order per fetch
//! - **Caching**: Size-bounded LRU over restored pages, with single-flight
//!   fill so concurrent requests share one upstream fetch
//! - **Viewer core**: Visibility-gated, token-ordered page loading for
//!   embedding in reader UIs
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`scramble`] - Slice-count rule, slice layout and reconstruction
//! - [`fetch`] - Upstream fetcher trait and reqwest implementation
//! - [`page`] - Page service, codec and response cache
//! - [`viewer`] - Visibility gate, load slot and page instance
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use comic_descrambler::fetch::HttpPageFetcher;
//! use comic_descrambler::page::PageService;
//! use comic_descrambler::server::{create_router, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpPageFetcher::new(
//!         "https://18comic.vip/".to_string(),
//!         "Mozilla/5.0".to_string(),
//!         Duration::from_secs(30),
//!     )?;
//!     let service = PageService::new(
//!         fetcher,
//!         vec!["cdn-msp.jmapinodeudzn.net".to_string()],
//!     );
//!
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod page;
pub mod scramble;
pub mod server;
pub mod viewer;

// Re-export commonly used types
pub use config::{Config, DEFAULT_IMAGE_HOSTS, DEFAULT_REFERER};
pub use error::{FetchError, PageError};
pub use fetch::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use page::{
    clamp_quality, is_gif, is_valid_quality, sniff_content_type, CachedPage, PageCache,
    PageCacheKey, PageCodec, PageRequest, PageResponse, PageService, DEFAULT_PAGE_CACHE_CAPACITY,
    DEFAULT_PAGE_QUALITY, JPEG_CONTENT_TYPE, MAX_PAGE_QUALITY, MIN_PAGE_QUALITY,
};
pub use scramble::{
    is_animated_name, normalize_scramble_epoch, reconstruct, slice_blocks, slice_count,
    SliceBlock, DEFAULT_SCRAMBLE_EPOCH, FIXED_SLICE_COUNT, FIXED_SLICE_EPOCH,
    REDUCED_BUCKET_EPOCH,
};
pub use server::{
    create_default_router, create_router, health_handler, page_handler, proxy_handler, AppState,
    ErrorResponse, HealthResponse, PagePathParams, PageQueryParams, ProxyQueryParams,
    RouterConfig,
};
pub use viewer::{
    FetchRasterSource, PageDescriptor, PageInstance, PageSlot, PageStatus, PageView,
    ProximitySignal, RasterSource, VisibilityGate, DEFAULT_VISIBILITY_MARGIN_PX,
};
