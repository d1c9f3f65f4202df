//! Page service layer.
//!
//! This module provides page restoration and caching functionality for
//! serving descrambled comic pages over HTTP.
//!
//! # Architecture
//!
//! The page service sits between the HTTP layer and the upstream fetcher:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Page Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  PageCache   │  │   PageCodec     │  │
//! │  │  (finished   │  │  (decode →      │  │
//! │  │   pages)     │  │   reassemble →  │  │
//! │  │              │  │   encode)       │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        PageFetcher (CDN hosts)          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`PageService`]: Main entry point for page requests, orchestrates the full pipeline
//! - [`PageCache`]: LRU cache for finished pages with size-based eviction
//! - [`PageCacheKey`]: Composite key for page identification (photo, name, epoch, quality)
//! - [`PageCodec`]: Decodes fetched bytes and re-encodes reassembled pages as JPEG
//! - [`PageRequest`]: Parameters for a page request
//! - [`PageResponse`]: Response containing page bytes and metadata
//!
//! # Example
//!
//! ```
//! use comic_descrambler::page::{CachedPage, PageCache, PageCacheKey};
//! use bytes::Bytes;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create a cache with 50MB capacity
//!     let cache = PageCache::with_capacity(50 * 1024 * 1024);
//!
//!     // Create a cache key
//!     let key = PageCacheKey::new("500000", "00001.webp", 220980, 85);
//!
//!     // Check cache before building the page
//!     if let Some(cached) = cache.get(&key).await {
//!         // Use cached page
//!         println!("Cache hit: {} bytes", cached.bytes.len());
//!     } else {
//!         // Build the page and cache it
//!         let page = CachedPage {
//!             bytes: Bytes::from(vec![/* JPEG data */]),
//!             content_type: "image/jpeg".to_string(),
//!             slice_count: 6,
//!         };
//!         cache.put(key, page).await;
//!     }
//! }
//! ```

mod cache;
mod codec;
mod service;

pub use cache::{CachedPage, PageCache, PageCacheKey, DEFAULT_PAGE_CACHE_CAPACITY};
pub use codec::{
    clamp_quality, is_gif, is_valid_quality, sniff_content_type, PageCodec, DEFAULT_PAGE_QUALITY,
    JPEG_CONTENT_TYPE, MAX_PAGE_QUALITY, MIN_PAGE_QUALITY,
};
pub use service::{PageRequest, PageResponse, PageService};
