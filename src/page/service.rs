//! Page service for orchestrating page descrambling.
//!
//! The PageService is the main entry point for page requests. It orchestrates:
//! - Request validation
//! - Cache lookups and single-flight de-duplication
//! - Upstream fetch with candidate-host fallback
//! - Slice-count computation and passthrough decisions
//! - Reassembly and JPEG re-encoding
//! - Result caching
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         PageService                              │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_page()                           │    │
//! │  │  1. Validate params   4. Fetch from candidate hosts     │    │
//! │  │  2. Check cache       5. Reassemble + encode            │    │
//! │  │  3. Join in-flight    6. Cache & return                 │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │            │
//! │           ▼                    ▼                    ▼            │
//! │    ┌───────────┐      ┌──────────────┐    ┌──────────────────┐  │
//! │    │ PageCache │      │ PageFetcher  │    │    PageCodec     │  │
//! │    └───────────┘      └──────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Single-flight
//!
//! Concurrent requests for the same page share one upstream fetch. The first
//! request for a key becomes the leader and registers a `Notify` marker; later
//! requests wait on the marker and re-check the cache once it resolves. On
//! failure the marker is cleared without a cache fill, so the next waiter
//! retries from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::error::{FetchError, PageError};
use crate::fetch::{FetchedPage, PageFetcher};
use crate::scramble::{is_animated_name, normalize_scramble_epoch, reconstruct, slice_count};

use super::cache::{CachedPage, PageCache, PageCacheKey};
use super::codec::{
    is_gif, is_valid_quality, sniff_content_type, PageCodec, DEFAULT_PAGE_QUALITY,
    JPEG_CONTENT_TYPE,
};

// =============================================================================
// Page Request
// =============================================================================

/// A request for a descrambled page.
///
/// This struct contains all parameters needed to identify, fetch and restore
/// a page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Photo (chapter) identifier, decimal string as received
    pub photo_id: String,

    /// Page image name within the photo (e.g., `00001.webp`)
    pub image_name: String,

    /// Scramble epoch id override; `None` uses the baseline epoch
    pub scramble_id: Option<String>,

    /// JPEG quality for reassembled output (1-100, defaults to 85)
    pub quality: u8,
}

impl PageRequest {
    /// Create a new page request with default quality.
    pub fn new(photo_id: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            photo_id: photo_id.into(),
            image_name: image_name.into(),
            scramble_id: None,
            quality: DEFAULT_PAGE_QUALITY,
        }
    }

    /// Create a new page request with specified quality.
    pub fn with_quality(
        photo_id: impl Into<String>,
        image_name: impl Into<String>,
        quality: u8,
    ) -> Self {
        Self {
            photo_id: photo_id.into(),
            image_name: image_name.into(),
            scramble_id: None,
            quality,
        }
    }
}

// =============================================================================
// Page Response
// =============================================================================

/// Response from the page service.
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// The final page bytes (passthrough or re-encoded JPEG)
    pub bytes: Bytes,

    /// Content type of the body
    pub content_type: String,

    /// Whether this page was served from cache
    pub cache_hit: bool,

    /// Slice count that was applied (0 or 1 means untouched)
    pub slice_count: u32,
}

// =============================================================================
// Page Service
// =============================================================================

/// Service for restoring and caching scrambled pages.
///
/// The PageService orchestrates the full page pipeline:
/// 1. Validates request parameters
/// 2. Checks the page cache for existing results
/// 3. De-duplicates concurrent identical requests (single-flight)
/// 4. Fetches the page bytes, falling back across candidate hosts
/// 5. Computes the slice count and either passes the bytes through or
///    reassembles and re-encodes them
/// 6. Caches and returns the result
///
/// # Type Parameters
///
/// * `F` - The upstream fetcher type (HTTP in production, mocks in tests)
///
/// # Example
///
/// ```ignore
/// use comic_descrambler::page::{PageService, PageRequest};
///
/// let service = PageService::new(fetcher, hosts);
///
/// let request = PageRequest::new("500000", "00001.webp");
/// let response = service.get_page(request).await?;
///
/// println!("{} bytes, {} slices", response.bytes.len(), response.slice_count);
/// ```
pub struct PageService<F: PageFetcher> {
    /// Upstream byte fetcher
    fetcher: Arc<F>,

    /// Cache for finished pages
    cache: PageCache,

    /// Image decode/encode
    codec: PageCodec,

    /// Candidate CDN hosts, tried in order
    hosts: Vec<String>,

    /// In-flight page builds for the single-flight pattern
    in_flight: Mutex<HashMap<PageCacheKey, Arc<Notify>>>,
}

impl<F: PageFetcher> PageService<F> {
    /// Create a new page service with default cache settings.
    ///
    /// Uses default page cache capacity (100MB).
    pub fn new(fetcher: F, hosts: Vec<String>) -> Self {
        Self::with_shared_fetcher(Arc::new(fetcher), hosts)
    }

    /// Create a new page service around a shared fetcher.
    ///
    /// This allows other components (or tests) to keep a handle on the same
    /// fetcher instance.
    pub fn with_shared_fetcher(fetcher: Arc<F>, hosts: Vec<String>) -> Self {
        Self {
            fetcher,
            cache: PageCache::new(),
            codec: PageCodec::new(),
            hosts,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new page service with custom cache capacity.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The upstream fetcher
    /// * `hosts` - Candidate CDN hosts, tried in order
    /// * `cache_capacity` - Maximum page cache size in bytes
    pub fn with_cache_capacity(fetcher: F, hosts: Vec<String>, cache_capacity: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            cache: PageCache::with_capacity(cache_capacity),
            codec: PageCodec::new(),
            hosts,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get a page, using cache when available.
    ///
    /// This is the main entry point for page requests. Concurrent requests
    /// for the same page share a single upstream fetch and build.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request parameters are invalid
    /// - No candidate host produces the page bytes
    /// - The page bytes cannot be decoded or the result re-encoded
    pub async fn get_page(&self, request: PageRequest) -> Result<PageResponse, PageError> {
        validate_request(&request)?;

        let epoch = normalize_scramble_epoch(request.scramble_id.as_deref());
        let cache_key = PageCacheKey::new(
            request.photo_id.as_str(),
            request.image_name.as_str(),
            epoch,
            request.quality,
        );

        loop {
            // Fast path: check cache
            if let Some(page) = self.cache.get(&cache_key).await {
                return Ok(PageResponse {
                    bytes: page.bytes,
                    content_type: page.content_type,
                    cache_hit: true,
                    slice_count: page.slice_count,
                });
            }

            // Slow path: check in_flight or become leader
            let notify = {
                let mut in_flight = self.in_flight.lock().await;

                if let Some(notify) = in_flight.get(&cache_key) {
                    // Another request is building this page, wait for it
                    let notify = notify.clone();
                    drop(in_flight);
                    notify.notified().await;
                    // Loop back to check cache
                    continue;
                }

                // We're the leader for this page
                let notify = Arc::new(Notify::new());
                in_flight.insert(cache_key.clone(), notify.clone());
                notify
            };

            let result = self.build_page(&request).await;

            // Fill the cache before clearing the marker so woken waiters
            // find the entry; on failure waiters retry as new leaders
            if let Ok(ref page) = result {
                self.cache.put(cache_key.clone(), page.clone()).await;
            }
            {
                let mut in_flight = self.in_flight.lock().await;
                in_flight.remove(&cache_key);
            }
            notify.notify_waiters();

            return result.map(|page| PageResponse {
                bytes: page.bytes,
                content_type: page.content_type,
                cache_hit: false,
                slice_count: page.slice_count,
            });
        }
    }

    /// Fetch and restore a page without consulting the cache.
    async fn build_page(&self, request: &PageRequest) -> Result<CachedPage, PageError> {
        let fetched = self
            .fetch_from_hosts(&request.photo_id, &request.image_name)
            .await?;

        // Animated pages are transmitted intact. Trust the filename but also
        // sniff the bytes, so mislabeled uploads survive.
        let animated = is_animated_name(&request.image_name) || is_gif(&fetched.bytes);
        let count = if animated {
            0
        } else {
            slice_count(
                &request.photo_id,
                request.scramble_id.as_deref(),
                &request.image_name,
            )
        };

        if count <= 1 {
            // Untouched page: byte-identical passthrough, no generation loss
            debug!(
                photo_id = %request.photo_id,
                image_name = %request.image_name,
                slice_count = count,
                "serving page unmodified"
            );
            let content_type = passthrough_content_type(&fetched);
            return Ok(CachedPage {
                bytes: fetched.bytes,
                content_type,
                slice_count: count,
            });
        }

        let decoded = self.codec.decode(&fetched.bytes)?.into_rgb8();
        let restored = reconstruct(&decoded, count);
        let bytes = self.codec.encode_jpeg(&restored, request.quality)?;

        debug!(
            photo_id = %request.photo_id,
            image_name = %request.image_name,
            slice_count = count,
            width = restored.width(),
            height = restored.height(),
            "page reassembled"
        );

        Ok(CachedPage {
            bytes,
            content_type: JPEG_CONTENT_TYPE.to_string(),
            slice_count: count,
        })
    }

    /// Fetch page bytes, trying each candidate host in order.
    ///
    /// The first successful response wins. Individual host failures are
    /// logged and swallowed; only full exhaustion is an error.
    async fn fetch_from_hosts(
        &self,
        photo_id: &str,
        image_name: &str,
    ) -> Result<FetchedPage, FetchError> {
        for host in &self.hosts {
            let url = media_url(host, photo_id, image_name);
            match self.fetcher.fetch(&url).await {
                Ok(page) => {
                    debug!(%url, bytes = page.len(), "fetched page");
                    return Ok(page);
                }
                Err(e) => {
                    warn!(%url, error = %e, "candidate host failed, trying next");
                }
            }
        }

        Err(FetchError::ExhaustedHosts {
            photo_id: photo_id.to_string(),
            image_name: image_name.to_string(),
        })
    }

    /// Fetch an arbitrary image URL through the configured fetcher.
    ///
    /// Used by the pass-through proxy route. The URL must be absolute with
    /// an http or https scheme; nothing else is forwarded upstream.
    pub async fn proxy(&self, url: &str) -> Result<FetchedPage, PageError> {
        let parsed = url::Url::parse(url).map_err(|e| PageError::InvalidRequest {
            reason: format!("invalid proxy url: {e}"),
        })?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(PageError::InvalidRequest {
                reason: format!("unsupported proxy scheme: {scheme}"),
            });
        }

        let page = self.fetcher.fetch(url).await?;
        debug!(%url, bytes = page.len(), "proxied image");
        Ok(page)
    }

    /// Get page cache statistics.
    ///
    /// Returns `(current_size, capacity, entry_count)`.
    pub async fn cache_stats(&self) -> (usize, usize, usize) {
        let size = self.cache.size().await;
        let capacity = self.cache.capacity();
        let count = self.cache.len().await;
        (size, capacity, count)
    }

    /// Clear the page cache.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Build the media URL for a page on a given host.
fn media_url(host: &str, photo_id: &str, image_name: &str) -> String {
    format!(
        "https://{}/media/photos/{}/{}",
        host,
        urlencoding::encode(photo_id),
        urlencoding::encode(image_name)
    )
}

/// Content type for a passthrough response.
///
/// Magic bytes are more trustworthy than the upstream header, so sniffing
/// wins when it recognizes the format.
fn passthrough_content_type(fetched: &FetchedPage) -> String {
    sniff_content_type(&fetched.bytes)
        .map(str::to_string)
        .or_else(|| fetched.content_type.clone())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Reject requests that could never be served before touching upstream.
fn validate_request(request: &PageRequest) -> Result<(), PageError> {
    if request.photo_id.trim().is_empty() {
        return Err(PageError::InvalidRequest {
            reason: "photo_id must not be empty".to_string(),
        });
    }
    if request.image_name.trim().is_empty() {
        return Err(PageError::InvalidRequest {
            reason: "image_name must not be empty".to_string(),
        });
    }
    for segment in [&request.photo_id, &request.image_name] {
        if segment.contains('/') || segment.contains('\\') || segment.contains("..") {
            return Err(PageError::InvalidRequest {
                reason: "path segments must not contain separators".to_string(),
            });
        }
    }
    if !is_valid_quality(request.quality) {
        return Err(PageError::InvalidRequest {
            reason: format!("quality must be between 1 and 100, got {}", request.quality),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
