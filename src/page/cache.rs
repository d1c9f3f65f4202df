//! Page cache for descrambled page images.
//!
//! This module provides an LRU cache for fully processed pages, preventing
//! repeated fetch/decode/reassemble/encode cycles for frequently requested
//! pages.
//!
//! # Cache Key
//!
//! Pages are cached by a composite key including:
//! - Photo (chapter) identifier
//! - Page image name
//! - Scramble epoch used to derive the slice count
//! - JPEG quality setting
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached page bytes and evicts
//! least-recently-used entries when the capacity is exceeded.

use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;

/// Default cache capacity: 100MB
pub const DEFAULT_PAGE_CACHE_CAPACITY: usize = 100 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for processed pages.
///
/// This key uniquely identifies a page at a specific scramble epoch and
/// quality level. The epoch is part of the key because it changes the slice
/// count, and therefore the reassembled output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCacheKey {
    /// Photo (chapter) identifier as it appeared in the request
    pub photo_id: Arc<str>,

    /// Page image name within the photo (e.g., `00001.webp`)
    pub image_name: Arc<str>,

    /// Scramble epoch used when deriving the slice count
    pub scramble_epoch: i64,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl PageCacheKey {
    /// Create a new cache key.
    pub fn new(
        photo_id: impl Into<Arc<str>>,
        image_name: impl Into<Arc<str>>,
        scramble_epoch: i64,
        quality: u8,
    ) -> Self {
        Self {
            photo_id: photo_id.into(),
            image_name: image_name.into(),
            scramble_epoch,
            quality,
        }
    }
}

// =============================================================================
// Cached Page
// =============================================================================

/// A fully processed page as stored in the cache.
///
/// Hits must be served with the same content type and slice count headers as
/// the original response, so both ride along with the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    /// Final response body (either passthrough bytes or re-encoded JPEG)
    pub bytes: Bytes,

    /// Content type of the response body
    pub content_type: String,

    /// Slice count that was applied (0 or 1 means passthrough)
    pub slice_count: u32,
}

impl CachedPage {
    /// Size of this entry for cache accounting purposes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// =============================================================================
// Page Cache
// =============================================================================

/// LRU cache for processed pages with size-based capacity.
///
/// This cache stores final page bytes and evicts least-recently-used entries
/// when the total cached size exceeds capacity.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
///
/// # Example
///
/// ```
/// use comic_descrambler::page::{CachedPage, PageCache, PageCacheKey};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = PageCache::new();
///
///     let key = PageCacheKey::new("500000", "00001.webp", 220980, 85);
///     let page = CachedPage {
///         bytes: Bytes::from(vec![0xFF, 0xD8, 0xFF, 0xE0]), // JPEG header
///         content_type: "image/jpeg".to_string(),
///         slice_count: 6,
///     };
///
///     // Store page
///     cache.put(key.clone(), page.clone()).await;
///
///     // Retrieve page
///     let cached = cache.get(&key).await;
///     assert_eq!(cached, Some(page));
/// }
/// ```
pub struct PageCache {
    /// The underlying LRU cache
    cache: RwLock<LruCache<PageCacheKey, CachedPage>>,

    /// Maximum total size in bytes
    max_size: usize,

    /// Current total size in bytes
    current_size: RwLock<usize>,
}

impl PageCache {
    /// Create a new page cache with default capacity (100MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PAGE_CACHE_CAPACITY)
    }

    /// Create a new page cache with the specified capacity in bytes.
    ///
    /// # Arguments
    ///
    /// * `max_size` - Maximum total size of cached pages in bytes
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            cache: RwLock::new(LruCache::new(
                std::num::NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap(),
            )),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Create a new page cache with specified capacity and maximum entries.
    ///
    /// # Arguments
    ///
    /// * `max_size` - Maximum total size of cached pages in bytes
    /// * `max_entries` - Maximum number of entries in the cache
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(LruCache::new(
                std::num::NonZeroUsize::new(max_entries).unwrap(),
            )),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Get a page from the cache.
    ///
    /// Returns `Some(page)` if the page is cached, `None` otherwise.
    /// This operation marks the entry as recently used.
    pub async fn get(&self, key: &PageCacheKey) -> Option<CachedPage> {
        let mut cache = self.cache.write().await;
        cache.get(key).cloned()
    }

    /// Check if a page is in the cache without updating LRU order.
    ///
    /// Returns `true` if the page is cached, `false` otherwise.
    pub async fn contains(&self, key: &PageCacheKey) -> bool {
        let cache = self.cache.read().await;
        cache.contains(key)
    }

    /// Store a page in the cache.
    ///
    /// If the cache is over capacity after insertion, least-recently-used
    /// entries are evicted until the cache is within capacity.
    ///
    /// If the page already exists, it is updated and marked as recently used.
    /// A page larger than the entire capacity is refused rather than evicting
    /// every other entry and still not fitting.
    pub async fn put(&self, key: PageCacheKey, page: CachedPage) {
        let page_size = page.size();
        if page_size > self.max_size {
            return;
        }
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        // If key exists, subtract old size first
        if let Some(old_page) = cache.peek(&key) {
            *current_size = current_size.saturating_sub(old_page.size());
        }

        // Insert the new entry
        cache.put(key, page);
        *current_size += page_size;

        // Evict entries until we're under capacity
        while *current_size > self.max_size {
            if let Some((_, evicted)) = cache.pop_lru() {
                *current_size = current_size.saturating_sub(evicted.size());
            } else {
                // Cache is empty, nothing more to evict
                break;
            }
        }
    }

    /// Remove a page from the cache.
    ///
    /// Returns the cached page if it existed, `None` otherwise.
    pub async fn remove(&self, key: &PageCacheKey) -> Option<CachedPage> {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        if let Some(page) = cache.pop(key) {
            *current_size = current_size.saturating_sub(page.size());
            Some(page)
        } else {
            None
        }
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Get the current number of cached pages.
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        let cache = self.cache.read().await;
        cache.is_empty()
    }

    /// Get the current total size of cached pages in bytes.
    pub async fn size(&self) -> usize {
        let current_size = self.current_size.read().await;
        *current_size
    }

    /// Get the maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
