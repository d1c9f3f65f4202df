//! Cancellation-safe page loading.
//!
//! One [`PageSlot`] manages the load pipeline for one displayed page: fetch
//! and decode the source, apply the slice rule, reassemble when needed, and
//! publish the result. Loads can be restarted at any time (the reader jumped
//! to another page, the bound source changed); the slot guarantees that only
//! the newest attempt ever mutates what is displayed.
//!
//! # Token protocol
//!
//! Every call to [`PageSlot::start`] increments the slot's token and captures
//! the new value. When an attempt's fetch resolves, it takes the state lock
//! and re-checks the token; a mismatch means a newer attempt owns the slot
//! and the stale result is discarded without a trace. Nothing is aborted at
//! the transport level; cancellation is cooperative and purely by
//! comparison, so completion order never matters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::PageError;
use crate::fetch::PageFetcher;
use crate::page::PageCodec;
use crate::scramble::{is_animated_name, reconstruct, slice_count};

// =============================================================================
// Page Descriptor
// =============================================================================

/// The bound source of a page instance.
///
/// Captured immutably at the start of each load attempt; a later change to
/// the binding produces a new descriptor and a new attempt rather than
/// mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Photo (chapter) identifier, decimal string as received
    pub photo_id: String,

    /// Page filename including extension; `.gif` disables the transform
    pub page_name: String,

    /// Absolute or proxied URL the raster is fetched from
    pub source_url: String,

    /// Scramble epoch id override; `None` uses the baseline epoch
    pub scramble_id: Option<String>,
}

impl PageDescriptor {
    /// Create a descriptor with no scramble epoch override.
    pub fn new(
        photo_id: impl Into<String>,
        page_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            photo_id: photo_id.into(),
            page_name: page_name.into(),
            source_url: source_url.into(),
            scramble_id: None,
        }
    }
}

// =============================================================================
// Status and View
// =============================================================================

/// What state a page slot is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// A load attempt is underway and nothing newer has been published
    Loading,

    /// The decoded raster is displayed untouched (unscrambled or animated)
    ShowingOriginal,

    /// The reassembled raster is displayed
    ShowingReconstructed,

    /// The newest attempt failed; no automatic retry
    Failed,
}

/// Snapshot of what the embedder should display.
#[derive(Debug, Clone)]
pub struct PageView {
    /// Raster to draw, absent while loading or after a failure
    pub raster: Option<Arc<RgbImage>>,

    /// Slot status at snapshot time
    pub status: PageStatus,
}

// =============================================================================
// Raster Source
// =============================================================================

/// Fetch-and-decode primitive supplied by the embedder.
///
/// Given a URL, asynchronously yields a decoded raster or a failure. Must
/// support being issued again for a new URL while prior calls are still
/// unsettled; the slot leans on that to supersede slow loads.
#[async_trait]
pub trait RasterSource: Send + Sync + 'static {
    /// Fetch `url` and decode it into pixels.
    async fn load(&self, url: &str) -> Result<RgbImage, PageError>;
}

/// Production [`RasterSource`] backed by a [`PageFetcher`] and the codec.
pub struct FetchRasterSource<F: PageFetcher> {
    fetcher: Arc<F>,
    codec: PageCodec,
}

impl<F: PageFetcher> FetchRasterSource<F> {
    /// Wrap a shared fetcher.
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            codec: PageCodec::new(),
        }
    }
}

#[async_trait]
impl<F: PageFetcher + 'static> RasterSource for FetchRasterSource<F> {
    async fn load(&self, url: &str) -> Result<RgbImage, PageError> {
        let fetched = self.fetcher.fetch(url).await?;
        Ok(self.codec.decode(&fetched.bytes)?.into_rgb8())
    }
}

// =============================================================================
// Page Slot
// =============================================================================

/// State guarded by the slot lock.
struct SlotState {
    raster: Option<Arc<RgbImage>>,
    status: PageStatus,
}

/// One page's load state with last-start-wins semantics.
///
/// The slot owns a monotonic token counter and the displayed raster. Any
/// number of [`start`](PageSlot::start) calls may be in flight; each one
/// captures the token value it was issued and may only commit its result if
/// that value is still current when the fetch resolves. The check and the
/// commit happen under one lock, so a stale attempt can never interleave
/// with a newer one's publication.
pub struct PageSlot<S: RasterSource> {
    /// Fetch-and-decode collaborator
    source: S,

    /// Monotonic load token; the newest `start` holds the current value
    token: AtomicU64,

    /// Published raster and status
    state: Mutex<SlotState>,
}

impl<S: RasterSource> PageSlot<S> {
    /// Create a slot around a raster source.
    ///
    /// A fresh slot reports [`PageStatus::Loading`] with no raster; nothing
    /// is displayed until the first `start` commits.
    pub fn new(source: S) -> Self {
        Self {
            source,
            token: AtomicU64::new(0),
            state: Mutex::new(SlotState {
                raster: None,
                status: PageStatus::Loading,
            }),
        }
    }

    /// Begin a load attempt for `descriptor`.
    ///
    /// Increments the slot token, voiding every earlier attempt, then
    /// fetches and decodes the source. On resolution the token is re-checked
    /// under the state lock:
    ///
    /// - stale token: the result is discarded silently, whatever it was
    /// - current token, decode ok: the slice rule runs; counts of 0 or 1 and
    ///   animated names publish the raster untouched, anything else
    ///   publishes the reassembled raster
    /// - current token, decode failed: the slot publishes
    ///   [`PageStatus::Failed`] with no raster; no retry is scheduled
    pub async fn start(&self, descriptor: PageDescriptor) {
        // Claim the newest token; all earlier attempts are void from here on
        let token = self.token.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.lock().await;
            // Only mark Loading while still the newest attempt, so a commit
            // that has already happened is not walked back
            if self.token.load(Ordering::SeqCst) == token {
                state.status = PageStatus::Loading;
            }
        }

        let result = self.source.load(&descriptor.source_url).await;

        let mut state = self.state.lock().await;
        if self.token.load(Ordering::SeqCst) != token {
            // Superseded while in flight; completion order is irrelevant
            return;
        }

        match result {
            Ok(raster) => {
                let count = if is_animated_name(&descriptor.page_name) {
                    0
                } else {
                    slice_count(
                        &descriptor.photo_id,
                        descriptor.scramble_id.as_deref(),
                        &descriptor.page_name,
                    )
                };

                if count <= 1 {
                    state.raster = Some(Arc::new(raster));
                    state.status = PageStatus::ShowingOriginal;
                } else {
                    let restored = reconstruct(&raster, count);
                    state.raster = Some(Arc::new(restored));
                    state.status = PageStatus::ShowingReconstructed;
                }
            }
            Err(e) => {
                debug!(url = %descriptor.source_url, error = %e, "page load failed");
                state.raster = None;
                state.status = PageStatus::Failed;
            }
        }
    }

    /// Snapshot the current raster and status.
    pub async fn view(&self) -> PageView {
        let state = self.state.lock().await;
        PageView {
            raster: state.raster.clone(),
            status: state.status,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
