//! Viewer-side page lifecycle.
//!
//! This module owns what happens between "a page exists in the reading
//! list" and "its pixels are on screen": deferred loading behind a
//! visibility gate, cancellation-safe load attempts, and the descrambling
//! step for pages whose source image is sliced.
//!
//! ```text
//!                          +---------------+
//!   scroll position -----> | VisibilityGate |  one-shot, ~300px margin
//!                          +-------+-------+
//!                                  | fires once
//!                                  v
//!   PageDescriptor ------> +---------------+       +--------------+
//!     (photo, page, url)   |   PageSlot    | ----> | RasterSource |
//!                          | token-ordered |       |  (fetch+decode)
//!                          +-------+-------+       +--------------+
//!                                  |
//!                                  v
//!                     original or reconstructed raster
//! ```
//!
//! [`PageInstance`] composes the three: it binds a descriptor, attaches a
//! gate, and routes gate fires and descriptor changes into the slot. The
//! slot discards results from superseded attempts, so rapid descriptor
//! changes never show a stale page.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use comic_descrambler::fetch::HttpPageFetcher;
//! use comic_descrambler::viewer::{FetchRasterSource, PageDescriptor, PageSlot};
//!
//! # async fn example() -> Result<(), comic_descrambler::error::FetchError> {
//! let fetcher = HttpPageFetcher::new(
//!     "https://18comic.vip/".to_string(),
//!     "Mozilla/5.0".to_string(),
//!     Duration::from_secs(30),
//! )?;
//! let slot = PageSlot::new(FetchRasterSource::new(Arc::new(fetcher)));
//!
//! let descriptor = PageDescriptor::new(
//!     "412000",
//!     "00001.webp",
//!     "https://cdn-msp.jmapinodeudzn.net/media/photos/412000/00001.webp",
//! );
//! slot.start(descriptor).await;
//!
//! let view = slot.view().await;
//! println!("status: {:?}", view.status);
//! # Ok(())
//! # }
//! ```

mod gate;
mod instance;
mod session;

pub use gate::{ProximitySignal, VisibilityGate, DEFAULT_VISIBILITY_MARGIN_PX};
pub use instance::PageInstance;
pub use session::{
    FetchRasterSource, PageDescriptor, PageSlot, PageStatus, PageView, RasterSource,
};
