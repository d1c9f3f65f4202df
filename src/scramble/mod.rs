//! Descrambling core.
//!
//! The host cuts comic pages into horizontal slices and reorders them
//! before transmission. This module recovers the original page with no
//! server-provided geometry:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        photo id · epoch · filename      │
//! └────────────────────┬────────────────────┘
//!                      │ segmentation (MD5 fingerprint)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           slice count n (0..=20)        │
//! └────────────────────┬────────────────────┘
//!                      │ layout (row partition)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │      blocks b_0 .. b_{n-1} over [0,H)   │
//! └────────────────────┬────────────────────┘
//!                      │ reconstruct (reverse block copy)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            restored page raster         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`slice_count`]: pure rule mapping identifiers + filename to a count
//! - [`SliceBlock`] / [`slice_blocks`]: row-range partition arithmetic
//! - [`reconstruct`]: reverse-order contiguous block copy
//!
//! Everything here is synchronous and side-effect-free; fetching and
//! serving live elsewhere.

mod layout;
mod reconstruct;
mod segmentation;

pub use layout::{slice_blocks, SliceBlock};
pub use reconstruct::reconstruct;
pub use segmentation::{
    is_animated_name, normalize_scramble_epoch, slice_count, DEFAULT_SCRAMBLE_EPOCH,
    FIXED_SLICE_COUNT, FIXED_SLICE_EPOCH, REDUCED_BUCKET_EPOCH,
};
