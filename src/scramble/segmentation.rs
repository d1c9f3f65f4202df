//! Slice-count rule for scrambled comic pages.
//!
//! The host cuts each page into horizontal slices and reorders them before
//! transmission. How many slices were used is never sent to the client; it
//! is recomputed from the photo id, the scramble epoch id, and the page
//! filename. Both sides run the same arithmetic over the same MD5 digest,
//! which is what makes serverless restoration possible.
//!
//! # Design Decisions
//!
//! - **Fail open**: an unparseable photo id yields a slice count of 0, i.e.
//!   the page is treated as unscrambled. Garbage input must never make a
//!   page undisplayable.
//!
//! - **Opaque epochs**: the three id thresholds below are calibration values
//!   observed from the host. They carry no derivable meaning; do not try to
//!   compute them from anything else.

use md5::{Digest, Md5};

/// Scramble epoch substituted when the request carries no usable epoch id.
/// Photo ids below the effective epoch predate the scrambling scheme.
pub const DEFAULT_SCRAMBLE_EPOCH: i64 = 220_980;

/// Photo ids below this threshold (but at or past the epoch) are always cut
/// into [`FIXED_SLICE_COUNT`] slices.
pub const FIXED_SLICE_EPOCH: i64 = 268_850;

/// Photo ids above this threshold draw from the reduced bucket (mod 8,
/// counts in 2..=16). Ids between [`FIXED_SLICE_EPOCH`] and this value
/// inclusive use the wide bucket (mod 10, counts in 2..=20).
pub const REDUCED_BUCKET_EPOCH: i64 = 421_926;

/// Slice count applied to the fixed-count id range.
pub const FIXED_SLICE_COUNT: u32 = 10;

// =============================================================================
// Slice-count rule
// =============================================================================

/// Compute the number of horizontal slices a page was scrambled into.
///
/// Pure and deterministic: the same `(photo_id, scramble_id, page_name)`
/// always yields the same count, with no I/O and no hidden state.
///
/// # Arguments
///
/// * `photo_id` - Decimal photo (chapter) id as received, possibly garbage
/// * `scramble_id` - Decimal scramble epoch id; `None`, non-numeric, and
///   non-positive values all fall back to [`DEFAULT_SCRAMBLE_EPOCH`]
/// * `page_name` - Page filename including extension, e.g. `00012.webp`
///
/// # Returns
///
/// `0` or `1` means the page is served as-is; `n >= 2` means the page must
/// be restored from `n` slices.
pub fn slice_count(photo_id: &str, scramble_id: Option<&str>, page_name: &str) -> u32 {
    let Ok(photo_id) = photo_id.trim().parse::<i64>() else {
        // Fail open: treat as unscrambled.
        return 0;
    };

    let epoch = normalize_scramble_epoch(scramble_id);

    if photo_id < epoch {
        return 0;
    }
    if photo_id < FIXED_SLICE_EPOCH {
        return FIXED_SLICE_COUNT;
    }

    bucketed_count(photo_id, fingerprint_value(photo_id, page_name))
}

/// Resolve the effective scramble epoch for a request.
///
/// Absent, non-numeric, and non-positive epoch ids all normalize to
/// [`DEFAULT_SCRAMBLE_EPOCH`]. Exposed so callers keying caches on the epoch
/// agree with [`slice_count`] about which epoch actually applied.
pub fn normalize_scramble_epoch(scramble_id: Option<&str>) -> i64 {
    scramble_id
        .and_then(|id| id.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .unwrap_or(DEFAULT_SCRAMBLE_EPOCH)
}

/// True for page names the host never scrambles.
///
/// A `.gif` suffix (case-insensitive) marks an animated page; those are
/// transmitted intact and must bypass reassembly regardless of what
/// [`slice_count`] would return.
pub fn is_animated_name(page_name: &str) -> bool {
    page_name.trim().to_ascii_lowercase().ends_with(".gif")
}

/// Map a digest fingerprint value to a slice count for the given id range.
///
/// Kept separate from the digest so the bucket arithmetic can be exercised
/// against fixed fingerprint values.
fn bucketed_count(photo_id: i64, fingerprint: u32) -> u32 {
    let modulus = if photo_id > REDUCED_BUCKET_EPOCH {
        8
    } else {
        10
    };
    (fingerprint % modulus) * 2 + 2
}

/// Last hex character of `md5(photo_id ++ page_name)` as a value in 0..=15.
fn fingerprint_value(photo_id: i64, page_name: &str) -> u32 {
    let digest = Md5::digest(format!("{photo_id}{page_name}"));
    let hex = hex::encode(digest);
    hex.chars()
        .next_back()
        .and_then(|c| c.to_digit(16))
        .unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
