//! Slice geometry for scrambled pages.
//!
//! A page of height `H` cut into `n` slices partitions its rows into `n`
//! contiguous blocks. The first `n - 1` blocks are `H / n` rows tall; the
//! final block absorbs the `H mod n` remainder. Heights always sum to `H`
//! exactly, with no gaps and no overlap, which is the invariant everything
//! downstream relies on.

/// One contiguous band of source pixel rows, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBlock {
    /// First row of the block (inclusive).
    pub start: u32,
    /// One past the last row of the block (exclusive).
    pub end: u32,
}

impl SliceBlock {
    /// Number of rows in the block.
    #[inline]
    pub fn height(&self) -> u32 {
        self.end - self.start
    }
}

/// Partition `height` rows into `count` ordered blocks.
///
/// The final block absorbs the division remainder. For `height < count`
/// the leading blocks degenerate to zero rows and the final block takes
/// everything; no block ever has a negative extent.
///
/// `count == 0` yields an empty partition (no slices means no geometry).
pub fn slice_blocks(height: u32, count: u32) -> Vec<SliceBlock> {
    if count == 0 {
        return Vec::new();
    }

    let base = height / count;
    let mut blocks = Vec::with_capacity(count as usize);
    for i in 0..count - 1 {
        blocks.push(SliceBlock {
            start: base * i,
            end: base * (i + 1),
        });
    }
    blocks.push(SliceBlock {
        start: base * (count - 1),
        end: height,
    });
    blocks
}
