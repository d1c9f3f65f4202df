//! Scrambled-page reconstruction.
//!
//! The host transmits pages with their horizontal slices in reversed order.
//! Restoration partitions the received raster into the same blocks the
//! scrambler used and writes them back top-to-bottom in reverse index
//! order: the received bottom slice becomes the output's top slice, and the
//! received top slice ends up at the bottom. Rows inside a slice keep their
//! order; only the order between slices changes.
//!
//! Blocks are full-width row ranges, so in an 8-bit RGB buffer each block
//! is one contiguous byte range and restoration is a handful of
//! `copy_from_slice` calls.

use image::RgbImage;

use super::layout::slice_blocks;

/// Bytes per pixel in the working raster format.
const RGB_BYTES_PER_PIXEL: usize = 3;

/// Rebuild the original page from a scrambled raster.
///
/// The output has the same dimensions as the input and is written in full;
/// nothing from a previous reconstruction survives. Counts of 0 or 1 mean
/// "not scrambled" and return a plain copy (callers short-circuit those
/// before decoding, but the function stays total).
pub fn reconstruct(src: &RgbImage, count: u32) -> RgbImage {
    let (width, height) = src.dimensions();
    if count <= 1 {
        return src.clone();
    }

    let stride = width as usize * RGB_BYTES_PER_PIXEL;
    let blocks = slice_blocks(height, count);

    let mut out = RgbImage::new(width, height);
    let src_buf: &[u8] = src.as_raw();
    let out_buf: &mut [u8] = &mut out;

    let mut dest_row = 0usize;
    for block in blocks.iter().rev() {
        let rows = block.height() as usize;
        if rows == 0 {
            continue;
        }
        let len = rows * stride;
        let src_off = block.start as usize * stride;
        let dst_off = dest_row * stride;
        out_buf[dst_off..dst_off + len].copy_from_slice(&src_buf[src_off..src_off + len]);
        dest_row += rows;
    }

    out
}
