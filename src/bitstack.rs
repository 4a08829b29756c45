//! Bit-plane stacking for binary PLMs fed through a video interface.
//!
//! A 24-bit video frame carries 24 binary holograms: bitmap `k` becomes bit
//! `k % 8` of colour channel `k / 8`. The device then displays the planes one after
//! another within the frame time.

use ndarray::{s, Array3, Axis, Zip};

use crate::error::PlmError;
use crate::types::{Bitmap, BitplaneFrame};

/// Stacks binary bitmaps into a `(channels, rows, cols)` frame with
/// `channels = ceil(bitmaps.len() / 8)`. Any non-zero cell counts as a set bit;
/// unused high bits of the last channel stay zero.
pub fn stack(bitmaps: &[Bitmap]) -> Result<BitplaneFrame, PlmError> {
    let first = bitmaps
        .first()
        .ok_or_else(|| PlmError::EmptyInput("stack needs at least one bitmap".to_string()))?;
    let shape = first.dim();
    if let Some(bad) = bitmaps.iter().find(|bitmap| bitmap.dim() != shape) {
        return Err(PlmError::shape(shape, bad.dim()));
    }

    let channels = bitmaps.len().div_ceil(8);
    let mut frame = Array3::<u8>::zeros((channels, shape.0, shape.1));

    for (k, bitmap) in bitmaps.iter().enumerate() {
        let bit = (k % 8) as u32;
        Zip::from(frame.index_axis_mut(Axis(0), k / 8))
            .and(bitmap)
            .for_each(|plane, &cell| {
                if cell != 0 {
                    *plane |= 1 << bit;
                }
            });
    }

    log::trace!(
        "stack: {} bitmaps of {:?} -> {} channels",
        bitmaps.len(),
        shape,
        channels
    );
    Ok(frame)
}

/// Splits a frame back into `8 * channels` bitmaps of 0/1 cells, in stacking order.
pub fn unstack(frame: &BitplaneFrame) -> Vec<Bitmap> {
    frame
        .outer_iter()
        .flat_map(|channel| (0..8u32).map(move |bit| channel.mapv(|byte| (byte >> bit) & 1)))
        .collect()
}

/// Returns the bitmap at plane `index`, or `None` past the end of the frame.
pub fn plane(frame: &BitplaneFrame, index: usize) -> Option<Bitmap> {
    let channel = index / 8;
    if channel >= frame.len_of(Axis(0)) {
        return None;
    }
    let bit = (index % 8) as u32;
    Some(frame.slice(s![channel, .., ..]).mapv(|byte| (byte >> bit) & 1))
}
