//! Electrode bitmap mapping for PLMs that are driven one bitplane at a time.
//!
//! On these devices each mirror sits over a small grid of electrodes. A phase
//! code is first translated through the device's memory LUT into a memory word,
//! and each bit of that word is written to one electrode according to the
//! electrode layout. The result is a binary bitmap that is `layout_rows` times
//! taller and `layout_cols` times wider than the code field. The profile's
//! row/column flips are applied to the finished bitmap.

use ndarray::{Array2, ArrayBase, Data, Ix2};
use std::collections::HashMap;

use crate::config::ElectrodeConfig;
use crate::error::PlmError;
use crate::packer::orient;
use crate::profile::DeviceProfile;
use crate::types::{Bitmap, CodeField};

fn electrode_config(profile: &DeviceProfile) -> Result<&ElectrodeConfig, PlmError> {
    profile.electrode().ok_or_else(|| {
        PlmError::InvalidProfile(format!(
            "profile '{}' has no electrode layout or memory LUT",
            profile.name()
        ))
    })
}

/// Shape of the electrode bitmap for `profile`, `(rows, cols)`.
pub fn bitmap_shape(profile: &DeviceProfile) -> Result<(usize, usize), PlmError> {
    let (tile_rows, tile_cols) = electrode_config(profile)?.tile_shape();
    Ok((profile.height() * tile_rows, profile.width() * tile_cols))
}

/// Expands a code field into the binary electrode bitmap (cells are 0 or 1).
pub fn expand<S>(
    code_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
) -> Result<Bitmap, PlmError>
where
    S: Data<Elem = u32>,
{
    let electrode = electrode_config(profile)?;
    let expected = profile.shape();
    if code_field.dim() != expected {
        return Err(PlmError::shape(expected, code_field.dim()));
    }

    let (tile_rows, tile_cols) = electrode.tile_shape();
    let max_code = profile.max_code();
    let mut bitmap = Array2::<u8>::zeros(bitmap_shape(profile)?);

    for ((row, col), &code) in code_field.indexed_iter() {
        if code > max_code {
            return Err(PlmError::CodeOutOfRange {
                row,
                col,
                code: code as u64,
                max: max_code as u64,
            });
        }
        let word = electrode.memory_lut[code as usize];
        for (i, layout_row) in electrode.layout.iter().enumerate() {
            for (j, &bit) in layout_row.iter().enumerate() {
                bitmap[[row * tile_rows + i, col * tile_cols + j]] = ((word >> bit) & 1) as u8;
            }
        }
    }

    log::trace!(
        "expand: {:?} codes -> {:?} bitmap via {}x{} electrode tiles",
        expected,
        bitmap.dim(),
        tile_rows,
        tile_cols
    );
    Ok(orient(bitmap.view(), profile).as_standard_layout().into_owned())
}

/// Recovers the code field from an electrode bitmap. Any non-zero cell counts as
/// a set bit, so replicated (0/255) bitmaps are accepted.
///
/// # Errors
/// `CodeOutOfRange` if a tile holds a memory word that is not in the LUT; the
/// reported `code` is that memory word.
pub fn collapse<S>(
    bitmap: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
) -> Result<CodeField, PlmError>
where
    S: Data<Elem = u8>,
{
    let electrode = electrode_config(profile)?;
    let expected = bitmap_shape(profile)?;
    if bitmap.dim() != expected {
        return Err(PlmError::shape(expected, bitmap.dim()));
    }

    let inverse_lut: HashMap<u32, u32> = electrode
        .memory_lut
        .iter()
        .enumerate()
        .map(|(code, &word)| (word, code as u32))
        .collect();

    let (tile_rows, tile_cols) = electrode.tile_shape();
    let device_order = orient(bitmap.view(), profile);
    let mut codes = Vec::with_capacity(profile.pixel_count());

    for row in 0..profile.height() {
        for col in 0..profile.width() {
            let mut word = 0u32;
            for (i, layout_row) in electrode.layout.iter().enumerate() {
                for (j, &bit) in layout_row.iter().enumerate() {
                    if device_order[[row * tile_rows + i, col * tile_cols + j]] != 0 {
                        word |= 1 << bit;
                    }
                }
            }
            let code = inverse_lut.get(&word).ok_or(PlmError::CodeOutOfRange {
                row,
                col,
                code: word as u64,
                max: profile.max_code() as u64,
            })?;
            codes.push(*code);
        }
    }

    Array2::from_shape_vec(profile.shape(), codes)
        .map_err(|_| PlmError::shape(expected, bitmap.dim()))
}

/// Replicates each binary cell across all eight bits of its byte (0 -> 0x00,
/// 1 -> 0xFF), so the same hologram is shown for every bitplane of a video frame.
pub fn replicate<S>(bitmap: &ArrayBase<S, Ix2>) -> Bitmap
where
    S: Data<Elem = u8>,
{
    bitmap.mapv(|cell| if cell != 0 { 0xFF } else { 0x00 })
}
