//! The bit packer and unpacker: code fields ⇄ device-ready byte buffers.
//!
//! `pack` is a pure function of `(code_field, profile)`: it applies the profile's
//! row/column flips by reindexing a view, serializes the codes in row-major order
//! and hands them to the layout kernel. `unpack` is its exact structural inverse.
//! Both produce bit-identical results for identical inputs across runs.

use ndarray::{Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};

use crate::error::PlmError;
use crate::kernels;
use crate::profile::DeviceProfile;
use crate::types::{CodeField, PackedBuffer};

/// Applies the profile's row/column mirroring to a view without copying.
///
/// Mirroring is an involution, so the same call also undoes it.
pub(crate) fn orient<'a, A>(
    mut view: ArrayView2<'a, A>,
    profile: &DeviceProfile,
) -> ArrayView2<'a, A> {
    if profile.row_flip() {
        view.invert_axis(Axis(0));
    }
    if profile.col_flip() {
        view.invert_axis(Axis(1));
    }
    view
}

/// Returns the first code above the device maximum, with its index.
fn find_out_of_range<S>(code_field: &ArrayBase<S, Ix2>, max_code: u32) -> Option<PlmError>
where
    S: Data<Elem = u32>,
{
    code_field
        .indexed_iter()
        .find(|(_, code)| **code > max_code)
        .map(|((row, col), &code)| PlmError::CodeOutOfRange {
            row,
            col,
            code: code as u64,
            max: max_code as u64,
        })
}

/// Packs a code field into the device's byte layout.
///
/// # Errors
/// * `ShapeMismatch` if the field shape is not the profile's `(height, width)`.
/// * `CodeOutOfRange` if any code exceeds `2^bit_depth - 1`. The index reported is
///   the index in `code_field`, before any flip.
pub fn pack<S>(
    code_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
) -> Result<PackedBuffer, PlmError>
where
    S: Data<Elem = u32>,
{
    let expected = profile.shape();
    if code_field.dim() != expected {
        return Err(PlmError::shape(expected, code_field.dim()));
    }
    if let Some(err) = find_out_of_range(code_field, profile.max_code()) {
        return Err(err);
    }

    let device_order = orient(code_field.view(), profile);
    let mut output = Vec::with_capacity(profile.packed_len());
    kernels::dispatch_encode(device_order.iter().copied(), &mut output, profile)?;

    debug_assert_eq!(output.len(), profile.packed_len());
    log::trace!(
        "pack: {} codes -> {} bytes ({}, {})",
        profile.pixel_count(),
        output.len(),
        profile.byte_layout(),
        profile.bit_order()
    );
    Ok(PackedBuffer::new(output))
}

/// Unpacks a device buffer back into a code field, undoing the flips.
///
/// # Errors
/// `BufferLengthMismatch` unless `bytes.len()` equals the length `pack` produces
/// for this profile.
pub fn unpack(bytes: &[u8], profile: &DeviceProfile) -> Result<CodeField, PlmError> {
    let expected = profile.packed_len();
    if bytes.len() != expected {
        return Err(PlmError::BufferLengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let flat = kernels::dispatch_decode(bytes, profile)?;
    let device_order = Array2::from_shape_vec(profile.shape(), flat).map_err(|_| {
        PlmError::BufferLengthMismatch {
            expected,
            actual: bytes.len(),
        }
    })?;

    log::trace!("unpack: {} bytes -> {} codes", bytes.len(), profile.pixel_count());
    Ok(orient(device_order.view(), profile)
        .as_standard_layout()
        .into_owned())
}
