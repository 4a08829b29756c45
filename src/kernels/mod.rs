//! This module serves as the public API and dispatcher for the pure, stateless
//! packing kernels.
//!
//! It declares the kernel sub-modules and provides one `dispatch_encode` /
//! `dispatch_decode` pair that picks the kernel for a profile's byte layout. The
//! dispatcher is the sole entry point used by the `packer`.

use crate::error::PlmError;
use crate::profile::DeviceProfile;
use crate::types::ByteLayout;

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Several codes per byte, contiguous bit stream.
pub mod bitpack;

/// One code per whole-byte unit, LE or BE.
pub mod multibyte;

use multibyte::Endianness;

//==================================================================================
// 2. Public API (Unified Dispatchers)
//==================================================================================

/// Serializes `codes` (already flipped and in row-major order) per the profile's layout.
pub fn dispatch_encode<I>(
    codes: I,
    output_buf: &mut Vec<u8>,
    profile: &DeviceProfile,
) -> Result<(), PlmError>
where
    I: IntoIterator<Item = u32>,
{
    let layout = profile.byte_layout();
    match Endianness::for_layout(layout) {
        None => bitpack::encode(
            codes,
            profile.pixel_count(),
            output_buf,
            profile.bit_depth(),
            profile.bit_order(),
        ),
        Some(endian) => multibyte::encode(
            codes,
            output_buf,
            profile.bytes_per_code(),
            endian,
            profile.bit_order(),
        ),
    }?;

    log_metric!(
        "event" = "dispatch_encode",
        "layout" = layout,
        "bytes" = output_buf.len()
    );
    Ok(())
}

/// Deserializes a packed buffer into flat, row-major (still flipped) codes.
///
/// The caller is responsible for checking the exact buffer length first.
pub fn dispatch_decode(input_bytes: &[u8], profile: &DeviceProfile) -> Result<Vec<u32>, PlmError> {
    match profile.byte_layout() {
        ByteLayout::PackedSubbyte => bitpack::decode(
            input_bytes,
            profile.pixel_count(),
            profile.bit_depth(),
            profile.bit_order(),
        ),
        layout @ (ByteLayout::LeMultibyte | ByteLayout::BeMultibyte) => {
            let endian = Endianness::for_layout(layout).ok_or_else(|| {
                PlmError::InvalidProfile(format!("{} is not a multibyte layout", layout))
            })?;
            multibyte::decode(
                input_bytes,
                profile.bytes_per_code(),
                profile.bit_depth(),
                endian,
                profile.bit_order(),
            )
        }
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
