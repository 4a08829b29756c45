// In: src/codec/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Codec Layer
// ====================================================================================
//
// The `codec` is the public entry point for turning phase fields into device data
// and back. It owns no logic of its own: it composes the quantizer, the packer and
// (for electrode-driven devices) the electrode mapper and bit stacker.
//
// Data Flow (Packed buffers):
//
//   PhaseField -> [quantizer::quantize] -> CodeField -> [packer::pack] -> PackedBuffer
//   PackedBuffer -> [packer::unpack] -> CodeField -> [quantizer::dequantize] -> PhaseField
//
// Data Flow (Electrode bitmaps):
//
//   PhaseField -> [quantize] -> CodeField -> [electrode::expand] -> Bitmap
//         `-> optional [electrode::replicate] (one hologram for the whole frame time)
//         `-> or, for many fields, [bitstack::stack] -> BitplaneFrame
//         `-> or, per colour channel, one bitmap each (encode_bitmap_channels)
//
// Every stage is a pure function of its input and a shared, read-only
// `DeviceProfile`. Errors propagate unchanged from the stage that raised them.
//
// ====================================================================================

use ndarray::{Array3, ArrayBase, Axis, Data, Ix2, Ix3};
use num_traits::Float;
use std::sync::Arc;

use crate::bitstack;
use crate::electrode;
use crate::error::PlmError;
use crate::packer;
use crate::profile::DeviceProfile;
use crate::quantizer;
use crate::types::{Bitmap, BitplaneFrame, PackedBuffer, PhaseField};

//==================================================================================
// 1. Stateless API
//==================================================================================

/// Quantizes and packs one phase field into the device's byte layout.
pub fn encode<S, F>(
    phase_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
) -> Result<PackedBuffer, PlmError>
where
    S: Data<Elem = F>,
    F: Float,
{
    let codes = quantizer::quantize(phase_field, profile)?;
    packer::pack(&codes, profile)
}

/// Unpacks a device buffer and maps every code back to its phase.
pub fn decode(bytes: &[u8], profile: &DeviceProfile) -> Result<PhaseField, PlmError> {
    let codes = packer::unpack(bytes, profile)?;
    quantizer::dequantize(&codes, profile)
}

//==================================================================================
// 2. Stateful Facade
//==================================================================================

/// A codec bound to one device. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    profile: Arc<DeviceProfile>,
}

impl FrameCodec {
    pub fn new(profile: impl Into<Arc<DeviceProfile>>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// See [`encode`].
    pub fn encode<S, F>(
        &self,
        phase_field: &ArrayBase<S, Ix2>,
    ) -> Result<PackedBuffer, PlmError>
    where
        S: Data<Elem = F>,
        F: Float,
    {
        encode(phase_field, &self.profile)
    }

    /// See [`decode`].
    pub fn decode(&self, bytes: &[u8]) -> Result<PhaseField, PlmError> {
        decode(bytes, &self.profile)
    }

    /// Quantizes a phase field and expands it to the electrode bitmap.
    ///
    /// With `replicate` set, every cell is spread over all eight bits (0/255) so the
    /// same hologram is shown for the whole frame time.
    pub fn encode_bitmap<S, F>(
        &self,
        phase_field: &ArrayBase<S, Ix2>,
        replicate: bool,
    ) -> Result<Bitmap, PlmError>
    where
        S: Data<Elem = F>,
        F: Float,
    {
        let codes = quantizer::quantize(phase_field, &self.profile)?;
        let bitmap = electrode::expand(&codes, &self.profile)?;
        if replicate {
            Ok(electrode::replicate(&bitmap))
        } else {
            Ok(bitmap)
        }
    }

    /// Encodes a `(channel, row, col)` stack of phase fields, e.g. the colour
    /// channels of an RGB hologram, into one bitmap per channel. The result has
    /// shape `(channels, bitmap_rows, bitmap_cols)`.
    pub fn encode_bitmap_channels<S, F>(
        &self,
        phase_channels: &ArrayBase<S, Ix3>,
        replicate: bool,
    ) -> Result<Array3<u8>, PlmError>
    where
        S: Data<Elem = F>,
        F: Float,
    {
        let channels = phase_channels.len_of(Axis(0));
        if channels == 0 {
            return Err(PlmError::EmptyInput(
                "encode_bitmap_channels needs at least one channel".to_string(),
            ));
        }
        let (rows, cols) = electrode::bitmap_shape(&self.profile)?;
        let mut frames = Array3::<u8>::zeros((channels, rows, cols));
        for (mut slot, channel) in frames.outer_iter_mut().zip(phase_channels.outer_iter()) {
            slot.assign(&self.encode_bitmap(&channel, replicate)?);
        }
        Ok(frames)
    }

    /// Recovers the phase field from a bitmap made by [`FrameCodec::encode_bitmap`],
    /// replicated or not.
    pub fn decode_bitmap<S>(
        &self,
        bitmap: &ArrayBase<S, Ix2>,
    ) -> Result<PhaseField, PlmError>
    where
        S: Data<Elem = u8>,
    {
        let codes = electrode::collapse(bitmap, &self.profile)?;
        quantizer::dequantize(&codes, &self.profile)
    }

    /// Encodes several phase fields as binary bitmaps and stacks them into the
    /// bitplanes of one video frame, in order.
    pub fn encode_bitplanes<S, F>(
        &self,
        phase_fields: &[ArrayBase<S, Ix2>],
    ) -> Result<BitplaneFrame, PlmError>
    where
        S: Data<Elem = F>,
        F: Float,
    {
        let bitmaps = phase_fields
            .iter()
            .map(|field| self.encode_bitmap(field, false))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "encode_bitplanes: {} fields for '{}'",
            bitmaps.len(),
            self.profile.name()
        );
        bitstack::stack(&bitmaps)
    }
}
