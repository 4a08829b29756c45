//! This module contains the pure, stateless kernels for whole-byte code layouts.
//!
//! Each code occupies `bytes_per_code` bytes, zero-extended, in little- or
//! big-endian byte order. When the device's data lines are wired in reverse
//! (`LsbFirst`), the bits of every output byte are mirrored.

use crate::error::PlmError;
use crate::types::{BitOrder, ByteLayout};

/// Byte order of a multibyte unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Returns the byte order for a multibyte layout, or `None` for sub-byte packing.
    pub fn for_layout(layout: ByteLayout) -> Option<Self> {
        match layout {
            ByteLayout::LeMultibyte => Some(Endianness::Little),
            ByteLayout::BeMultibyte => Some(Endianness::Big),
            ByteLayout::PackedSubbyte => None,
        }
    }
}

fn check_unit(bytes_per_code: usize) -> Result<(), PlmError> {
    if bytes_per_code == 0 || bytes_per_code > 4 {
        return Err(PlmError::InvalidProfile(format!(
            "multibyte units must be 1..=4 bytes, got {}",
            bytes_per_code
        )));
    }
    Ok(())
}

/// Serializes every code in `codes` as a `bytes_per_code`-byte unit.
pub fn encode<I>(
    codes: I,
    output_buf: &mut Vec<u8>,
    bytes_per_code: usize,
    endian: Endianness,
    order: BitOrder,
) -> Result<(), PlmError>
where
    I: IntoIterator<Item = u32>,
{
    check_unit(bytes_per_code)?;
    output_buf.clear();

    for code in codes {
        match endian {
            Endianness::Little => {
                output_buf.extend_from_slice(&code.to_le_bytes()[..bytes_per_code])
            }
            Endianness::Big => {
                output_buf.extend_from_slice(&code.to_be_bytes()[4 - bytes_per_code..])
            }
        }
    }

    if order == BitOrder::LsbFirst {
        output_buf.iter_mut().for_each(|byte| *byte = byte.reverse_bits());
    }
    Ok(())
}

/// Reassembles codes from `input_bytes`. Bits above `bit_width` in each unit are
/// padding and are masked off.
pub fn decode(
    input_bytes: &[u8],
    bytes_per_code: usize,
    bit_width: u8,
    endian: Endianness,
    order: BitOrder,
) -> Result<Vec<u32>, PlmError> {
    check_unit(bytes_per_code)?;
    if input_bytes.len() % bytes_per_code != 0 {
        return Err(PlmError::BufferLengthMismatch {
            expected: input_bytes.len().next_multiple_of(bytes_per_code),
            actual: input_bytes.len(),
        });
    }

    let mask = ((1u64 << bit_width) - 1) as u32;
    let unmirror = |byte: u8| match order {
        BitOrder::MsbFirst => byte,
        BitOrder::LsbFirst => byte.reverse_bits(),
    };

    let codes = input_bytes
        .chunks_exact(bytes_per_code)
        .map(|unit| {
            let fold = |code: u32, &byte: &u8| (code << 8) | unmirror(byte) as u32;
            let code = match endian {
                Endianness::Little => unit.iter().rev().fold(0u32, fold),
                Endianness::Big => unit.iter().fold(0u32, fold),
            };
            code & mask
        })
        .collect();
    Ok(codes)
}
