//! This module contains the pure, stateless kernels for sub-byte bit-packing and
//! unpacking of phase codes.
//!
//! Codes are emitted most significant bit first into one contiguous bit stream;
//! a code may straddle a byte boundary when the bit width does not divide 8. The
//! device's bit order only decides where the stream lands inside each byte:
//! `Msb0` fills a byte from bit 7 downward, `Lsb0` from bit 0 upward. The final
//! byte is zero-padded and the padding is ignored on decode.

use bitvec::order::{BitOrder as BitvecOrder, Lsb0, Msb0};
use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use bitvec::view::BitView;

use crate::error::PlmError;
use crate::types::BitOrder;

//==================================================================================
// 1. Generic Core Logic (The "Engine")
//==================================================================================

/// Writes `codes` into a zero-initialized bit stream of exactly `num_values * bit_width` bits.
fn encode_stream<O, I>(codes: I, num_values: usize, bit_width: u8) -> BitVec<u8, O>
where
    O: BitvecOrder,
    I: IntoIterator<Item = u32>,
{
    let width = bit_width as usize;
    // `repeat` allocates whole zeroed bytes, so the dead bits of the last byte are 0.
    let mut bits = BitVec::<u8, O>::repeat(false, num_values * width);

    for (slot, code) in bits.chunks_exact_mut(width).zip(codes) {
        debug_assert!(u64::from(code) < (1u64 << bit_width));
        slot.clone_from_bitslice(&code.view_bits::<Msb0>()[32 - width..]);
    }

    bits
}

/// Reads `num_values` codes of `bit_width` bits each back out of a bit stream.
fn decode_stream<O>(bits: &BitSlice<u8, O>, num_values: usize, bit_width: u8) -> Vec<u32>
where
    O: BitvecOrder,
{
    bits.chunks_exact(bit_width as usize)
        .take(num_values)
        .map(|chunk| {
            chunk
                .iter()
                .by_vals()
                .fold(0u32, |code, bit| (code << 1) | bit as u32)
        })
        .collect()
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Number of bytes needed for `num_values` codes of `bit_width` bits.
pub fn packed_len(num_values: usize, bit_width: u8) -> usize {
    (num_values * bit_width as usize).div_ceil(8)
}

/// Packs `num_values` codes from `codes` into `output_buf`.
pub fn encode<I>(
    codes: I,
    num_values: usize,
    output_buf: &mut Vec<u8>,
    bit_width: u8,
    order: BitOrder,
) -> Result<(), PlmError>
where
    I: IntoIterator<Item = u32>,
{
    if bit_width == 0 || bit_width > 8 {
        return Err(PlmError::InvalidProfile(format!(
            "sub-byte packing requires a bit width in 1..=8, got {}",
            bit_width
        )));
    }

    output_buf.clear();
    match order {
        BitOrder::MsbFirst => {
            let bits = encode_stream::<Msb0, _>(codes, num_values, bit_width);
            output_buf.extend_from_slice(bits.as_raw_slice());
        }
        BitOrder::LsbFirst => {
            let bits = encode_stream::<Lsb0, _>(codes, num_values, bit_width);
            output_buf.extend_from_slice(bits.as_raw_slice());
        }
    }
    Ok(())
}

/// Unpacks `num_values` codes from `input_bytes`. Padding bits after the last code
/// are ignored.
pub fn decode(
    input_bytes: &[u8],
    num_values: usize,
    bit_width: u8,
    order: BitOrder,
) -> Result<Vec<u32>, PlmError> {
    if bit_width == 0 || bit_width > 8 {
        return Err(PlmError::InvalidProfile(format!(
            "sub-byte packing requires a bit width in 1..=8, got {}",
            bit_width
        )));
    }
    let expected = packed_len(num_values, bit_width);
    if input_bytes.len() < expected {
        return Err(PlmError::BufferLengthMismatch {
            expected,
            actual: input_bytes.len(),
        });
    }

    let codes = match order {
        BitOrder::MsbFirst => {
            decode_stream(BitSlice::<u8, Msb0>::from_slice(input_bytes), num_values, bit_width)
        }
        BitOrder::LsbFirst => {
            decode_stream(BitSlice::<u8, Lsb0>::from_slice(input_bytes), num_values, bit_width)
        }
    };
    Ok(codes)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_bit_msb_first() {
        let codes = vec![0u32, 1, 0, 1, 0, 1, 0, 1];
        let mut out = Vec::new();
        encode(codes.iter().copied(), codes.len(), &mut out, 1, BitOrder::MsbFirst).unwrap();
        assert_eq!(out, vec![0x55]);
    }

    #[test]
    fn test_one_bit_lsb_first() {
        let codes = vec![0u32, 1, 0, 1, 0, 1, 0, 1];
        let mut out = Vec::new();
        encode(codes.iter().copied(), codes.len(), &mut out, 1, BitOrder::LsbFirst).unwrap();
        assert_eq!(out, vec![0xAA]);
    }

    #[test]
    fn test_nibbles_msb_first() {
        let codes = vec![0x1u32, 0x2, 0xA, 0xF];
        let mut out = Vec::new();
        encode(codes.iter().copied(), codes.len(), &mut out, 4, BitOrder::MsbFirst).unwrap();
        assert_eq!(out, vec![0x12, 0xAF]);
    }

    #[test]
    fn test_lsb_first_is_byte_mirror_of_msb_first() {
        let codes = vec![5u32, 2, 7, 0, 3, 6, 1];
        let mut msb = Vec::new();
        let mut lsb = Vec::new();
        encode(codes.iter().copied(), codes.len(), &mut msb, 3, BitOrder::MsbFirst).unwrap();
        encode(codes.iter().copied(), codes.len(), &mut lsb, 3, BitOrder::LsbFirst).unwrap();
        let mirrored: Vec<u8> = msb.iter().map(|b| b.reverse_bits()).collect();
        assert_eq!(lsb, mirrored);
    }

    #[test]
    fn test_straddling_codes_roundtrip() {
        // 3-bit codes cross byte boundaries.
        let codes = vec![5u32, 6, 7, 1, 0, 4, 2, 3, 7];
        for order in [BitOrder::MsbFirst, BitOrder::LsbFirst] {
            let mut out = Vec::new();
            encode(codes.iter().copied(), codes.len(), &mut out, 3, order).unwrap();
            assert_eq!(out.len(), 4); // 27 bits
            let decoded = decode(&out, codes.len(), 3, order).unwrap();
            assert_eq!(decoded, codes);
        }
    }

    #[test]
    fn test_final_byte_is_zero_padded() {
        // Three 1-bit ones: MSB-first leaves the low five bits clear,
        // LSB-first leaves the high five bits clear.
        let codes = vec![1u32, 1, 1];
        let mut out = Vec::new();
        encode(codes.iter().copied(), 3, &mut out, 1, BitOrder::MsbFirst).unwrap();
        assert_eq!(out, vec![0b1110_0000]);
        encode(codes.iter().copied(), 3, &mut out, 1, BitOrder::LsbFirst).unwrap();
        assert_eq!(out, vec![0b0000_0111]);
    }

    #[test]
    fn test_decode_ignores_padding_bits() {
        let decoded = decode(&[0b1111_1111], 3, 1, BitOrder::MsbFirst).unwrap();
        assert_eq!(decoded, vec![1, 1, 1]);
    }

    #[test]
    fn test_decode_truncated_buffer_error() {
        let result = decode(&[0xFF], 3, 4, BitOrder::MsbFirst);
        assert!(matches!(
            result,
            Err(PlmError::BufferLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
