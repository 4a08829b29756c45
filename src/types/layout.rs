//! This module defines the canonical, type-safe description of a device's
//! physical bit layout and of the quantizer's out-of-domain policy.
//!
//! These enums replace free-form option strings with closed sets that serialize
//! to stable `snake_case` names in profile documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit significance order within a packed byte.
///
/// Codes are always emitted most significant bit first into the bit stream;
/// `BitOrder` decides where that stream lands inside each byte.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// **Default:** Each byte is filled from bit 7 downward. The first code's most
    /// significant bit lands in the highest bit position of the first byte.
    #[default]
    MsbFirst,

    /// Each byte is filled from bit 0 upward. The output is the per-byte bit
    /// mirror of `MsbFirst`, matching devices whose data lines are wired in reverse.
    LsbFirst,
}

/// How codes are laid out across bytes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ByteLayout {
    /// **Default:** Codes of up to 8 bits form one contiguous bit stream. Several
    /// codes share a byte, and a code may straddle a byte boundary. The final byte
    /// is zero-padded.
    #[default]
    PackedSubbyte,

    /// Each code of 8 or more bits occupies `ceil(bit_depth / 8)` bytes, least
    /// significant byte first.
    LeMultibyte,

    /// Each code of 8 or more bits occupies `ceil(bit_depth / 8)` bytes, most
    /// significant byte first.
    BeMultibyte,
}

impl ByteLayout {
    /// Returns `true` if `bit_depth` has a packing rule in this layout.
    pub fn supports(&self, bit_depth: u8) -> bool {
        match self {
            ByteLayout::PackedSubbyte => (1..=8).contains(&bit_depth),
            ByteLayout::LeMultibyte | ByteLayout::BeMultibyte => (8..=32).contains(&bit_depth),
        }
    }

    /// Returns `true` for the whole-byte-per-code layouts.
    pub fn is_multibyte(&self) -> bool {
        matches!(self, ByteLayout::LeMultibyte | ByteLayout::BeMultibyte)
    }
}

/// What the quantizer does with a phase sample outside the profile's phase range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutOfDomainPolicy {
    /// **Default:** Clip to `[min, max]` before scaling.
    #[default]
    Clamp,

    /// Reduce modulo the phase period into `[min, max)`. PLM phase is 2π-periodic,
    /// so a sample at `max` is the same physical state as one at `min`.
    Wrap,

    /// Fail with `PlmError::OutOfDomain`.
    Error,
}

/// Provides the canonical string representation used in profile documents.
impl fmt::Display for BitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitOrder::MsbFirst => write!(f, "msb_first"),
            BitOrder::LsbFirst => write!(f, "lsb_first"),
        }
    }
}

impl fmt::Display for ByteLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteLayout::PackedSubbyte => write!(f, "packed_subbyte"),
            ByteLayout::LeMultibyte => write!(f, "le_multibyte"),
            ByteLayout::BeMultibyte => write!(f, "be_multibyte"),
        }
    }
}

impl fmt::Display for OutOfDomainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfDomainPolicy::Clamp => write!(f, "clamp"),
            OutOfDomainPolicy::Wrap => write!(f, "wrap"),
            OutOfDomainPolicy::Error => write!(f, "error"),
        }
    }
}
