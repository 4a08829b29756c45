//! This module defines the shared traits used across the codec.

/// A mapping between in-domain phase and integer code space.
///
/// Implementations only ever see phase values that the quantizer has already
/// brought inside the profile's phase range (by clamping or wrapping). A code
/// above the profile's `2^bit_depth - 1` is rejected by the quantizer with
/// `PlmError::CodeOutOfRange`.
pub trait PhaseMapping {
    /// Maps an in-domain, finite phase value to its code.
    fn to_code(&self, phase: f64) -> u32;

    /// Maps a code back to the representative phase of its state, or `None` if
    /// the mapping has no state for `code`.
    fn to_phase(&self, code: u32) -> Option<f64>;
}
