//! The validated, immutable description of one PLM model.
//!
//! A `DeviceProfile` can only be obtained through validation (`DeviceProfile::new`,
//! `ProfileConfig::build`, JSON deserialization or a preset), so every other
//! component may treat its invariants as given:
//!
//! * `1 <= bit_depth <= 32`, and the byte layout has a packing rule for it.
//! * both resolution dimensions are non-zero and the packed size fits in `usize`.
//! * the phase range is finite with `min < max`.
//! * optional displacement ratios and electrode tables are consistent with the
//!   bit depth.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::config::{ElectrodeConfig, ProfileConfig};
use crate::error::PlmError;
use crate::types::{BitOrder, ByteLayout, OutOfDomainPolicy};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "ProfileConfig", into = "ProfileConfig")]
pub struct DeviceProfile {
    config: ProfileConfig,
}

impl DeviceProfile {
    /// Validates `config` and freezes it.
    pub fn new(config: ProfileConfig) -> Result<Self, PlmError> {
        validate_core(&config)?;
        if let Some(ratios) = &config.displacement_ratios {
            validate_displacement_ratios(ratios, config.bit_depth)?;
        }
        if let Some(electrode) = &config.electrode {
            validate_electrode(electrode, config.bit_depth)?;
        }

        log::debug!(
            "Built device profile '{}': {}-bit, {}x{}, layout={}, bit_order={}, policy={}",
            config.name,
            config.bit_depth,
            config.resolution.0,
            config.resolution.1,
            config.byte_layout,
            config.bit_order,
            config.out_of_domain,
        );

        Ok(Self { config })
    }

    /// Parses and validates a profile from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, PlmError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads, parses and validates a profile from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PlmError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, PlmError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns an editable copy of the underlying parameters.
    pub fn to_config(&self) -> ProfileConfig {
        self.config.clone()
    }

    //------------------------------------------------------------------------------
    // Accessors
    //------------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn bit_depth(&self) -> u8 {
        self.config.bit_depth
    }

    pub fn width(&self) -> usize {
        self.config.resolution.0
    }

    pub fn height(&self) -> usize {
        self.config.resolution.1
    }

    /// Array shape of a field for this device, `(rows, cols) = (height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn phase_range(&self) -> (f64, f64) {
        self.config.phase_range
    }

    /// `max - min` of the phase range; the period used by `Wrap`.
    pub fn phase_span(&self) -> f64 {
        self.config.phase_range.1 - self.config.phase_range.0
    }

    pub fn bit_order(&self) -> BitOrder {
        self.config.bit_order
    }

    pub fn byte_layout(&self) -> ByteLayout {
        self.config.byte_layout
    }

    pub fn row_flip(&self) -> bool {
        self.config.row_flip
    }

    pub fn col_flip(&self) -> bool {
        self.config.col_flip
    }

    pub fn out_of_domain(&self) -> OutOfDomainPolicy {
        self.config.out_of_domain
    }

    pub fn pitch(&self) -> Option<(f64, f64)> {
        self.config.pitch
    }

    pub fn displacement_ratios(&self) -> Option<&[f64]> {
        self.config.displacement_ratios.as_deref()
    }

    pub fn electrode(&self) -> Option<&ElectrodeConfig> {
        self.config.electrode.as_ref()
    }

    //------------------------------------------------------------------------------
    // Derived sizes
    //------------------------------------------------------------------------------

    /// Largest representable code, `2^bit_depth - 1`.
    pub fn max_code(&self) -> u32 {
        max_code_for(self.config.bit_depth)
    }

    /// Number of distinct phase states, `2^bit_depth`.
    pub fn level_count(&self) -> u64 {
        1u64 << self.config.bit_depth
    }

    /// Bytes per code in the multibyte layouts, `ceil(bit_depth / 8)`.
    pub fn bytes_per_code(&self) -> usize {
        (self.config.bit_depth as usize).div_ceil(8)
    }

    /// Exact length of the buffer `pack` produces for this profile.
    pub fn packed_len(&self) -> usize {
        if self.config.byte_layout.is_multibyte() {
            self.pixel_count() * self.bytes_per_code()
        } else {
            (self.pixel_count() * self.config.bit_depth as usize).div_ceil(8)
        }
    }
}

impl TryFrom<ProfileConfig> for DeviceProfile {
    type Error = PlmError;

    fn try_from(config: ProfileConfig) -> Result<Self, Self::Error> {
        DeviceProfile::new(config)
    }
}

impl From<DeviceProfile> for ProfileConfig {
    fn from(profile: DeviceProfile) -> Self {
        profile.config
    }
}

pub(crate) fn max_code_for(bit_depth: u8) -> u32 {
    ((1u64 << bit_depth) - 1) as u32
}

//==================================================================================
// Validation
//==================================================================================

fn invalid(msg: impl Into<String>) -> PlmError {
    PlmError::InvalidProfile(msg.into())
}

fn validate_core(config: &ProfileConfig) -> Result<(), PlmError> {
    let bit_depth = config.bit_depth;
    if bit_depth == 0 || bit_depth > 32 {
        return Err(invalid(format!(
            "bit_depth must be in 1..=32, got {}",
            bit_depth
        )));
    }

    let (width, height) = config.resolution;
    if width == 0 || height == 0 {
        return Err(invalid(format!(
            "resolution must have positive dimensions, got {}x{}",
            width, height
        )));
    }

    validate_phase_range(config.phase_range)?;

    if !config.byte_layout.supports(bit_depth) {
        return Err(invalid(format!(
            "byte_layout {} has no packing rule for bit_depth {}",
            config.byte_layout, bit_depth
        )));
    }

    // The packed buffer size must be addressable.
    let fits = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(bit_depth as usize))
        .is_some();
    if !fits {
        return Err(invalid(format!(
            "resolution {}x{} at {} bits overflows the addressable buffer size",
            width, height, bit_depth
        )));
    }

    if let Some((vertical, horizontal)) = config.pitch {
        if !(vertical.is_finite() && horizontal.is_finite() && vertical > 0.0 && horizontal > 0.0)
        {
            return Err(invalid(format!(
                "pitch must be positive, got ({}, {})",
                vertical, horizontal
            )));
        }
    }

    Ok(())
}

fn validate_displacement_ratios(ratios: &[f64], bit_depth: u8) -> Result<(), PlmError> {
    let levels = 1u64 << bit_depth;
    if ratios.len() as u64 != levels {
        return Err(invalid(format!(
            "displacement_ratios needs {} entries for bit_depth {}, got {}",
            levels,
            bit_depth,
            ratios.len()
        )));
    }
    validate_ratio_values(ratios)
}

/// Checks that `ratios` is a non-empty, strictly increasing sequence in `[0, 1]`.
pub(crate) fn validate_ratio_values(ratios: &[f64]) -> Result<(), PlmError> {
    if ratios.is_empty() {
        return Err(invalid("displacement_ratios must not be empty"));
    }
    if let Some(bad) = ratios
        .iter()
        .find(|r| !r.is_finite() || **r < 0.0 || **r > 1.0)
    {
        return Err(invalid(format!(
            "displacement_ratios must lie in [0, 1], found {}",
            bad
        )));
    }
    if !ratios.windows(2).all(|w| w[1] > w[0]) {
        return Err(invalid("displacement_ratios must be strictly increasing"));
    }
    Ok(())
}

/// Checks that a phase range is finite with `min < max`.
pub(crate) fn validate_phase_range((min, max): (f64, f64)) -> Result<(), PlmError> {
    if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
        return Err(invalid(format!(
            "phase_range bounds must be finite, got ({}, {})",
            min, max
        )));
    }
    if min >= max {
        return Err(invalid(format!(
            "phase_range requires min < max, got ({}, {})",
            min, max
        )));
    }
    Ok(())
}

fn validate_electrode(electrode: &ElectrodeConfig, bit_depth: u8) -> Result<(), PlmError> {
    let (rows, cols) = electrode.tile_shape();
    if rows == 0 || cols == 0 {
        return Err(invalid("electrode layout must be a non-empty 2-D grid"));
    }
    if electrode.layout.iter().any(|row| row.len() != cols) {
        return Err(invalid("electrode layout rows must all have the same length"));
    }

    let mut seen_bits = HashSet::new();
    for &bit in electrode.layout.iter().flatten() {
        if bit >= 32 {
            return Err(invalid(format!(
                "electrode layout bit index {} exceeds a 32-bit memory word",
                bit
            )));
        }
        if !seen_bits.insert(bit) {
            return Err(invalid(format!(
                "electrode layout names bit {} more than once",
                bit
            )));
        }
    }

    let levels = 1u64 << bit_depth;
    if electrode.memory_lut.len() as u64 != levels {
        return Err(invalid(format!(
            "memory_lut needs {} entries for bit_depth {}, got {}",
            levels,
            bit_depth,
            electrode.memory_lut.len()
        )));
    }

    let mask = electrode.layout_mask();
    let mut seen_words = HashSet::new();
    for (code, &word) in electrode.memory_lut.iter().enumerate() {
        if word & !mask != 0 {
            return Err(invalid(format!(
                "memory_lut[{}] = {:#x} sets bits with no electrode (layout mask {:#x})",
                code, word, mask
            )));
        }
        if !seen_words.insert(word) {
            return Err(invalid(format!(
                "memory_lut[{}] = {:#x} duplicates an earlier entry",
                code, word
            )));
        }
    }

    Ok(())
}
