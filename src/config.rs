// In: src/config.rs

//! The unvalidated, serializable form of a device profile.
//!
//! A `ProfileConfig` is what a user writes in a JSON document or builds in code:
//! plain public fields with `serde` defaults for every optional setting. It is
//! turned into a validated, immutable [`DeviceProfile`] exactly once, at the
//! application boundary, and the profile is then shared read-only (typically via
//! `Arc<DeviceProfile>`). Nothing downstream re-validates per pixel.
//!
//! Presets hand out a `ProfileConfig` as well, so that individual fields (for
//! example measured displacement ratios) can be overridden before validation.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::PlmError;
use crate::profile::DeviceProfile;
use crate::types::{BitOrder, ByteLayout, OutOfDomainPolicy};

//==================================================================================
// I. Electrode Configuration
//==================================================================================

/// Describes how a phase code is written to the electrodes under one mirror.
///
/// `memory_lut[code]` is the memory word for phase state `code`; the words are
/// typically not monotonic in the code. `layout` is the physical placement of the
/// word's bits under the mirror: `[[2, 3], [0, 1]]` puts bit 2 top-left, bit 3
/// top-right, bit 0 bottom-left and bit 1 bottom-right.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ElectrodeConfig {
    pub memory_lut: Vec<u32>,
    pub layout: Vec<Vec<u8>>,
}

impl ElectrodeConfig {
    /// `(rows, cols)` of the electrode tile under one mirror.
    pub fn tile_shape(&self) -> (usize, usize) {
        (self.layout.len(), self.layout.first().map_or(0, Vec::len))
    }

    /// Bit mask of every memory bit that reaches an electrode.
    pub fn layout_mask(&self) -> u32 {
        self.layout
            .iter()
            .flatten()
            .filter(|&&bit| bit < 32)
            .fold(0u32, |mask, &bit| mask | (1u32 << bit))
    }
}

//==================================================================================
// II. The Profile Configuration
//==================================================================================

/// Raw device parameters. Build a [`DeviceProfile`] with [`ProfileConfig::build`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ProfileConfig {
    /// Human-readable device label.
    #[serde(default)]
    pub name: String,

    /// Bits per pixel phase code.
    pub bit_depth: u8,

    /// Active pixel count as `(width, height)`.
    pub resolution: (usize, usize),

    /// Continuous phase domain `(min, max)` mapped onto code space.
    #[serde(default = "default_phase_range")]
    pub phase_range: (f64, f64),

    #[serde(default)]
    pub bit_order: BitOrder,

    #[serde(default)]
    pub byte_layout: ByteLayout,

    /// Mirror rows before packing (hardware wiring artifact).
    #[serde(default)]
    pub row_flip: bool,

    /// Mirror columns before packing (hardware wiring artifact).
    #[serde(default)]
    pub col_flip: bool,

    #[serde(default)]
    pub out_of_domain: OutOfDomainPolicy,

    /// Mirror pitch as `(vertical, horizontal)` in metres. Informational only.
    #[serde(default)]
    pub pitch: Option<(f64, f64)>,

    /// Normalized mirror displacement for each phase state, strictly increasing in
    /// `[0, 1]`. When present the quantizer snaps to these levels instead of a
    /// uniform grid.
    #[serde(default)]
    pub displacement_ratios: Option<Vec<f64>>,

    /// Memory LUT and electrode layout for the electrode bitmap path.
    #[serde(default)]
    pub electrode: Option<ElectrodeConfig>,
}

impl ProfileConfig {
    /// A config with every optional setting at its default.
    pub fn new(bit_depth: u8, resolution: (usize, usize)) -> Self {
        Self {
            name: String::new(),
            bit_depth,
            resolution,
            phase_range: default_phase_range(),
            bit_order: BitOrder::default(),
            byte_layout: ByteLayout::default(),
            row_flip: false,
            col_flip: false,
            out_of_domain: OutOfDomainPolicy::default(),
            pitch: None,
            displacement_ratios: None,
            electrode: None,
        }
    }

    /// Validates the config and freezes it into a [`DeviceProfile`].
    pub fn build(self) -> Result<DeviceProfile, PlmError> {
        DeviceProfile::new(self)
    }

    /// Parses a config from a JSON document without validating it.
    pub fn from_json(json: &str) -> Result<Self, PlmError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to default the phase range to one full wave, `[0, 2π]`.
fn default_phase_range() -> (f64, f64) {
    (0.0, TAU)
}
