//! A read-only table of known device models.
//!
//! `preset_config` hands out an unvalidated [`ProfileConfig`] so callers can
//! override fields (measured displacement ratios, a custom name) before building.
//! `preset` builds the table entry as-is.

use std::f64::consts::TAU;

use crate::config::{ElectrodeConfig, ProfileConfig};
use crate::error::PlmError;
use crate::profile::DeviceProfile;
use crate::types::{BitOrder, ByteLayout, OutOfDomainPolicy};

struct Preset {
    name: &'static str,
    bit_depth: u8,
    resolution: (usize, usize),
    byte_layout: ByteLayout,
    bit_order: BitOrder,
    out_of_domain: OutOfDomainPolicy,
    pitch: Option<(f64, f64)>,
    displacement_ratios: Option<&'static [f64]>,
    memory_lut: Option<&'static [u32]>,
    electrode_layout: &'static [&'static [u8]],
}

/// Nominal, evenly spaced mirror displacements for a 16-state device.
const NOMINAL_RATIOS_4BIT: [f64; 16] = [
    0.0,
    1.0 / 15.0,
    2.0 / 15.0,
    3.0 / 15.0,
    4.0 / 15.0,
    5.0 / 15.0,
    6.0 / 15.0,
    7.0 / 15.0,
    8.0 / 15.0,
    9.0 / 15.0,
    10.0 / 15.0,
    11.0 / 15.0,
    12.0 / 15.0,
    13.0 / 15.0,
    14.0 / 15.0,
    1.0,
];

const IDENTITY_LUT_4BIT: [u32; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

static PRESETS: &[Preset] = &[
    // 0.67" phase light modulator: 16 phase states, 2x2 electrodes per mirror.
    Preset {
        name: "p67",
        bit_depth: 4,
        resolution: (1358, 800),
        byte_layout: ByteLayout::PackedSubbyte,
        bit_order: BitOrder::MsbFirst,
        out_of_domain: OutOfDomainPolicy::Wrap,
        pitch: Some((10.8e-6, 10.8e-6)),
        displacement_ratios: Some(&NOMINAL_RATIOS_4BIT),
        memory_lut: Some(&IDENTITY_LUT_4BIT),
        electrode_layout: &[&[2, 3], &[0, 1]],
    },
    Preset {
        name: "binary-1bit",
        bit_depth: 1,
        resolution: (1920, 1080),
        byte_layout: ByteLayout::PackedSubbyte,
        bit_order: BitOrder::MsbFirst,
        out_of_domain: OutOfDomainPolicy::Clamp,
        pitch: None,
        displacement_ratios: None,
        memory_lut: None,
        electrode_layout: &[],
    },
    Preset {
        name: "phase-8bit",
        bit_depth: 8,
        resolution: (1920, 1080),
        byte_layout: ByteLayout::PackedSubbyte,
        bit_order: BitOrder::MsbFirst,
        out_of_domain: OutOfDomainPolicy::Wrap,
        pitch: Some((8.0e-6, 8.0e-6)),
        displacement_ratios: None,
        memory_lut: None,
        electrode_layout: &[],
    },
    Preset {
        name: "phase-10bit-be",
        bit_depth: 10,
        resolution: (1920, 1152),
        byte_layout: ByteLayout::BeMultibyte,
        bit_order: BitOrder::MsbFirst,
        out_of_domain: OutOfDomainPolicy::Clamp,
        pitch: Some((9.2e-6, 9.2e-6)),
        displacement_ratios: None,
        memory_lut: None,
        electrode_layout: &[],
    },
    Preset {
        name: "phase-16bit-le",
        bit_depth: 16,
        resolution: (1280, 1024),
        byte_layout: ByteLayout::LeMultibyte,
        bit_order: BitOrder::MsbFirst,
        out_of_domain: OutOfDomainPolicy::Clamp,
        pitch: None,
        displacement_ratios: None,
        memory_lut: None,
        electrode_layout: &[],
    },
];

impl Preset {
    fn to_config(&self) -> ProfileConfig {
        ProfileConfig {
            name: self.name.to_string(),
            phase_range: (0.0, TAU),
            byte_layout: self.byte_layout,
            bit_order: self.bit_order,
            out_of_domain: self.out_of_domain,
            pitch: self.pitch,
            displacement_ratios: self.displacement_ratios.map(<[f64]>::to_vec),
            electrode: self.memory_lut.map(|lut| ElectrodeConfig {
                memory_lut: lut.to_vec(),
                layout: self.electrode_layout.iter().map(|row| row.to_vec()).collect(),
            }),
            ..ProfileConfig::new(self.bit_depth, self.resolution)
        }
    }
}

/// Names of every known preset, in table order.
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

/// Returns the raw parameters of a preset for editing before validation.
pub fn preset_config(name: &str) -> Result<ProfileConfig, PlmError> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .map(Preset::to_config)
        .ok_or_else(|| PlmError::UnknownPreset {
            name: name.to_string(),
            available: preset_names(),
        })
}

/// Builds the validated profile of a preset.
pub fn preset(name: &str) -> Result<DeviceProfile, PlmError> {
    preset_config(name)?.build()
}
