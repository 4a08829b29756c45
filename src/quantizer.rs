//! This module contains the pure, stateless kernels that map continuous phase
//! samples onto a device's integer code space and back.
//!
//! Two mappings are provided:
//!
//! * [`LinearMapping`] rescales the phase range uniformly onto
//!   `[0, 2^bit_depth - 1]` with round-half-to-even, so there is no systematic bias.
//! * [`LevelMapping`] snaps to the device's measured mirror displacement levels
//!   when the profile carries `displacement_ratios`. Samples past the last level's
//!   bucket wrap to level 0, since phase is 2π-periodic.
//!
//! Samples outside the phase range are first brought into the domain according to
//! the [`OutOfDomainPolicy`]. Non-finite samples are rejected under every policy.

use ndarray::{Array2, ArrayBase, Data, Ix2};
use num_traits::Float;

use crate::error::PlmError;
use crate::profile::{validate_phase_range, validate_ratio_values, DeviceProfile};
use crate::traits::PhaseMapping;
use crate::types::{CodeField, OutOfDomainPolicy, PhaseField};

//==================================================================================
// 1. Mappings
//==================================================================================

/// Uniform mapping of `[min, max]` onto `[0, 2^bit_depth - 1]`.
#[derive(Debug, Clone, Copy)]
pub struct LinearMapping {
    min: f64,
    span: f64,
    max_code: u32,
}

impl LinearMapping {
    pub fn new(profile: &DeviceProfile) -> Self {
        Self {
            min: profile.phase_range().0,
            span: profile.phase_span(),
            max_code: profile.max_code(),
        }
    }
}

impl PhaseMapping for LinearMapping {
    fn to_code(&self, phase: f64) -> u32 {
        let top = self.max_code as f64;
        let scaled = (phase - self.min) / self.span * top;
        // The clamp only absorbs floating-point overshoot at the range ends.
        scaled.round_ties_even().clamp(0.0, top) as u32
    }

    fn to_phase(&self, code: u32) -> Option<f64> {
        (code <= self.max_code).then(|| self.min + code as f64 / self.max_code as f64 * self.span)
    }
}

/// Nearest-level mapping onto measured displacement levels.
///
/// For `n` levels with ratios `r_k`, the level phases are
/// `p_k = min + r_k * (n - 1) / n * (max - min)`, followed by `p_n = max`. The full
/// displacement range thus covers one level less than the period, and the slot
/// between the top level and `max` belongs to level 0 of the next period. Bucket
/// edges sit halfway between neighbouring level phases.
#[derive(Debug, Clone)]
pub struct LevelMapping {
    phases: Vec<f64>,
    edges: Vec<f64>,
}

impl LevelMapping {
    /// Builds the mapping for `ratios` over `phase_range`.
    ///
    /// # Errors
    /// `InvalidProfile` unless `ratios` is non-empty, strictly increasing and inside
    /// `[0, 1]`, and `phase_range` is finite with `min < max`.
    pub fn new(phase_range: (f64, f64), ratios: &[f64]) -> Result<Self, PlmError> {
        validate_phase_range(phase_range)?;
        validate_ratio_values(ratios)?;
        Ok(Self::from_validated(phase_range, ratios))
    }

    fn from_validated(phase_range: (f64, f64), ratios: &[f64]) -> Self {
        let (min, max) = phase_range;
        let n = ratios.len() as f64;
        let scale = (n - 1.0) / n * (max - min);

        let mut phases: Vec<f64> = ratios.iter().map(|r| min + r * scale).collect();
        phases.push(max);
        let edges = phases.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
        phases.pop();

        Self { phases, edges }
    }

    /// Returns the level mapping for `profile`, if it defines displacement levels.
    pub fn for_profile(profile: &DeviceProfile) -> Option<Self> {
        profile
            .displacement_ratios()
            .map(|ratios| Self::from_validated(profile.phase_range(), ratios))
    }

    /// Representative phase of each level.
    pub fn level_phases(&self) -> &[f64] {
        &self.phases
    }
}

impl PhaseMapping for LevelMapping {
    fn to_code(&self, phase: f64) -> u32 {
        let bucket = self.edges.partition_point(|&edge| edge <= phase);
        (bucket % self.phases.len()) as u32
    }

    fn to_phase(&self, code: u32) -> Option<f64> {
        self.phases.get(code as usize).copied()
    }
}

//==================================================================================
// 2. Domain Policy
//==================================================================================

/// Brings one sample into `[min, max]`. Returns the in-domain value and whether it
/// had to be adjusted.
fn bring_into_domain(
    value: f64,
    (row, col): (usize, usize),
    (min, max): (f64, f64),
    policy: OutOfDomainPolicy,
) -> Result<(f64, bool), PlmError> {
    let out_of_domain = || PlmError::OutOfDomain {
        row,
        col,
        value,
        min,
        max,
    };

    if !value.is_finite() {
        return Err(out_of_domain());
    }

    match policy {
        OutOfDomainPolicy::Clamp => {
            let clamped = value.clamp(min, max);
            Ok((clamped, clamped != value))
        }
        OutOfDomainPolicy::Wrap => {
            let mut wrapped = min + (value - min).rem_euclid(max - min);
            // `rem_euclid` can round up to the full period for tiny negative offsets.
            if wrapped >= max {
                wrapped = min;
            }
            Ok((wrapped, wrapped != value))
        }
        OutOfDomainPolicy::Error => {
            if value < min || value > max {
                Err(out_of_domain())
            } else {
                Ok((value, false))
            }
        }
    }
}

//==================================================================================
// 3. Public API
//==================================================================================

/// Quantizes `phase_field` using the profile's own out-of-domain policy.
pub fn quantize<S, F>(
    phase_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
) -> Result<CodeField, PlmError>
where
    S: Data<Elem = F>,
    F: Float,
{
    quantize_with(phase_field, profile, profile.out_of_domain())
}

/// Quantizes `phase_field` with an explicit out-of-domain policy, e.g. to retry
/// with `Clamp` after an `Error` policy rejected a frame.
pub fn quantize_with<S, F>(
    phase_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
    policy: OutOfDomainPolicy,
) -> Result<CodeField, PlmError>
where
    S: Data<Elem = F>,
    F: Float,
{
    match LevelMapping::for_profile(profile) {
        Some(levels) => quantize_with_mapping(phase_field, profile, policy, &levels),
        None => quantize_with_mapping(phase_field, profile, policy, &LinearMapping::new(profile)),
    }
}

/// Quantizes `phase_field` through a caller-supplied mapping.
pub fn quantize_with_mapping<S, F, M>(
    phase_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
    policy: OutOfDomainPolicy,
    mapping: &M,
) -> Result<CodeField, PlmError>
where
    S: Data<Elem = F>,
    F: Float,
    M: PhaseMapping + ?Sized,
{
    let expected = profile.shape();
    if phase_field.dim() != expected {
        return Err(PlmError::shape(expected, phase_field.dim()));
    }

    let range = profile.phase_range();
    let max_code = profile.max_code();
    let mut adjusted = 0usize;
    let mut codes = Vec::with_capacity(profile.pixel_count());

    for (index, sample) in phase_field.indexed_iter() {
        let value = sample.to_f64().unwrap_or(f64::NAN);
        let (phase, was_adjusted) = bring_into_domain(value, index, range, policy)?;
        adjusted += was_adjusted as usize;

        let code = mapping.to_code(phase);
        if code > max_code {
            let (row, col) = index;
            return Err(PlmError::CodeOutOfRange {
                row,
                col,
                code: code as u64,
                max: max_code as u64,
            });
        }
        codes.push(code);
    }

    if adjusted > 0 {
        log::debug!(
            "quantize: {} of {} samples were outside [{}, {}] and were adjusted ({})",
            adjusted,
            codes.len(),
            range.0,
            range.1,
            policy
        );
    }
    log_metric!("event" = "quantize", "pixels" = codes.len(), "adjusted" = adjusted);

    Array2::from_shape_vec(expected, codes)
        .map_err(|_| PlmError::shape(expected, phase_field.dim()))
}

/// Maps codes back to the representative phase of each state.
///
/// This is the exact inverse of the mapping, so `dequantize(quantize(x))` differs
/// from an in-range `x` by at most one code step.
pub fn dequantize<S>(
    code_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
) -> Result<PhaseField, PlmError>
where
    S: Data<Elem = u32>,
{
    match LevelMapping::for_profile(profile) {
        Some(levels) => dequantize_with_mapping(code_field, profile, &levels),
        None => dequantize_with_mapping(code_field, profile, &LinearMapping::new(profile)),
    }
}

/// Maps codes back to phase through a caller-supplied mapping.
pub fn dequantize_with_mapping<S, M>(
    code_field: &ArrayBase<S, Ix2>,
    profile: &DeviceProfile,
    mapping: &M,
) -> Result<PhaseField, PlmError>
where
    S: Data<Elem = u32>,
    M: PhaseMapping + ?Sized,
{
    let expected = profile.shape();
    if code_field.dim() != expected {
        return Err(PlmError::shape(expected, code_field.dim()));
    }

    let max_code = profile.max_code();
    let mut phases = Vec::with_capacity(profile.pixel_count());
    for ((row, col), &code) in code_field.indexed_iter() {
        let phase = (code <= max_code)
            .then(|| mapping.to_phase(code))
            .flatten()
            .ok_or(PlmError::CodeOutOfRange {
                row,
                col,
                code: code as u64,
                max: max_code as u64,
            })?;
        phases.push(phase);
    }

    Array2::from_shape_vec(expected, phases)
        .map_err(|_| PlmError::shape(expected, code_field.dim()))
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use ndarray::array;
    use std::f64::consts::TAU;

    fn profile(
        bit_depth: u8,
        width: usize,
        range: (f64, f64),
        policy: OutOfDomainPolicy,
    ) -> DeviceProfile {
        ProfileConfig {
            phase_range: range,
            out_of_domain: policy,
            ..ProfileConfig::new(bit_depth, (width, 1))
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_binary_quantization() {
        let p = profile(1, 8, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let phases = array![[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]];
        let codes = quantize(&phases, &p).unwrap();
        assert_eq!(codes, array![[0u32, 1, 0, 1, 0, 1, 0, 1]]);
    }

    #[test]
    fn test_round_half_to_even() {
        // 2-bit over [0, 3]: the code equals the phase, so halves expose the tie rule.
        let p = profile(2, 4, (0.0, 3.0), OutOfDomainPolicy::Clamp);
        let phases = array![[0.5, 1.5, 2.5, 1.4999]];
        let codes = quantize(&phases, &p).unwrap();
        assert_eq!(codes, array![[0u32, 2, 2, 1]]);
    }

    #[test]
    fn test_clamp_policy() {
        let p = profile(8, 3, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let codes = quantize(&array![[-5.0, 0.5, 7.0]], &p).unwrap();
        assert_eq!(codes, array![[0u32, 128, 255]]);
    }

    #[test]
    fn test_wrap_policy_full_period_is_zero() {
        let p = profile(8, 4, (0.0, TAU), OutOfDomainPolicy::Wrap);
        let codes = quantize(&array![[0.0, TAU, 2.0 * TAU, -TAU]], &p).unwrap();
        assert_eq!(codes, array![[0u32, 0, 0, 0]]);
    }

    #[test]
    fn test_wrap_policy_reduces_modulo_period() {
        let p = profile(2, 2, (0.0, 3.0), OutOfDomainPolicy::Wrap);
        // 4.0 wraps to 1.0, -1.0 wraps to 2.0
        let codes = quantize(&array![[4.0, -1.0]], &p).unwrap();
        assert_eq!(codes, array![[1u32, 2]]);
    }

    #[test]
    fn test_error_policy_reports_index() {
        let p = profile(4, 3, (0.0, 1.0), OutOfDomainPolicy::Error);
        let result = quantize(&array![[0.0, 1.0, 2.0]], &p);
        match result {
            Err(PlmError::OutOfDomain { row, col, value, .. }) => {
                assert_eq!((row, col), (0, 2));
                assert_eq!(value, 2.0);
            }
            other => panic!("Expected OutOfDomain, got {:?}", other),
        }
    }

    #[test]
    fn test_policy_override_retries_with_clamp() {
        let p = profile(4, 1, (0.0, 1.0), OutOfDomainPolicy::Error);
        let field = array![[2.0]];
        assert!(quantize(&field, &p).is_err());
        let codes = quantize_with(&field, &p, OutOfDomainPolicy::Clamp).unwrap();
        assert_eq!(codes, array![[15u32]]);
    }

    #[test]
    fn test_non_finite_rejected_under_clamp() {
        let p = profile(4, 2, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let result = quantize(&array![[0.5, f64::NAN]], &p);
        assert!(matches!(result, Err(PlmError::OutOfDomain { col: 1, .. })));
    }

    #[test]
    fn test_accepts_f32_fields() {
        let p = profile(8, 2, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let codes = quantize(&array![[0.0f32, 1.0f32]], &p).unwrap();
        assert_eq!(codes, array![[0u32, 255]]);
    }

    #[test]
    fn test_shape_mismatch() {
        let p = profile(4, 3, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let result = quantize(&array![[0.0, 1.0]], &p);
        assert!(matches!(
            result,
            Err(PlmError::ShapeMismatch {
                expected: (1, 3),
                actual: (1, 2)
            })
        ));
    }

    #[test]
    fn test_dequantize_is_affine_inverse() {
        let p = profile(2, 4, (-1.0, 2.0), OutOfDomainPolicy::Clamp);
        let phases = dequantize(&array![[0u32, 1, 2, 3]], &p).unwrap();
        assert_eq!(phases, array![[-1.0, 0.0, 1.0, 2.0]]);
    }

    #[test]
    fn test_dequantize_rejects_out_of_range_code() {
        let p = profile(2, 2, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let result = dequantize(&array![[3u32, 4]], &p);
        assert!(matches!(
            result,
            Err(PlmError::CodeOutOfRange { col: 1, code: 4, max: 3, .. })
        ));
    }

    #[test]
    fn test_level_mapping_snaps_to_levels() {
        let ratios = vec![0.0, 0.1, 0.3, 0.45, 0.6, 0.7, 0.85, 1.0];
        let p = ProfileConfig {
            displacement_ratios: Some(ratios.clone()),
            ..ProfileConfig::new(3, (8, 1))
        }
        .build()
        .unwrap();
        let levels = LevelMapping::for_profile(&p).unwrap();
        assert_eq!(levels.level_phases().len(), 8);

        // Every level phase quantizes back to its own code.
        let field = Array2::from_shape_vec((1, 8), levels.level_phases().to_vec()).unwrap();
        let codes = quantize(&field, &p).unwrap();
        assert_eq!(codes, array![[0u32, 1, 2, 3, 4, 5, 6, 7]]);

        // And dequantize returns exactly the level phases.
        let phases = dequantize(&codes, &p).unwrap();
        assert_eq!(phases, field);
    }

    #[test]
    fn test_level_mapping_wraps_top_bucket() {
        // 4 levels over [0, 4): phases 0, 0.75, 1.5, 3.0 (r * 3/4 * 4).
        let p = ProfileConfig {
            phase_range: (0.0, 4.0),
            displacement_ratios: Some(vec![0.0, 0.25, 0.5, 1.0]),
            ..ProfileConfig::new(2, (3, 1))
        }
        .build()
        .unwrap();
        // 3.9 is past the edge between level 3 (3.0) and max (4.0), so it wraps.
        let codes = quantize(&array![[3.9, 3.4, 0.2]], &p).unwrap();
        assert_eq!(codes, array![[0u32, 3, 0]]);
    }

    /// Maps every phase to a fixed code, regardless of the profile.
    struct FixedCode(u32);

    impl PhaseMapping for FixedCode {
        fn to_code(&self, _phase: f64) -> u32 {
            self.0
        }

        fn to_phase(&self, code: u32) -> Option<f64> {
            Some(code as f64)
        }
    }

    #[test]
    fn test_mapping_code_above_max_is_an_error() {
        let p = profile(2, 2, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let field = array![[0.5, 0.5]];
        let result = quantize_with_mapping(&field, &p, p.out_of_domain(), &FixedCode(99));
        assert!(matches!(
            result,
            Err(PlmError::CodeOutOfRange {
                row: 0,
                col: 0,
                code: 99,
                max: 3
            })
        ));
    }

    #[test]
    fn test_level_mapping_rejects_bad_ratios() {
        for ratios in [&[][..], &[0.0, 0.5, 0.5][..], &[0.0, 1.5][..], &[f64::NAN][..]] {
            assert!(
                matches!(
                    LevelMapping::new((0.0, 1.0), ratios),
                    Err(PlmError::InvalidProfile(_))
                ),
                "{:?} should be rejected",
                ratios
            );
        }
        assert!(matches!(
            LevelMapping::new((1.0, 1.0), &[0.0, 1.0]),
            Err(PlmError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_short_level_mapping_reports_missing_code() {
        // Two levels on a 2-bit profile: codes 2 and 3 have no phase.
        let p = profile(2, 2, (0.0, 1.0), OutOfDomainPolicy::Clamp);
        let levels = LevelMapping::new((0.0, 1.0), &[0.0, 1.0]).unwrap();
        assert_eq!(levels.to_phase(3), None);
        let result = dequantize_with_mapping(&array![[1u32, 3]], &p, &levels);
        assert!(matches!(
            result,
            Err(PlmError::CodeOutOfRange { row: 0, col: 1, code: 3, .. })
        ));
    }
}
