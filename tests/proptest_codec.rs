use ndarray::Array2;
use plm_codec::{
    dequantize, pack, quantize, unpack, BitOrder, ByteLayout, LevelMapping, ProfileConfig,
};
use proptest::prelude::*;

/// A bit depth together with a byte layout that has a packing rule for it.
fn depth_and_layout() -> impl Strategy<Value = (u8, ByteLayout)> {
    prop_oneof![
        (1u8..=8).prop_map(|d| (d, ByteLayout::PackedSubbyte)),
        (8u8..=32).prop_map(|d| (d, ByteLayout::LeMultibyte)),
        (8u8..=32).prop_map(|d| (d, ByteLayout::BeMultibyte)),
    ]
}

/// A random device config plus a matching row-major list of valid codes.
fn config_and_codes() -> impl Strategy<Value = (ProfileConfig, Vec<u32>)> {
    (
        depth_and_layout(),
        1usize..12,
        1usize..12,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_flat_map(|((bit_depth, byte_layout), width, height, lsb, row_flip, col_flip)| {
            let config = ProfileConfig {
                byte_layout,
                bit_order: if lsb { BitOrder::LsbFirst } else { BitOrder::MsbFirst },
                row_flip,
                col_flip,
                ..ProfileConfig::new(bit_depth, (width, height))
            };
            let max_code = ((1u64 << bit_depth) - 1) as u32;
            (
                Just(config),
                prop::collection::vec(0..=max_code, width * height),
            )
        })
}

// Property 1: unpack(pack(c)) == c, and pack is deterministic, for every layout,
// bit order and flip combination.
proptest! {
    #[test]
    fn prop_pack_unpack_identity((config, codes) in config_and_codes()) {
        let device = config.build().unwrap();
        let field = Array2::from_shape_vec(device.shape(), codes).unwrap();

        let packed = pack(&field, &device).unwrap();
        prop_assert_eq!(packed.len(), device.packed_len());
        prop_assert_eq!(&packed, &pack(&field, &device).unwrap());

        let unpacked = unpack(&packed, &device).unwrap();
        prop_assert_eq!(unpacked, field);
    }
}

// Property 2: under CLAMP, dequantize(quantize(x)) stays within half a code step
// of any in-range x.
proptest! {
    #[test]
    fn prop_quantize_roundtrip_within_half_step(
        bit_depth in 1u8..=16,
        min in -10.0f64..10.0,
        span in 0.1f64..20.0,
        fractions in prop::collection::vec(0.0f64..=1.0, 1..64)
    ) {
        let byte_layout = if bit_depth > 8 {
            ByteLayout::LeMultibyte
        } else {
            ByteLayout::PackedSubbyte
        };
        let device = ProfileConfig {
            phase_range: (min, min + span),
            byte_layout,
            ..ProfileConfig::new(bit_depth, (fractions.len(), 1))
        }
        .build()
        .unwrap();
        let (lo, hi) = device.phase_range();
        let phase = Array2::from_shape_fn(device.shape(), |(_, col)| {
            (lo + fractions[col] * (hi - lo)).clamp(lo, hi)
        });
        let step = (hi - lo) / device.max_code() as f64;

        let codes = quantize(&phase, &device).unwrap();
        prop_assert!(codes.iter().all(|&c| c <= device.max_code()));

        let restored = dequantize(&codes, &device).unwrap();
        for (original, back) in phase.iter().zip(restored.iter()) {
            prop_assert!(
                (original - back).abs() <= step / 2.0 + 1e-9,
                "{} -> {} exceeds step {}", original, back, step
            );
        }
    }
}

// Property 3: with measured displacement levels, each level phase quantizes back
// to its own code.
proptest! {
    #[test]
    fn prop_level_phases_are_fixed_points(
        increments in prop::collection::vec(0.01f64..1.0, 16)
    ) {
        let total: f64 = increments.iter().sum();
        let mut acc = 0.0;
        let mut ratios: Vec<f64> = increments
            .iter()
            .map(|inc| {
                acc += inc;
                acc / total
            })
            .collect();
        ratios[0] = 0.0;
        ratios[15] = 1.0;

        let device = ProfileConfig {
            displacement_ratios: Some(ratios.clone()),
            ..ProfileConfig::new(4, (16, 1))
        }
        .build()
        .unwrap();
        let levels = LevelMapping::new(device.phase_range(), &ratios).unwrap();
        let phase = Array2::from_shape_vec((1, 16), levels.level_phases().to_vec()).unwrap();

        let codes = quantize(&phase, &device).unwrap();
        let expected: Vec<u32> = (0..16).collect();
        prop_assert_eq!(codes.iter().copied().collect::<Vec<_>>(), expected);
    }
}
