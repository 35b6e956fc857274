//! Property-based tests for the control plane: matrix determinism under
//! arbitrary connection lists, the end-to-end smoothing bound, and macro
//! transparency at rest.

use graviton_core::{BlockStats, PARAM_COUNT, ParamKey, ParamSnapshot};
use graviton_engine::{
    BlendPipeline, Connection, CurveShape, MacroMapper, MacroMode, ModulationMatrix, SourceKind,
};
use proptest::prelude::*;

fn arb_connection() -> impl Strategy<Value = Connection> {
    (
        0usize..4,
        0usize..3,
        0usize..PARAM_COUNT,
        -1.5f32..1.5f32,
        0.0f32..500.0f32,
        0usize..3,
        any::<bool>(),
    )
        .prop_map(|(src, axis, dest, depth, smoothing, curve, enabled)| {
            let mut c = Connection::new(
                SourceKind::ALL[src],
                axis,
                ParamKey::from_index(dest),
                depth,
            );
            c.smoothing_ms = smoothing;
            c.curve = CurveShape::ALL[curve];
            c.enabled = enabled;
            c.clamped()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(250))]

    /// Identical connection lists and identical input statistics produce
    /// bit-identical modulation offsets, block after block.
    #[test]
    fn matrix_is_deterministic(
        list in prop::collection::vec(arb_connection(), 0..12),
        levels in prop::collection::vec((0.0f32..2.0f32, 0.0f32..2.0f32), 1..40),
    ) {
        let mut a = ModulationMatrix::new(48000.0);
        let mut b = ModulationMatrix::new(48000.0);
        a.commit(&list);
        b.commit(&list);

        for &(rms, peak) in &levels {
            let stats = BlockStats { rms, peak, len: 256 };
            a.process(&stats, 256);
            b.process(&stats, 256);
            for key in ParamKey::ALL {
                prop_assert_eq!(
                    a.modulation(key).to_bits(),
                    b.modulation(key).to_bits(),
                    "diverged at {}",
                    key.as_str()
                );
            }
        }
    }

    /// Disabled connections never contribute, whatever else is committed.
    #[test]
    fn all_disabled_lists_modulate_nothing(
        mut list in prop::collection::vec(arb_connection(), 0..12),
        blocks in 1usize..20,
    ) {
        for c in &mut list {
            c.enabled = false;
        }
        let mut matrix = ModulationMatrix::new(48000.0);
        matrix.commit(&list);
        let stats = BlockStats { rms: 0.5, peak: 0.9, len: 256 };
        for _ in 0..blocks {
            matrix.process(&stats, 256);
        }
        for key in ParamKey::ALL {
            prop_assert_eq!(matrix.modulation(key), 0.0);
        }
    }

    /// For any step change in a hot parameter's target, consecutive
    /// per-sample values never move faster than range / ramp samples.
    #[test]
    fn pipeline_honors_the_smoothing_bound(
        start in 0.0f32..1.0f32,
        target in 0.0f32..1.0f32,
        block in 32usize..512,
    ) {
        let mut pipeline = BlendPipeline::new();
        pipeline.prepare(48000.0, block);

        let mut snap = ParamSnapshot::defaults();
        snap.set(ParamKey::Gravity, start);
        pipeline.snap_to(&snap);

        snap.set(ParamKey::Gravity, target);
        let targets = MacroMapper::new(MacroMode::Thematic).compute_targets(&[0.5; 5]);

        let spec = ParamKey::Gravity.spec();
        let ramp_samples = (spec.smoothing_ms / 1000.0 * 48000.0).max(1.0);
        let bound = spec.span() / ramp_samples + 1e-5;

        let mut prev = start;
        let blocks = (ramp_samples as usize / block) + 10;
        for _ in 0..blocks {
            pipeline.retarget(&snap, &targets, 0.0);
            pipeline.advance(block);
            pipeline.apply_modulation(&[0.0; PARAM_COUNT]);
            for &v in pipeline.samples(ParamKey::Gravity).unwrap() {
                prop_assert!((v - prev).abs() <= bound, "step {} > {}", (v - prev).abs(), bound);
                prev = v;
            }
        }
        prop_assert!((prev - target).abs() < 1e-4);
    }

    /// With every macro at rest, the blended value equals the user value
    /// exactly, for any user value and either macro policy.
    #[test]
    fn resting_macros_are_transparent(
        value in 0.0f32..1.0f32,
        param_index in 0usize..PARAM_COUNT,
        expressive in any::<bool>(),
    ) {
        let key = ParamKey::from_index(param_index);
        let mode = if expressive { MacroMode::Expressive } else { MacroMode::Thematic };
        let mapper = MacroMapper::new(mode);
        let rest = [0.5f32; 5];
        let influence = mapper.influence(&rest[..mode.macro_count()]);
        prop_assert_eq!(influence, 0.0);

        let mut pipeline = BlendPipeline::new();
        pipeline.prepare(48000.0, 128);
        let mut snap = ParamSnapshot::defaults();
        snap.set(key, key.spec().clamp(value));
        pipeline.snap_to(&snap);

        let targets = mapper.compute_targets(&rest[..mode.macro_count()]);
        pipeline.retarget(&snap, &targets, influence);
        pipeline.advance(128);
        pipeline.apply_modulation(&[0.0; PARAM_COUNT]);
        prop_assert_eq!(pipeline.value(key), snap.get(key));
    }
}
