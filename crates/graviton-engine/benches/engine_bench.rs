//! Criterion benchmarks for the graviton control plane
//!
//! Run with: cargo bench -p graviton-engine
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use graviton_core::{BlockStats, PARAM_COUNT, ParamKey, ParamSnapshot};
use graviton_engine::{
    BlendPipeline, BlockParams, Connection, CurveShape, GravitonEngine, MacroMapper, MacroMode,
    ModulationMatrix, RoutingGraph, SourceKind, Topology,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 0.5
        })
        .collect()
}

fn dense_connections() -> Vec<Connection> {
    let destinations = [
        ParamKey::Time,
        ParamKey::Mass,
        ParamKey::Density,
        ParamKey::Bloom,
        ParamKey::Drift,
        ParamKey::Swirl,
        ParamKey::Haze,
        ParamKey::Grain,
        ParamKey::Warp,
        ParamKey::Shimmer,
        ParamKey::Scatter,
        ParamKey::Tone,
    ];
    let sources = SourceKind::ALL;
    destinations
        .iter()
        .enumerate()
        .map(|(i, &dest)| {
            let mut c = Connection::new(sources[i % 4], i % 2, dest, 0.4);
            c.curve = CurveShape::ALL[i % 3];
            c.smoothing_ms = 30.0 + i as f32 * 10.0;
            c
        })
        .collect()
}

fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("ModulationMatrix");

    for &count in &[4usize, 12, 32] {
        let list: Vec<Connection> = dense_connections()
            .into_iter()
            .cycle()
            .take(count)
            .collect();
        group.bench_with_input(BenchmarkId::new("process", count), &count, |b, _| {
            let mut matrix = ModulationMatrix::new(SAMPLE_RATE);
            matrix.commit(&list);
            let stats = BlockStats {
                rms: 0.3,
                peak: 0.7,
                len: 256,
            };
            b.iter(|| {
                matrix.process(black_box(&stats), 256);
                black_box(matrix.offsets());
            });
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("BlendPipeline");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("retarget_advance", block_size),
            &block_size,
            |b, &size| {
                let mut pipeline = BlendPipeline::new();
                pipeline.prepare(SAMPLE_RATE, size);
                let mapper = MacroMapper::new(MacroMode::Thematic);
                let macros = [0.7, 0.3, 0.6, 0.4, 0.8];
                let targets = mapper.compute_targets(&macros);
                let influence = mapper.influence(&macros);
                let mut snap = ParamSnapshot::defaults();
                snap.set(ParamKey::Time, 0.8);
                let offsets = [0.01f32; PARAM_COUNT];
                b.iter(|| {
                    pipeline.retarget(black_box(&snap), &targets, influence);
                    pipeline.advance(size);
                    pipeline.apply_modulation(black_box(&offsets));
                    black_box(pipeline.value(ParamKey::Time));
                });
            },
        );
    }

    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("RoutingGraph");

    for topology in [Topology::Traditional, Topology::EventHorizon] {
        group.bench_with_input(
            BenchmarkId::new("process", topology.as_str()),
            &topology,
            |b, &t| {
                let mut graph = RoutingGraph::new();
                graph.prepare(SAMPLE_RATE, 256, 2);
                graph.load_topology(t);
                let mut pipeline = BlendPipeline::new();
                pipeline.prepare(SAMPLE_RATE, 256);
                pipeline.advance(256);
                pipeline.apply_modulation(&[0.0; PARAM_COUNT]);
                let signal = generate_test_signal(256);
                b.iter(|| {
                    let mut l = signal.clone();
                    let mut r = signal.clone();
                    let params = BlockParams::new(&pipeline, 256);
                    graph.process(&mut l, &mut r, &params);
                    black_box((l, r));
                });
            },
        );
    }

    group.finish();
}

fn bench_full_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("GravitonEngine");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, &size| {
                let mut engine = GravitonEngine::new();
                engine.prepare(SAMPLE_RATE, size, 2);
                let controls = engine.controls();
                controls.set_connections(dense_connections());
                controls.set_macro(0, 0.8);
                let signal = generate_test_signal(size);
                // Let the connection commit land.
                let mut l = signal.clone();
                let mut r = signal.clone();
                engine.process(&mut l, &mut r, None);
                b.iter(|| {
                    let mut l = signal.clone();
                    let mut r = signal.clone();
                    engine.process(black_box(&mut l), black_box(&mut r), None);
                    black_box((l, r));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_matrix,
    bench_pipeline,
    bench_routing,
    bench_full_engine
);
criterion_main!(benches);
