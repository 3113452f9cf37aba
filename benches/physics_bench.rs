use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use panel_physics::*;
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

fn prepare_engine(body_count: usize, quadtrees: bool) -> Engine {
    let mut engine = Engine::new(EngineConfig::with_canvas_size(1600.0, 1200.0)).unwrap();
    engine.use_quadtrees(quadtrees).unwrap();
    let columns = (body_count as f32).sqrt().ceil() as usize;
    for i in 0..body_count {
        let (col, row) = (i % columns, i / columns);
        engine
            .create(
                BodySpec::default()
                    .with_position(Vec2::new(40.0 + col as f32 * 36.0, 40.0 + row as f32 * 36.0))
                    .with_size(Vec2::splat(30.0))
                    .with_rotation((i % 7) as f32 * 5.0)
                    .with_keep_in_canvas(true),
            )
            .unwrap();
    }
    engine
}

fn bench_engine_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_step");
    for &count in &[64usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("all_pairs", count), &count, |b, &count| {
            let mut engine = prepare_engine(count, false);
            b.iter(|| engine.step(black_box(DT)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("quadtree", count), &count, |b, &count| {
            let mut engine = prepare_engine(count, true);
            b.iter(|| engine.step(black_box(DT)).unwrap())
        });
    }
    group.finish();
}

fn bench_quadtree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_build");
    for &count in &[256usize, 1024] {
        let engine = prepare_engine(count, true);
        group.bench_with_input(BenchmarkId::new("candidate_pairs", count), &count, |b, _| {
            let mut broadphase = BroadPhase::new(engine.canvas(), 4, 8);
            b.iter(|| {
                broadphase.build(&engine.world().bodies, engine.canvas());
                black_box(broadphase.candidate_pairs(&engine.world().bodies))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engine_step, bench_quadtree_build);
criterion_main!(benches);
