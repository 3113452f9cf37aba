use std::collections::BTreeSet;
use std::sync::Arc;

use panel_physics::*;
use parking_lot::Mutex;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

const DT: f32 = 1.0 / 60.0;

fn random_specs(seed: u64, count: usize) -> Vec<BodySpec> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            BodySpec::new(VisualHandle(i as u64))
                // Some bodies start outside the canvas on purpose.
                .with_position(Vec2::new(rng.gen_range(-100.0..900.0), rng.gen_range(-100.0..700.0)))
                .with_size(Vec2::new(rng.gen_range(10.0..90.0), rng.gen_range(10.0..90.0)))
                .with_rotation(rng.gen_range(0.0..360.0))
                .with_collidable(rng.gen_bool(0.9))
        })
        .collect()
}

fn engine_with(specs: &[BodySpec]) -> Engine {
    let mut engine = Engine::new(EngineConfig::with_canvas_size(800.0, 600.0)).unwrap();
    for spec in specs {
        engine.create(spec.clone()).unwrap();
    }
    engine
}

/// Colliding pairs, named by visual handle so registries built in different
/// orders can be compared.
fn colliding(engine: &Engine, pairs: &[(BodyId, BodyId)]) -> BTreeSet<(u64, u64)> {
    pairs
        .iter()
        .filter_map(|&(a, b)| {
            let (a, b) = (engine.body(a)?, engine.body(b)?);
            NarrowPhase::test_overlap(a, b)?;
            let (x, y) = (a.frame().0, b.frame().0);
            Some((x.min(y), x.max(y)))
        })
        .collect()
}

#[test]
fn quadtree_pairs_match_brute_force() {
    for seed in [1_u64, 7, 42, 1234] {
        let specs = random_specs(seed, 120);
        let engine = engine_with(&specs);
        let bodies = &engine.world().bodies;

        let mut broadphase = BroadPhase::new(engine.canvas(), 4, 8);
        broadphase.build(bodies, engine.canvas());
        let candidates = broadphase.candidate_pairs(bodies);
        let brute = BroadPhase::all_pairs(bodies);

        let candidate_set: BTreeSet<_> = candidates.iter().copied().collect();
        let exact = colliding(&engine, &brute);
        for &(a, b) in &brute {
            let (ba, bb) = (engine.body(a).unwrap(), engine.body(b).unwrap());
            if NarrowPhase::test_overlap(ba, bb).is_some() {
                assert!(candidate_set.contains(&(a, b)), "seed {seed}: missing pair {a} / {b}");
            }
        }
        assert_eq!(colliding(&engine, &candidates), exact, "seed {seed}");
        assert!(!exact.is_empty(), "seed {seed} should produce some overlaps");
    }
}

#[test]
fn quadtree_result_ignores_insertion_order() {
    let specs = random_specs(99, 80);
    let mut shuffled = specs.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(5));

    let pairs_of = |specs: &[BodySpec]| {
        let engine = engine_with(specs);
        let mut broadphase = BroadPhase::new(engine.canvas(), 2, 6);
        broadphase.build(&engine.world().bodies, engine.canvas());
        let candidates = broadphase.candidate_pairs(&engine.world().bodies);
        colliding(&engine, &candidates)
    };

    assert_eq!(pairs_of(&specs), pairs_of(&shuffled));
}

#[test]
fn panel_settles_on_anchored_floor() {
    for quadtrees in [false, true] {
        let mut engine = Engine::new(EngineConfig::with_canvas_size(800.0, 600.0)).unwrap();
        engine.use_quadtrees(quadtrees).unwrap();
        let floor = engine
            .create(
                BodySpec::default()
                    .with_position(Vec2::new(400.0, 550.0))
                    .with_size(Vec2::new(700.0, 100.0))
                    .with_anchored(true),
            )
            .unwrap();
        let panel = engine
            .create(
                BodySpec::default()
                    .with_position(Vec2::new(400.0, 450.0))
                    .with_size(Vec2::new(80.0, 40.0)),
            )
            .unwrap();

        for _ in 0..180 {
            engine.step(DT).unwrap();
        }

        let floor_top = engine.body(floor).unwrap().aabb().min.y;
        let panel_body = engine.body(panel).unwrap();
        assert!(
            panel_body.aabb().max.y <= floor_top + 1.0,
            "panel sank into the floor: {} vs {floor_top}",
            panel_body.aabb().max.y
        );
        assert!(panel_body.aabb().max.y > floor_top - 2.0, "panel should rest on the floor");
        assert_eq!(panel_body.touching_bodies(), vec![floor]);
        assert_eq!(engine.body(floor).unwrap().center(), Vec2::new(400.0, 550.0));
    }
}

#[test]
fn non_collidable_bodies_pass_through() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.set_gravity(Vec2::ZERO).unwrap();
    let a = engine.create(BodySpec::default().with_position(Vec2::new(100.0, 100.0))).unwrap();
    let b = engine
        .create(BodySpec::default().with_position(Vec2::new(150.0, 100.0)).with_collidable(false))
        .unwrap();

    engine.step(DT).unwrap();

    assert!(engine.body(a).unwrap().touching_bodies().is_empty());
    assert_eq!(engine.body(b).unwrap().center(), Vec2::new(150.0, 100.0));
    assert!(engine.last_events().is_empty());
}

#[test]
fn touched_handlers_destroy_after_delivery() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.set_gravity(Vec2::ZERO).unwrap();
    let a = engine.create(BodySpec::default().with_position(Vec2::new(100.0, 100.0))).unwrap();
    let b = engine.create(BodySpec::default().with_position(Vec2::new(170.0, 100.0))).unwrap();

    let touched = Arc::new(Mutex::new(Vec::new()));
    for id in [a, b] {
        let log = Arc::clone(&touched);
        // Both sides race to destroy both bodies.
        engine
            .on_touched(id, move |event, commands| {
                if let BodyEvent::Touched { body, other } = *event {
                    log.lock().push((body, other));
                    commands.destroy(body);
                    commands.destroy(other);
                }
            })
            .unwrap();
    }
    let destroyed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&destroyed);
    engine
        .on_body_destroyed(move |event, _| sink.lock().push(event.body()))
        .unwrap();

    engine.step(DT).unwrap();

    assert_eq!(*touched.lock(), vec![(a, b), (b, a)]);
    assert_eq!(*destroyed.lock(), vec![a, b]);
    assert!(engine.body(a).is_none());
    assert!(engine.body(b).is_none());
    assert_eq!(engine.last_events().len(), 4);
}

#[test]
fn subscribing_to_unknown_body_fails() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let id = engine.create(BodySpec::default()).unwrap();
    engine.destroy(id);

    let result = engine.on_touched(id, |_, _| {});
    assert!(matches!(result, Err(EngineError::UnknownIdentifier(_))));
}

#[test]
fn collision_iterations_run_over_one_candidate_set() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut engine = Engine::new(EngineConfig::with_canvas_size(400.0, 400.0)).unwrap();
    engine.use_quadtrees(true).unwrap();
    engine.set_collision_iterations(4).unwrap();
    engine.set_gravity(Vec2::ZERO).unwrap();
    for _ in 0..40 {
        engine
            .create(
                BodySpec::default()
                    .with_position(Vec2::new(rng.gen_range(50.0..350.0), rng.gen_range(50.0..350.0)))
                    .with_size(Vec2::splat(30.0)),
            )
            .unwrap();
    }

    engine.step(DT).unwrap();
    let profile = *engine.profile();
    assert!(profile.candidate_pairs > 0);
    assert!(profile.contact_count > 0);
    assert_eq!(profile.body_count, 40);

    // Heavily overlapping crowd separates over a few steps.
    let overlaps_before = profile.contact_count;
    for _ in 0..30 {
        engine.step(DT).unwrap();
    }
    assert!(engine.profile().contact_count < overlaps_before);
}
