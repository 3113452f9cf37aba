pub mod events;
pub mod lifecycle;

use std::time::Instant;

use glam::Vec2;
use log::debug;

use crate::{
    collision::{broadphase::BroadPhase, narrowphase::NarrowPhase, resolver::CollisionResolver},
    config::{AnchorRotation, EngineConfig},
    core::{
        constraints::Constraint,
        rigidbody::{BodySpec, RigidBody},
        types::{Aabb, BodyId, ConstraintId},
    },
    dynamics::{forces::ForceRegistry, integrator::Integrator, solver::ConstraintSolver},
    utils::{allocator::Arena, logging::ScopedTimer, profiling::StepProfile},
};

use self::events::{BodyEvent, Commands, EventBus};

/// Owns every body and constraint and runs the per-step pipeline.
///
/// Input is not validated here; [`crate::Engine`] does that before calling in.
pub struct PhysicsWorld {
    pub bodies: Arena<RigidBody>,
    pub constraints: Arena<Constraint>,
    pub force_registry: ForceRegistry,
    pub events: EventBus,
    pub gravity: Vec2,
    pub canvas: Aabb,
    integrator: Integrator,
    solver: ConstraintSolver,
    collision_iterations: u32,
    use_quadtrees: bool,
    broadphase: BroadPhase,
    resolver: CollisionResolver,
    anchor_rotation: AnchorRotation,
    last_events: Vec<BodyEvent>,
    profile: StepProfile,
}

impl PhysicsWorld {
    pub fn new(config: &EngineConfig) -> Self {
        let mut integrator = Integrator::new();
        integrator.set_parallel(config.parallel);

        Self {
            bodies: Arena::new(),
            constraints: Arena::new(),
            force_registry: ForceRegistry::new(),
            events: EventBus::new(),
            gravity: config.gravity,
            canvas: config.canvas,
            integrator,
            solver: ConstraintSolver::new(config.constraint_iterations),
            collision_iterations: config.collision_iterations,
            use_quadtrees: config.use_quadtrees,
            broadphase: BroadPhase::new(config.canvas, config.quadtree_capacity, config.quadtree_max_depth),
            resolver: CollisionResolver::new(config.friction_mixing, config.elasticity_mixing),
            anchor_rotation: config.anchor_rotation,
            last_events: Vec::new(),
            profile: StepProfile::default(),
        }
    }

    pub fn add_body(&mut self, spec: &BodySpec) -> BodyId {
        let id = self
            .bodies
            .insert(RigidBody::from_spec(BodyId::default(), spec, self.anchor_rotation));
        if let Some(stored) = self.bodies.get_mut(id) {
            stored.assign_id(id);
        }
        debug!("created body {id} at {:?}", spec.position);
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        let id = self.constraints.insert(constraint);
        debug!("created {:?} constraint {id}", constraint.kind);
        id
    }

    pub fn constraint_iterations(&self) -> u32 {
        self.solver.iterations
    }

    pub fn set_constraint_iterations(&mut self, iterations: u32) {
        self.solver.iterations = iterations;
    }

    pub fn collision_iterations(&self) -> u32 {
        self.collision_iterations
    }

    pub fn set_collision_iterations(&mut self, iterations: u32) {
        self.collision_iterations = iterations;
    }

    pub fn use_quadtrees(&self) -> bool {
        self.use_quadtrees
    }

    pub fn set_use_quadtrees(&mut self, enabled: bool) {
        self.use_quadtrees = enabled;
    }

    pub fn broadphase(&self) -> &BroadPhase {
        &self.broadphase
    }

    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    /// Events delivered during the most recent step, in delivery order.
    pub fn last_events(&self) -> &[BodyEvent] {
        &self.last_events
    }

    /// Marks `id` and removes it immediately, firing its destroyed event.
    ///
    /// Only call between steps.
    pub fn destroy_now(&mut self, id: BodyId) -> bool {
        match self.bodies.get_mut(id) {
            Some(body) => body.destroy(),
            None => return false,
        }
        self.sweep();
        true
    }

    /// Marks every body and removes them all.
    pub fn destroy_all(&mut self) {
        for body in self.bodies.values_mut() {
            body.destroy();
        }
        self.sweep();
    }

    /// Runs one full pipeline pass.
    pub fn step(&mut self, dt: f32) {
        let step_start = Instant::now();
        let mut profile = StepProfile::default();
        self.last_events.clear();

        // Bodies marked through `RigidBody::destroy` between steps.
        profile.removed_bodies += self.sweep();

        {
            let _timer = ScopedTimer::new("forces+integrate", &mut profile.integration_time);
            self.force_registry.apply_all(&mut self.bodies, dt);
            self.integrator.step(&mut self.bodies, dt, self.gravity);
        }

        {
            let _timer = ScopedTimer::new("constraints", &mut profile.constraint_time);
            self.solver.solve(&mut self.bodies, &self.constraints);
        }

        self.collide(&mut profile);

        {
            let _timer = ScopedTimer::new("boundary", &mut profile.boundary_time);
            self.contain();
        }

        {
            let _timer = ScopedTimer::new("events", &mut profile.event_time);
            self.emit_touched();
            let mut commands = Commands::default();
            let delivered = self.events.dispatch(&mut commands);
            self.last_events.extend(delivered);
            self.apply(commands);
        }

        {
            let _timer = ScopedTimer::new("lifecycle", &mut profile.lifecycle_time);
            lifecycle::expire(&mut self.bodies, dt);
            profile.removed_bodies += self.sweep();
        }

        profile.body_count = self.bodies.len();
        profile.total_step_time = step_start.elapsed();
        self.profile = profile;
    }

    fn collide(&mut self, profile: &mut StepProfile) {
        for body in self.bodies.values_mut() {
            body.clear_touching();
        }

        let (pairs, passes) = {
            let _timer = ScopedTimer::new("broad-phase", &mut profile.broad_phase_time);
            if self.use_quadtrees {
                self.broadphase.build(&self.bodies, self.canvas);
                (self.broadphase.candidate_pairs(&self.bodies), self.collision_iterations)
            } else {
                (BroadPhase::all_pairs(&self.bodies), 1)
            }
        };
        profile.candidate_pairs = pairs.len();

        let _timer = ScopedTimer::new("narrow-phase", &mut profile.narrow_phase_time);
        for _ in 0..passes {
            for &(a, b) in &pairs {
                let Some((body_a, body_b)) = self.bodies.get2_mut(a, b) else {
                    continue;
                };
                let Some(contact) = NarrowPhase::test_overlap(body_a, body_b) else {
                    continue;
                };
                self.resolver.resolve(body_a, body_b, &contact);
                body_a.add_touching(b);
                body_b.add_touching(a);
                profile.contact_count += 1;
            }
        }
    }

    /// Translates canvas-bound bodies back inside and queues edge events.
    fn contain(&mut self) {
        let canvas = self.canvas;
        for body in self.bodies.values_mut() {
            if !body.keeps_in_canvas() || body.is_anchored() || body.is_destroyed() {
                continue;
            }
            let bounds = body.aabb();
            let overshoot = Vec2::new(
                axis_overshoot(bounds.min.x, bounds.max.x, canvas.min.x, canvas.max.x),
                axis_overshoot(bounds.min.y, bounds.max.y, canvas.min.y, canvas.max.y),
            );
            if overshoot != Vec2::ZERO {
                body.shift(overshoot);
                self.events.push(BodyEvent::CanvasEdgeTouched { body: body.id() });
            }
        }
    }

    fn emit_touched(&mut self) {
        for body in self.bodies.values() {
            for other in body.touching_bodies() {
                self.events.push(BodyEvent::Touched {
                    body: body.id(),
                    other,
                });
            }
        }
    }

    fn apply(&mut self, mut commands: Commands) {
        for id in commands.take_destroyed() {
            if let Some(body) = self.bodies.get_mut(id) {
                body.destroy();
            }
        }
    }

    /// Purges marked bodies and delivers their destroyed events until no
    /// handler asks for more. Returns how many bodies left the registry.
    fn sweep(&mut self) -> usize {
        let mut total = 0;
        loop {
            let removed = lifecycle::purge(&mut self.bodies, &mut self.constraints);
            if removed.is_empty() {
                return total;
            }
            total += removed.len();
            for (body, visual) in removed {
                self.events.forget(body);
                self.events.push(BodyEvent::Destroyed { body, visual });
            }
            let mut commands = Commands::default();
            let delivered = self.events.dispatch(&mut commands);
            self.last_events.extend(delivered);
            self.apply(commands);
        }
    }
}

/// Shift along one axis that brings `[min, max]` back inside `[lo, hi]`.
fn axis_overshoot(min: f32, max: f32, lo: f32, hi: f32) -> f32 {
    if min < lo {
        lo - min
    } else if max > hi {
        hi - max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&EngineConfig::with_canvas_size(400.0, 300.0))
    }

    #[test]
    fn overlapping_bodies_touch_each_other_once() {
        let mut world = world();
        world.gravity = Vec2::ZERO;
        let a = world.add_body(&BodySpec::default().with_position(Vec2::new(100.0, 100.0)));
        let b = world.add_body(&BodySpec::default().with_position(Vec2::new(190.0, 100.0)));

        world.step(1.0 / 60.0);

        assert_eq!(world.bodies.get(a).unwrap().touching_bodies(), vec![b]);
        assert_eq!(world.bodies.get(b).unwrap().touching_bodies(), vec![a]);
        assert_eq!(
            world.last_events(),
            &[
                BodyEvent::Touched { body: a, other: b },
                BodyEvent::Touched { body: b, other: a }
            ]
        );
    }

    #[test]
    fn contained_body_is_pushed_back_inside() {
        let mut world = world();
        let id = world.add_body(
            &BodySpec::default()
                .with_position(Vec2::new(200.0, 280.0))
                .with_keep_in_canvas(true),
        );

        world.step(1.0 / 60.0);

        let bounds = world.bodies.get(id).unwrap().aabb();
        assert!(bounds.max.y <= 300.0);
        assert_eq!(world.last_events(), &[BodyEvent::CanvasEdgeTouched { body: id }]);
    }

    #[test]
    fn anchored_body_is_never_clamped_to_the_canvas() {
        let mut world = world();
        let id = world.add_body(
            &BodySpec::default()
                .with_position(Vec2::new(200.0, 320.0))
                .with_anchored(true)
                .with_keep_in_canvas(true),
        );

        world.step(1.0 / 60.0);

        assert_eq!(world.bodies.get(id).unwrap().center(), Vec2::new(200.0, 320.0));
        assert!(world.last_events().is_empty());
    }

    #[test]
    fn marked_body_is_swept_at_step_start() {
        let mut world = world();
        let id = world.add_body(&BodySpec::default());
        world.bodies.get_mut(id).unwrap().destroy();

        world.step(1.0 / 60.0);

        assert!(!world.bodies.contains(id));
        assert!(matches!(world.last_events(), [BodyEvent::Destroyed { body, .. }] if *body == id));
        assert_eq!(world.profile().removed_bodies, 1);
    }

    #[test]
    fn axis_overshoot_prefers_the_low_edge() {
        assert_eq!(axis_overshoot(-2.0, 5.0, 0.0, 10.0), 2.0);
        assert_eq!(axis_overshoot(8.0, 12.0, 0.0, 10.0), -2.0);
        assert_eq!(axis_overshoot(1.0, 9.0, 0.0, 10.0), 0.0);
    }
}
