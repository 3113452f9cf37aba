use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    core::{rigidbody::RigidBody, vertex::Vertex},
    utils::allocator::Arena,
};

/// Position-based (Verlet) integrator.
///
/// Velocity lives in the gap between `position` and `previous_position`, so
/// constraint relaxation and collision response, which only move positions,
/// stay velocity-consistent without a separate velocity pass.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    parallel: bool,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes effect only when the crate is built with the `parallel` feature.
    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Advances one vertex. Anchored vertices only drop their accumulated acceleration.
    pub fn integrate_vertex(vertex: &mut Vertex, dt: f32, gravity: Vec2, air_friction: f32) {
        if vertex.anchored {
            vertex.acceleration = Vec2::ZERO;
            return;
        }

        let velocity = (vertex.position - vertex.previous_position) * (1.0 - air_friction);
        vertex.previous_position = vertex.position;
        vertex.position += velocity + (gravity + vertex.acceleration) * dt * dt;
        vertex.acceleration = Vec2::ZERO;
    }

    /// Converts the body's accumulated force into vertex acceleration.
    pub fn apply_forces(body: &mut RigidBody) {
        let force = body.take_force();
        if body.is_anchored() || force == Vec2::ZERO {
            return;
        }
        let acceleration = force / body.mass();
        for vertex in body.vertices_mut() {
            vertex.accelerate(acceleration);
        }
    }

    pub fn integrate_body(body: &mut RigidBody, dt: f32, gravity: Vec2) {
        Self::apply_forces(body);
        let gravity = gravity * body.gravity_scale();
        let air_friction = body.air_friction();
        for vertex in body.vertices_mut() {
            Self::integrate_vertex(vertex, dt, gravity, air_friction);
        }
    }

    pub fn step(&self, bodies: &mut Arena<RigidBody>, dt: f32, gravity: Vec2) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            let mut refs: Vec<&mut RigidBody> = bodies.values_mut().collect();
            refs.par_iter_mut()
                .for_each(|body| Self::integrate_body(body, dt, gravity));
            return;
        }

        for body in bodies.values_mut() {
            Self::integrate_body(body, dt, gravity);
        }
    }
}
