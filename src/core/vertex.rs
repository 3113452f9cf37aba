use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::types::BodyId;

/// Point mass tracked by position history.
///
/// Velocity is implicit: `position - previous_position`. Only the integrator
/// writes `previous_position` during a step; programmatic moves go through
/// [`Vertex::set_position`], which keeps the implicit velocity from spiking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub acceleration: Vec2,
    pub anchored: bool,
}

impl Vertex {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            previous_position: position,
            acceleration: Vec2::ZERO,
            anchored: false,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.position - self.previous_position
    }

    /// Teleports the vertex and zeroes its implicit velocity.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.previous_position = position;
    }

    /// Solver-side correction: moves `position` only, unless anchored.
    #[inline]
    pub fn nudge(&mut self, delta: Vec2) {
        if !self.anchored {
            self.position += delta;
        }
    }

    pub fn accelerate(&mut self, acceleration: Vec2) {
        self.acceleration += acceleration;
    }
}

/// Non-owning reference to one corner of a registered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexRef {
    pub body: BodyId,
    pub index: usize,
}

impl VertexRef {
    pub fn new(body: BodyId, index: usize) -> Self {
        Self { body, index }
    }
}

/// Mutable access to two different vertices of the same slice.
pub(crate) fn pair_mut(vertices: &mut [Vertex], a: usize, b: usize) -> Option<(&mut Vertex, &mut Vertex)> {
    if a == b || a >= vertices.len() || b >= vertices.len() {
        return None;
    }
    if a < b {
        let (left, right) = vertices.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = vertices.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
