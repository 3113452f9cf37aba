use glam::Vec2;

use crate::core::types::BodyId;

/// Result of a positive overlap test between two bodies.
///
/// `normal` is unit length and points from `body_a` towards `body_b`;
/// moving `body_b` by `normal * depth` separates the pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub normal: Vec2,
    pub depth: f32,
}

impl Contact {
    /// The same contact seen from the other body.
    pub fn flipped(&self) -> Self {
        Self {
            body_a: self.body_b,
            body_b: self.body_a,
            normal: -self.normal,
            depth: self.depth,
        }
    }
}
