use glam::Vec2;
use log::debug;

use crate::{
    collision::contact::Contact,
    core::rigidbody::{RigidBody, QUAD_VERTICES},
    utils::math::project,
};

/// Exact overlap test between two convex quadrilaterals.
pub struct NarrowPhase;

impl NarrowPhase {
    /// Separating-axis test over the edge normals of both bodies.
    ///
    /// Returns the axis of least overlap oriented from `a` to `b`, or `None`
    /// when the shapes are disjoint or merely touching. Degenerate shapes never
    /// collide.
    pub fn test_overlap(a: &RigidBody, b: &RigidBody) -> Option<Contact> {
        if a.is_degenerate() || b.is_degenerate() {
            debug!("skipping degenerate pair {} / {}", a.id(), b.id());
            return None;
        }

        let points_a = a.positions();
        let points_b = b.positions();

        let mut best_depth = f32::MAX;
        let mut best_normal = Vec2::ZERO;

        for polygon in [&points_a, &points_b] {
            for i in 0..QUAD_VERTICES {
                let edge = polygon[(i + 1) % QUAD_VERTICES] - polygon[i];
                let axis = edge.perp().normalize_or_zero();
                if axis == Vec2::ZERO {
                    continue;
                }

                let (min_a, max_a) = project(&points_a, axis);
                let (min_b, max_b) = project(&points_b, axis);

                // b ahead of a along +axis, or behind it.
                let forward = max_a - min_b;
                let backward = max_b - min_a;
                if forward <= 0.0 || backward <= 0.0 {
                    return None;
                }

                let (depth, normal) = if forward < backward {
                    (forward, axis)
                } else {
                    (backward, -axis)
                };
                if depth < best_depth {
                    best_depth = depth;
                    best_normal = normal;
                }
            }
        }

        if best_normal == Vec2::ZERO {
            return None;
        }

        Some(Contact {
            body_a: a.id(),
            body_b: b.id(),
            normal: best_normal,
            depth: best_depth,
        })
    }
}
