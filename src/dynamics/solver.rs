use crate::{
    core::{constraints::Constraint, rigidbody::RigidBody, vertex::pair_mut},
    utils::allocator::Arena,
};

/// Gauss-Seidel relaxation over body links and custom constraints.
///
/// Each pass sees the positions left by the previous one. Only the state after
/// all passes is meaningful; the order within a pass is unspecified.
#[derive(Debug, Clone)]
pub struct ConstraintSolver {
    pub iterations: u32,
}

impl ConstraintSolver {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn solve(&self, bodies: &mut Arena<RigidBody>, constraints: &Arena<Constraint>) {
        for pass in 0..self.iterations {
            let first_pass = pass == 0;
            for body in bodies.values_mut() {
                body.relax(first_pass);
            }
            for constraint in constraints.values() {
                if !first_pass && !constraint.relaxes_every_pass() {
                    continue;
                }
                Self::satisfy_linked(constraint, bodies);
            }
        }
    }

    /// Applies one constraint whose endpoints are looked up in the registry.
    ///
    /// Returns `false` when an endpoint no longer resolves.
    pub fn satisfy_linked(constraint: &Constraint, bodies: &mut Arena<RigidBody>) -> bool {
        let (a, b) = (constraint.a, constraint.b);
        if a.body == b.body {
            let Some(body) = bodies.get_mut(a.body) else {
                return false;
            };
            let Some((va, vb)) = pair_mut(body.vertices_mut(), a.index, b.index) else {
                return false;
            };
            constraint.satisfy(va, vb);
            return true;
        }

        let Some((body_a, body_b)) = bodies.get2_mut(a.body, b.body) else {
            return false;
        };
        let (Some(va), Some(vb)) = (
            body_a.vertices_mut().get_mut(a.index),
            body_b.vertices_mut().get_mut(b.index),
        ) else {
            return false;
        };
        constraint.satisfy(va, vb);
        true
    }
}
