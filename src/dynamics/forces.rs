use glam::Vec2;

use crate::{core::rigidbody::RigidBody, utils::allocator::Arena};

/// Engine-wide force source applied to every body before integration.
pub trait ForceGenerator: Send + Sync {
    fn apply(&self, body: &mut RigidBody, dt: f32);
}

/// Uniform force such as wind; scaled by nothing, so heavier panels drift slower.
pub struct ConstantForce {
    pub force: Vec2,
}

impl ConstantForce {
    pub fn new(force: Vec2) -> Self {
        Self { force }
    }
}

impl ForceGenerator for ConstantForce {
    fn apply(&self, body: &mut RigidBody, _dt: f32) {
        body.apply_force(self.force);
    }
}

/// Quadratic drag resisting the direction of motion.
pub struct DragForce {
    pub drag_coefficient: f32,
}

impl DragForce {
    pub fn new(drag_coefficient: f32) -> Self {
        Self { drag_coefficient }
    }
}

impl ForceGenerator for DragForce {
    fn apply(&self, body: &mut RigidBody, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        // Implicit velocity is per step; convert to units per second.
        let velocity = body.velocity() / dt;
        let speed = velocity.length();
        if speed < 1e-6 {
            return;
        }
        body.apply_force(-velocity / speed * speed * speed * self.drag_coefficient);
    }
}

/// Collection of forces applied each step.
#[derive(Default)]
pub struct ForceRegistry {
    forces: Vec<Box<dyn ForceGenerator>>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_force<F: ForceGenerator + 'static>(&mut self, force: F) {
        self.forces.push(Box::new(force));
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn apply_all(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        if self.forces.is_empty() {
            return;
        }
        for body in bodies.values_mut() {
            for force in &self.forces {
                force.apply(body, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnchorRotation, core::rigidbody::BodySpec, utils::allocator::EntityId};

    #[test]
    fn constant_force_skips_anchored_bodies() {
        let mut bodies = Arena::new();
        let free = bodies.insert(RigidBody::from_spec(
            EntityId::default(),
            &BodySpec::default(),
            AnchorRotation::Allow,
        ));
        let fixed = bodies.insert(RigidBody::from_spec(
            EntityId::default(),
            &BodySpec::default().with_anchored(true),
            AnchorRotation::Allow,
        ));

        let mut registry = ForceRegistry::new();
        registry.add_force(ConstantForce::new(Vec2::new(4.0, 0.0)));
        registry.apply_all(&mut bodies, 1.0 / 60.0);

        assert_eq!(bodies.get_mut(free).unwrap().take_force(), Vec2::new(4.0, 0.0));
        assert_eq!(bodies.get_mut(fixed).unwrap().take_force(), Vec2::ZERO);
    }
}
