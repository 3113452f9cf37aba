use crate::{
    collision::contact::Contact,
    core::{rigidbody::RigidBody, types::MixingMode},
};

/// Positional collision response for Verlet bodies.
///
/// Both the de-penetration and the velocity change are applied as position
/// shifts; history is never written, so the change shows up as implicit
/// velocity on the next integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionResolver {
    pub friction_mixing: MixingMode,
    pub elasticity_mixing: MixingMode,
}

impl CollisionResolver {
    pub fn new(friction_mixing: MixingMode, elasticity_mixing: MixingMode) -> Self {
        Self {
            friction_mixing,
            elasticity_mixing,
        }
    }

    /// Separates `a` and `b` along the contact normal and reflects their
    /// approach velocity. Returns `false` when neither body can move.
    pub fn resolve(&self, a: &mut RigidBody, b: &mut RigidBody, contact: &Contact) -> bool {
        let inv_mass_a = inverse_mass(a);
        let inv_mass_b = inverse_mass(b);
        let total = inv_mass_a + inv_mass_b;
        if total <= 0.0 {
            return false;
        }
        let share_a = inv_mass_a / total;
        let share_b = inv_mass_b / total;
        let normal = contact.normal;

        // Relative velocity before the overlap is pushed out.
        let relative = b.velocity() - a.velocity();
        let approach = relative.dot(normal);

        let correction = normal * contact.depth;
        a.shift(-correction * share_a);
        b.shift(correction * share_b);

        if approach >= 0.0 {
            return true;
        }

        let material = a
            .material()
            .combine_with(&b.material(), self.friction_mixing, self.elasticity_mixing);

        // The correction already separated the pair by `depth`; top up to a
        // rebound of `elasticity * |approach|` and damp the sliding part.
        // Never pull back into the overlap that was just removed.
        let normal_change = (-(1.0 + material.elasticity) * approach - contact.depth).max(0.0);
        let tangent = relative - normal * approach;
        let change = normal * normal_change - tangent * material.friction;

        a.shift(-change * share_a);
        b.shift(change * share_b);
        true
    }
}

fn inverse_mass(body: &RigidBody) -> f32 {
    if body.is_anchored() {
        0.0
    } else {
        1.0 / body.mass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::narrowphase::NarrowPhase, config::AnchorRotation, core::rigidbody::BodySpec,
        utils::allocator::EntityId,
    };
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn body(index: usize, spec: BodySpec) -> RigidBody {
        RigidBody::from_spec(EntityId::new(index, 0), &spec.with_size(Vec2::splat(10.0)), AnchorRotation::Allow)
    }

    #[test]
    fn equal_masses_split_the_overlap() {
        let mut a = body(0, BodySpec::default().with_position(Vec2::ZERO));
        let mut b = body(1, BodySpec::default().with_position(Vec2::new(8.0, 0.0)));
        let contact = NarrowPhase::test_overlap(&a, &b).unwrap();

        assert!(CollisionResolver::default().resolve(&mut a, &mut b, &contact));

        assert_relative_eq!(a.center().x, -1.0, epsilon = 1e-4);
        assert_relative_eq!(b.center().x, 9.0, epsilon = 1e-4);
        assert!(NarrowPhase::test_overlap(&a, &b).is_none());
    }

    #[test]
    fn anchored_body_takes_no_correction() {
        let mut floor = body(0, BodySpec::default().with_anchored(true));
        let mut panel = body(1, BodySpec::default().with_position(Vec2::new(0.0, 9.0)));
        let contact = NarrowPhase::test_overlap(&floor, &panel).unwrap();

        CollisionResolver::default().resolve(&mut floor, &mut panel, &contact);

        assert_eq!(floor.center(), Vec2::ZERO);
        assert_relative_eq!(panel.center().y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn inelastic_impact_stops_normal_motion() {
        let mut floor = body(0, BodySpec::default().with_anchored(true).with_elasticity(0.0));
        let mut panel = body(1, BodySpec::default().with_position(Vec2::new(0.0, 9.0)).with_elasticity(0.0));
        // Falling towards the floor (negative y here) at 1 unit per step.
        for vertex in panel.vertices_mut() {
            vertex.previous_position = vertex.position + Vec2::new(0.0, 1.0);
        }
        let contact = NarrowPhase::test_overlap(&floor, &panel).unwrap();
        let resolver = CollisionResolver::new(MixingMode::Min, MixingMode::Min);

        resolver.resolve(&mut floor, &mut panel, &contact);

        assert_relative_eq!(panel.velocity().y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn deep_overlap_with_slow_approach_is_fully_separated() {
        let mut floor = body(0, BodySpec::default().with_anchored(true).with_elasticity(0.0));
        // Overlaps the floor by 8 while closing in at 1 unit per step.
        let mut panel = body(1, BodySpec::default().with_position(Vec2::new(0.0, 2.0)).with_elasticity(0.0));
        for vertex in panel.vertices_mut() {
            vertex.previous_position = vertex.position + Vec2::new(0.0, 1.0);
        }
        let contact = NarrowPhase::test_overlap(&floor, &panel).unwrap();
        assert_relative_eq!(contact.depth, 8.0, epsilon = 1e-4);

        CollisionResolver::new(MixingMode::Min, MixingMode::Min).resolve(&mut floor, &mut panel, &contact);

        assert_eq!(floor.center(), Vec2::ZERO);
        assert_relative_eq!(panel.center().y, 10.0, epsilon = 1e-4);
        assert!(panel.velocity().y >= 0.0);
        assert!(NarrowPhase::test_overlap(&floor, &panel).is_none());
    }

    #[test]
    fn two_anchored_bodies_are_left_alone() {
        let mut a = body(0, BodySpec::default().with_anchored(true));
        let mut b = body(1, BodySpec::default().with_anchored(true).with_position(Vec2::new(5.0, 0.0)));
        let contact = NarrowPhase::test_overlap(&a, &b).unwrap();
        assert!(!CollisionResolver::default().resolve(&mut a, &mut b, &contact));
        assert_eq!(b.center(), Vec2::new(5.0, 0.0));
    }
}
