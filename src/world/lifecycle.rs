use log::debug;

use crate::{
    core::{
        constraints::Constraint,
        rigidbody::RigidBody,
        types::{BodyId, VisualHandle},
    },
    utils::allocator::Arena,
};

/// Ages every body by `dt` and marks those whose lifespan ran out.
///
/// Returns the number of bodies newly marked.
pub fn expire(bodies: &mut Arena<RigidBody>, dt: f32) -> usize {
    let mut expired = 0;
    for body in bodies.values_mut() {
        if body.is_destroyed() {
            continue;
        }
        if body.tick(dt) {
            debug!("body {} lifespan elapsed", body.id());
            body.destroy();
            expired += 1;
        }
    }
    expired
}

/// Removes every marked body and any custom constraint that referenced one.
///
/// Returns the removed ids with their visuals, in id order.
pub fn purge(bodies: &mut Arena<RigidBody>, constraints: &mut Arena<Constraint>) -> Vec<(BodyId, VisualHandle)> {
    let marked: Vec<BodyId> = bodies
        .iter()
        .filter(|(_, body)| body.is_destroyed())
        .map(|(id, _)| id)
        .collect();
    if marked.is_empty() {
        return Vec::new();
    }

    let mut removed = Vec::with_capacity(marked.len());
    for id in marked {
        if let Some(body) = bodies.remove(id) {
            debug!("destroyed body {id}");
            removed.push((id, body.frame()));
        }
    }
    removed.sort_by_key(|(id, _)| *id);

    let dangling: Vec<_> = constraints
        .iter()
        .filter(|(_, c)| !bodies.contains(c.a.body) || !bodies.contains(c.b.body))
        .map(|(id, _)| id)
        .collect();
    for id in dangling {
        constraints.remove(id);
        debug!("dropped constraint {id} with a destroyed endpoint");
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AnchorRotation,
        core::{constraints::ConstraintKind, rigidbody::BodySpec, vertex::VertexRef},
    };

    fn insert(bodies: &mut Arena<RigidBody>, spec: BodySpec) -> BodyId {
        let id = bodies.insert(RigidBody::from_spec(BodyId::default(), &spec, AnchorRotation::Allow));
        bodies.get_mut(id).unwrap().assign_id(id);
        id
    }

    #[test]
    fn expired_bodies_and_their_constraints_are_purged() {
        let mut bodies = Arena::new();
        let mut constraints = Arena::new();
        let short = insert(&mut bodies, BodySpec::default().with_lifespan(1.0));
        let long = insert(&mut bodies, BodySpec::default().with_position(glam::Vec2::new(300.0, 0.0)));
        constraints.insert(
            Constraint::new(VertexRef::new(short, 0), VertexRef::new(long, 0), ConstraintKind::Rope, 400.0)
                .unwrap(),
        );

        assert_eq!(expire(&mut bodies, 0.5), 0);
        assert!(purge(&mut bodies, &mut constraints).is_empty());

        assert_eq!(expire(&mut bodies, 0.5), 1);
        let removed = purge(&mut bodies, &mut constraints);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, short);
        assert!(!bodies.contains(short));
        assert!(bodies.contains(long));
        assert!(constraints.is_empty());
    }
}
