use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{
    constraints::Constraint,
    types::{Aabb, BodyId, Material, VisualHandle},
    vertex::{pair_mut, Vertex, VertexRef},
};
use crate::{
    config::{
        AnchorRotation, DEFAULT_BODY_SIZE, DEFAULT_ELASTICITY, DEFAULT_FRICTION, DEFAULT_MASS,
        DEGENERATE_AREA_EPSILON,
    },
    error::{EngineError, Result},
    utils::math::{centroid, is_convex, rotate_about, signed_area},
};

/// Corners per body.
pub const QUAD_VERTICES: usize = 4;

/// Four edges, then the two cross braces that stop the quad from shearing.
const LINKS: [(usize, usize); 6] = [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (1, 3)];

/// Corner directions in body space, in winding order.
const CORNERS: [Vec2; QUAD_VERTICES] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

/// Everything a caller can say about a body at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpec {
    pub visual: VisualHandle,
    pub collidable: bool,
    pub anchored: bool,
    /// Center of the panel.
    pub position: Vec2,
    pub size: Vec2,
    /// Degrees.
    pub rotation: f32,
    pub mass: f32,
    pub friction: f32,
    pub elasticity: f32,
    pub keep_in_canvas: bool,
    /// Seconds until automatic destruction.
    pub lifespan: Option<f32>,
    pub gravity_scale: f32,
    /// Fraction of velocity removed per step, in `[0, 1]`.
    pub air_friction: f32,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            visual: VisualHandle::default(),
            collidable: true,
            anchored: false,
            position: Vec2::ZERO,
            size: Vec2::from_array(DEFAULT_BODY_SIZE),
            rotation: 0.0,
            mass: DEFAULT_MASS,
            friction: DEFAULT_FRICTION,
            elasticity: DEFAULT_ELASTICITY,
            keep_in_canvas: false,
            lifespan: None,
            gravity_scale: 1.0,
            air_friction: 0.0,
        }
    }
}

impl BodySpec {
    pub fn new(visual: VisualHandle) -> Self {
        Self {
            visual,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    pub fn with_anchored(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    pub fn with_keep_in_canvas(mut self, keep: bool) -> Self {
        self.keep_in_canvas = keep;
        self
    }

    pub fn with_lifespan(mut self, seconds: f32) -> Self {
        self.lifespan = Some(seconds);
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_air_friction(mut self, air_friction: f32) -> Self {
        self.air_friction = air_friction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() || !self.rotation.is_finite() {
            return Err(EngineError::invalid("position and rotation must be finite"));
        }
        validate_size(self.size)?;
        validate_mass(self.mass)?;
        validate_unit("friction", self.friction)?;
        validate_unit("elasticity", self.elasticity)?;
        validate_unit("air friction", self.air_friction)?;
        validate_gravity_scale(self.gravity_scale)?;
        if let Some(lifespan) = self.lifespan {
            validate_lifespan(lifespan)?;
        }
        Ok(())
    }
}

fn validate_size(size: Vec2) -> Result<()> {
    if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(format!(
            "size must be positive, got ({}, {})",
            size.x, size.y
        )))
    }
}

fn validate_mass(mass: f32) -> Result<()> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(format!("mass must be positive, got {mass}")))
    }
}

fn validate_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::invalid(format!("{name} must be in [0, 1], got {value}")))
    }
}

fn validate_gravity_scale(scale: f32) -> Result<()> {
    if scale.is_finite() {
        Ok(())
    } else {
        Err(EngineError::invalid(format!("gravity scale must be finite, got {scale}")))
    }
}

fn validate_lifespan(seconds: f32) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(format!(
            "lifespan must be a non-negative number of seconds, got {seconds}"
        )))
    }
}

/// Quadrilateral panel made of four Verlet vertices held by six rigid links.
///
/// The body never owns its visual; it only carries the handle so renderers can
/// map snapshots back to their panels.
#[derive(Debug, Clone)]
pub struct RigidBody {
    id: BodyId,
    visual: VisualHandle,
    vertices: [Vertex; QUAD_VERTICES],
    constraints: Vec<Constraint>,
    anchored: bool,
    collidable: bool,
    keep_in_canvas: bool,
    anchor_rotation: AnchorRotation,
    mass: f32,
    material: Material,
    gravity_scale: f32,
    air_friction: f32,
    force: Vec2,
    lifespan: Option<f32>,
    age: f32,
    touching: BTreeSet<BodyId>,
    destroyed: bool,
}

impl RigidBody {
    /// Lays out a body from a validated spec.
    pub(crate) fn from_spec(id: BodyId, spec: &BodySpec, anchor_rotation: AnchorRotation) -> Self {
        let vertices = layout(spec.position, spec.size, spec.rotation.to_radians()).map(|p| {
            let mut vertex = Vertex::new(p);
            vertex.anchored = spec.anchored;
            vertex
        });

        let constraints = LINKS
            .iter()
            .map(|&(a, b)| {
                Constraint::rigid(
                    VertexRef::new(id, a),
                    VertexRef::new(id, b),
                    vertices[a].position.distance(vertices[b].position),
                )
            })
            .collect();

        Self {
            id,
            visual: spec.visual,
            vertices,
            constraints,
            anchored: spec.anchored,
            collidable: spec.collidable,
            keep_in_canvas: spec.keep_in_canvas,
            anchor_rotation,
            mass: spec.mass,
            material: Material {
                friction: spec.friction,
                elasticity: spec.elasticity,
            },
            gravity_scale: spec.gravity_scale,
            air_friction: spec.air_friction,
            force: Vec2::ZERO,
            lifespan: spec.lifespan,
            age: 0.0,
            touching: BTreeSet::new(),
            destroyed: false,
        }
    }

    /// Stamps the registry id onto the body and its own links.
    pub(crate) fn assign_id(&mut self, id: BodyId) {
        self.id = id;
        for constraint in &mut self.constraints {
            constraint.a.body = id;
            constraint.b.body = id;
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    /// The external visual this body drives.
    pub fn frame(&self) -> VisualHandle {
        self.visual
    }

    pub fn vertices(&self) -> &[Vertex; QUAD_VERTICES] {
        &self.vertices
    }

    /// The body's own edge and brace links.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Bodies found overlapping this one during the last collision stage.
    pub fn touching_bodies(&self) -> Vec<BodyId> {
        self.touching.iter().copied().collect()
    }

    pub fn positions(&self) -> [Vec2; QUAD_VERTICES] {
        self.vertices.map(|v| v.position)
    }

    pub fn center(&self) -> Vec2 {
        centroid(&self.positions())
    }

    /// Orientation in degrees, read off the first edge.
    pub fn rotation(&self) -> f32 {
        let edge = self.vertices[1].position - self.vertices[0].position;
        edge.y.atan2(edge.x).to_degrees()
    }

    /// Current width and height, measured along the body's own edges.
    pub fn size(&self) -> Vec2 {
        let p = self.positions();
        Vec2::new(p[0].distance(p[1]), p[1].distance(p[2]))
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.positions())
    }

    /// Mean implicit velocity of the corners, in canvas units per step.
    pub fn velocity(&self) -> Vec2 {
        self.vertices.iter().map(Vertex::velocity).sum::<Vec2>() / QUAD_VERTICES as f32
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_collidable(&self) -> bool {
        self.collidable
    }

    pub fn keeps_in_canvas(&self) -> bool {
        self.keep_in_canvas
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn air_friction(&self) -> f32 {
        self.air_friction
    }

    /// Remaining lifespan in seconds, if one is set.
    pub fn lifespan(&self) -> Option<f32> {
        self.lifespan
    }

    /// Seconds simulated since creation.
    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn anchor(&mut self) {
        self.set_anchored(true);
    }

    pub fn unanchor(&mut self) {
        self.set_anchored(false);
    }

    fn set_anchored(&mut self, anchored: bool) {
        self.anchored = anchored;
        for vertex in &mut self.vertices {
            vertex.anchored = anchored;
            // Drop any history left from before the body was frozen.
            vertex.previous_position = vertex.position;
        }
    }

    /// Rotates the body about its centroid.
    ///
    /// History is rotated about its own centroid, so linear velocity is kept
    /// and no spin is added. Returns `false` when the engine is configured to
    /// freeze anchored bodies completely and this body is anchored.
    pub fn rotate(&mut self, degrees: f32) -> bool {
        if self.anchored && self.anchor_rotation == AnchorRotation::Inhibit {
            return false;
        }
        let center = self.center();
        let previous_center = centroid(&self.vertices.map(|v| v.previous_position));
        let radians = degrees.to_radians();
        for vertex in &mut self.vertices {
            vertex.position = rotate_about(vertex.position, center, radians);
            vertex.previous_position = rotate_about(vertex.previous_position, previous_center, radians);
        }
        true
    }

    /// Moves the centroid to `point`, leaving the body at rest.
    pub fn set_position(&mut self, point: Vec2) {
        let delta = point - self.center();
        for vertex in &mut self.vertices {
            vertex.set_position(vertex.position + delta);
        }
    }

    /// Rescales the panel about its centroid and re-targets every link.
    pub fn set_size(&mut self, size: Vec2) -> Result<()> {
        validate_size(size)?;
        let center = self.center();
        let corners = layout(center, size, self.rotation().to_radians());
        for (vertex, corner) in self.vertices.iter_mut().zip(corners) {
            let velocity = vertex.velocity();
            vertex.position = corner;
            vertex.previous_position = corner - velocity;
        }
        for constraint in &mut self.constraints {
            let a = self.vertices[constraint.a.index].position;
            let b = self.vertices[constraint.b.index].position;
            constraint.set_rest_length(a.distance(b));
        }
        Ok(())
    }

    /// Anchored bodies are never clamped to the canvas and raise no edge
    /// events, whatever this flag says.
    pub fn set_keep_in_canvas(&mut self, enabled: bool) {
        self.keep_in_canvas = enabled;
    }

    pub fn set_collidable(&mut self, enabled: bool) {
        self.collidable = enabled;
        if !enabled {
            self.touching.clear();
        }
    }

    /// Sets the remaining lifespan; the body is destroyed once it runs out.
    pub fn set_lifespan(&mut self, seconds: f32) -> Result<()> {
        validate_lifespan(seconds)?;
        self.lifespan = Some(seconds);
        Ok(())
    }

    pub fn clear_lifespan(&mut self) {
        self.lifespan = None;
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        validate_mass(mass)?;
        self.mass = mass;
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f32) -> Result<()> {
        validate_unit("friction", friction)?;
        self.material.friction = friction;
        Ok(())
    }

    pub fn set_elasticity(&mut self, elasticity: f32) -> Result<()> {
        validate_unit("elasticity", elasticity)?;
        self.material.elasticity = elasticity;
        Ok(())
    }

    pub fn set_air_friction(&mut self, air_friction: f32) -> Result<()> {
        validate_unit("air friction", air_friction)?;
        self.air_friction = air_friction;
        Ok(())
    }

    pub fn set_gravity_scale(&mut self, scale: f32) -> Result<()> {
        validate_gravity_scale(scale)?;
        self.gravity_scale = scale;
        Ok(())
    }

    /// Accumulates a force applied during the next step.
    pub fn apply_force(&mut self, force: Vec2) {
        if !self.anchored && force.is_finite() {
            self.force += force;
        }
    }

    /// Marks the body for removal at the end of the current or next step.
    /// Repeated calls are harmless.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Zero-area or self-intersecting shapes are skipped by the narrow phase.
    pub fn is_degenerate(&self) -> bool {
        let positions = self.positions();
        signed_area(&positions).abs() < DEGENERATE_AREA_EPSILON || !is_convex(&positions)
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex; QUAD_VERTICES] {
        &mut self.vertices
    }

    pub(crate) fn take_force(&mut self) -> Vec2 {
        std::mem::take(&mut self.force)
    }

    /// One Gauss-Seidel pass over the body's own links.
    pub(crate) fn relax(&mut self, first_pass: bool) {
        for constraint in &self.constraints {
            if !first_pass && !constraint.relaxes_every_pass() {
                continue;
            }
            if let Some((a, b)) = pair_mut(&mut self.vertices, constraint.a.index, constraint.b.index) {
                constraint.satisfy(a, b);
            }
        }
    }

    /// Moves every corner's position by `delta`, leaving history alone.
    pub(crate) fn shift(&mut self, delta: Vec2) {
        for vertex in &mut self.vertices {
            vertex.nudge(delta);
        }
    }

    pub(crate) fn clear_touching(&mut self) {
        self.touching.clear();
    }

    pub(crate) fn add_touching(&mut self, other: BodyId) {
        self.touching.insert(other);
    }

    /// Advances age and lifespan; returns `true` once the lifespan is used up.
    pub(crate) fn tick(&mut self, dt: f32) -> bool {
        self.age += dt;
        match self.lifespan.as_mut() {
            Some(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            None => false,
        }
    }
}

fn layout(center: Vec2, size: Vec2, radians: f32) -> [Vec2; QUAD_VERTICES] {
    let half = size * 0.5;
    CORNERS.map(|corner| rotate_about(center + corner * half, center, radians))
}
