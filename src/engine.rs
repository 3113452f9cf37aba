//! Public entry point: lifecycle state, validation, and shared access.

use std::sync::Arc;

use glam::Vec2;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    config::{validate_iterations, EngineConfig},
    core::{
        constraints::{Constraint, ConstraintKind},
        rigidbody::{BodySpec, RigidBody, QUAD_VERTICES},
        types::{Aabb, BodyId, ConstraintId, VisualHandle},
        vertex::VertexRef,
    },
    dynamics::forces::ForceGenerator,
    error::{EngineError, Result},
    utils::profiling::StepProfile,
    world::{
        events::{BodyEvent, Commands},
        PhysicsWorld,
    },
};

/// An engine behind one exclusive lock, for hosts that step from several threads.
pub type SharedEngine = Arc<Mutex<Engine>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Between steps; every call is accepted.
    Idle,
    /// Inside [`Engine::step`].
    Stepping,
    /// Torn down. Mutating calls fail and lookups find nothing.
    ShutDown,
}

/// Per-body state handed to an external renderer after each step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub visual: VisualHandle,
    pub center: Vec2,
    /// Degrees.
    pub rotation: f32,
    pub size: Vec2,
}

/// Panel physics engine.
///
/// Owns a [`PhysicsWorld`] and guards it with argument validation and the
/// `Idle -> Stepping -> Idle` / `ShutDown` state machine.
pub struct Engine {
    world: PhysicsWorld,
    state: EngineState,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "engine created: canvas {:?}, quadtrees {}",
            config.canvas, config.use_quadtrees
        );
        Ok(Self {
            world: PhysicsWorld::new(&config),
            state: EngineState::Idle,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state {
            EngineState::ShutDown => Err(EngineError::InvalidState("engine has been shut down")),
            EngineState::Stepping => Err(EngineError::InvalidState("engine is stepping")),
            EngineState::Idle => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.state != EngineState::ShutDown
    }

    /// Registers a new body laid out from `spec`.
    pub fn create(&mut self, spec: BodySpec) -> Result<BodyId> {
        self.ensure_running()?;
        spec.validate()?;
        Ok(self.world.add_body(&spec))
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        self.ensure_running()?;
        if !dt.is_finite() || dt < 0.0 {
            return Err(EngineError::invalid(format!(
                "time step must be a non-negative number, got {dt}"
            )));
        }
        self.state = EngineState::Stepping;
        self.world.step(dt);
        self.state = EngineState::Idle;
        Ok(())
    }

    pub fn constraint_iterations(&self) -> u32 {
        self.world.constraint_iterations()
    }

    pub fn set_constraint_iterations(&mut self, iterations: u32) -> Result<()> {
        self.ensure_running()?;
        validate_iterations("constraint", iterations)?;
        self.world.set_constraint_iterations(iterations);
        Ok(())
    }

    pub fn collision_iterations(&self) -> u32 {
        self.world.collision_iterations()
    }

    /// Number of narrow-phase passes per step. Stored regardless, but only
    /// used while quadtrees are enabled.
    pub fn set_collision_iterations(&mut self, iterations: u32) -> Result<()> {
        self.ensure_running()?;
        validate_iterations("collision", iterations)?;
        if !self.world.use_quadtrees() {
            warn!("collision iterations set to {iterations} while quadtrees are disabled; one pass will run");
        }
        self.world.set_collision_iterations(iterations);
        Ok(())
    }

    pub fn quadtrees_enabled(&self) -> bool {
        self.world.use_quadtrees()
    }

    pub fn use_quadtrees(&mut self, enabled: bool) -> Result<()> {
        self.ensure_running()?;
        self.world.set_use_quadtrees(enabled);
        Ok(())
    }

    pub fn gravity(&self) -> Vec2 {
        self.world.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<()> {
        self.ensure_running()?;
        if !gravity.is_finite() {
            return Err(EngineError::invalid("gravity must be finite"));
        }
        self.world.gravity = gravity;
        Ok(())
    }

    pub fn canvas(&self) -> Aabb {
        self.world.canvas
    }

    /// Adds an engine-wide force applied to every body each step.
    pub fn add_force<F: ForceGenerator + 'static>(&mut self, force: F) -> Result<()> {
        self.ensure_running()?;
        self.world.force_registry.add_force(force);
        Ok(())
    }

    /// Looks up a live body. Destroyed or unknown ids yield `None`.
    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        if !self.is_running() {
            return None;
        }
        self.world.bodies.get(id).filter(|body| !body.is_destroyed())
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        if !self.is_running() {
            return None;
        }
        self.world.bodies.get_mut(id).filter(|body| !body.is_destroyed())
    }

    /// Live bodies in id order.
    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> + '_ {
        self.world.bodies.values().filter(|body| !body.is_destroyed())
    }

    pub fn body_count(&self) -> usize {
        self.bodies().count()
    }

    /// Removes a body right away. Unknown, already destroyed, or post-shutdown
    /// ids are ignored.
    pub fn destroy(&mut self, id: BodyId) {
        if self.state != EngineState::Idle {
            return;
        }
        self.world.destroy_now(id);
    }

    /// Links two vertices, possibly of different bodies.
    ///
    /// Without `rest_length` the current distance between the vertices is used.
    pub fn create_constraint(
        &mut self,
        a: VertexRef,
        b: VertexRef,
        kind: ConstraintKind,
        rest_length: Option<f32>,
    ) -> Result<ConstraintId> {
        self.ensure_running()?;
        let pa = self.vertex_position(a)?;
        let pb = self.vertex_position(b)?;
        let rest = rest_length.unwrap_or_else(|| pa.distance(pb));
        let constraint = Constraint::new(a, b, kind, rest)?;
        Ok(self.world.add_constraint(constraint))
    }

    fn vertex_position(&self, vertex: VertexRef) -> Result<Vec2> {
        let body = self
            .body(vertex.body)
            .ok_or_else(|| EngineError::UnknownIdentifier(format!("body {}", vertex.body)))?;
        if vertex.index >= QUAD_VERTICES {
            return Err(EngineError::UnknownIdentifier(format!(
                "vertex {} of body {}",
                vertex.index, vertex.body
            )));
        }
        Ok(body.vertices()[vertex.index].position)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        if !self.is_running() {
            return None;
        }
        self.world.constraints.get(id)
    }

    /// Returns `false` if the constraint did not exist.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        if self.state != EngineState::Idle {
            return false;
        }
        self.world.constraints.remove(id).is_some()
    }

    /// Calls `handler` for every body `id` overlapped during a step.
    pub fn on_touched<F>(&mut self, id: BodyId, handler: F) -> Result<()>
    where
        F: FnMut(&BodyEvent, &mut Commands) + Send + 'static,
    {
        self.ensure_running()?;
        self.require_body(id)?;
        self.world.events.subscribe_touched(id, Box::new(handler));
        Ok(())
    }

    /// Calls `handler` on every step where `id` was pushed back into the canvas.
    pub fn on_canvas_edge_touched<F>(&mut self, id: BodyId, handler: F) -> Result<()>
    where
        F: FnMut(&BodyEvent, &mut Commands) + Send + 'static,
    {
        self.ensure_running()?;
        self.require_body(id)?;
        self.world.events.subscribe_canvas_edge(id, Box::new(handler));
        Ok(())
    }

    /// Calls `handler` whenever any body leaves the registry.
    pub fn on_body_destroyed<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(&BodyEvent, &mut Commands) + Send + 'static,
    {
        self.ensure_running()?;
        self.world.events.subscribe_destroyed(Box::new(handler));
        Ok(())
    }

    fn require_body(&self, id: BodyId) -> Result<()> {
        match self.body(id) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownIdentifier(format!("body {id}"))),
        }
    }

    /// Events delivered during the last step.
    pub fn last_events(&self) -> &[BodyEvent] {
        self.world.last_events()
    }

    pub fn profile(&self) -> &StepProfile {
        self.world.profile()
    }

    /// Render-ready state of every live body.
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies()
            .map(|body| BodySnapshot {
                id: body.id(),
                visual: body.frame(),
                center: body.center(),
                rotation: body.rotation(),
                size: body.size(),
            })
            .collect()
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Destroys every body and refuses further work. Repeated calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.state == EngineState::ShutDown {
            return;
        }
        self.world.destroy_all();
        self.world.constraints.clear();
        self.world.force_registry.clear();
        self.world.events.clear();
        self.state = EngineState::ShutDown;
        debug!("engine shut down");
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
