//! Panel Physics – 2D Verlet engine for rectangular UI panels.
//!
//! Every body is a quadrilateral of four point-mass vertices held together by
//! rigid links. The crate integrates those vertices, relaxes the links and any
//! user constraints, resolves overlaps with a separating-axis test (optionally
//! accelerated by a quadtree), keeps flagged bodies inside the canvas and
//! reports events. Rendering is left to the host, which reads
//! [`Engine::snapshot`] after each step.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use collision::{
    broadphase::{BroadPhase, Quadtree},
    contact::Contact,
    narrowphase::NarrowPhase,
    resolver::CollisionResolver,
};
pub use config::{AnchorRotation, EngineConfig};
pub use core::{
    constraints::{Constraint, ConstraintKind},
    rigidbody::{BodySpec, RigidBody, QUAD_VERTICES},
    types::{Aabb, BodyId, ConstraintId, Material, MixingMode, VisualHandle},
    vertex::{Vertex, VertexRef},
};
pub use dynamics::{
    forces::{ConstantForce, DragForce, ForceGenerator, ForceRegistry},
    integrator::Integrator,
    solver::ConstraintSolver,
};
pub use engine::{BodySnapshot, Engine, EngineState, SharedEngine};
pub use error::{EngineError, Result};
pub use utils::{
    allocator::{Arena, EntityId, GenerationalId},
    profiling::StepProfile,
};
pub use world::{
    events::{BodyEvent, Commands, EventHandler},
    PhysicsWorld,
};
