//! Core entities: vertices, distance constraints, quadrilateral bodies, and shared types.

pub mod constraints;
pub mod rigidbody;
pub mod types;
pub mod vertex;

pub use constraints::{Constraint, ConstraintKind};
pub use rigidbody::{BodySpec, RigidBody, QUAD_VERTICES};
pub use types::{Aabb, BodyId, ConstraintId, Material, MixingMode, VisualHandle};
pub use vertex::{Vertex, VertexRef};
