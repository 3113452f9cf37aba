//! Collision detection and response: quadtree broad-phase, SAT narrow-phase, positional resolution.

pub mod broadphase;
pub mod contact;
pub mod narrowphase;
pub mod resolver;

pub use broadphase::{BroadPhase, Quadtree};
pub use contact::Contact;
pub use narrowphase::NarrowPhase;
pub use resolver::CollisionResolver;
