//! Simulation dynamics: Verlet integration, external forces, and constraint relaxation.

pub mod forces;
pub mod integrator;
pub mod solver;

pub use forces::{ConstantForce, DragForce, ForceGenerator, ForceRegistry};
pub use integrator::Integrator;
pub use solver::ConstraintSolver;
