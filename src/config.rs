//! Global configuration constants and the engine configuration struct.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::types::{Aabb, MixingMode},
    error::{EngineError, Result},
};

/// Default gravity in canvas units per second squared (Y grows downward).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, 980.0];

/// Default canvas extent, anchored at the origin.
pub const DEFAULT_CANVAS_SIZE: [f32; 2] = [800.0, 600.0];

/// Relaxation passes per step for rigid and rope constraints.
pub const DEFAULT_CONSTRAINT_ITERATIONS: u32 = 1;

/// Narrow-phase passes per step when quadtrees are enabled.
pub const DEFAULT_COLLISION_ITERATIONS: u32 = 1;

/// Inclusive bounds for both iteration counts.
pub const MIN_ITERATIONS: u32 = 1;
pub const MAX_ITERATIONS: u32 = 10;

/// Occupants a quadtree region holds before it splits.
pub const DEFAULT_QUADTREE_CAPACITY: usize = 4;

/// Deepest level a quadtree region may split to.
pub const DEFAULT_QUADTREE_MAX_DEPTH: usize = 8;

/// Size of a body created without an explicit size.
pub const DEFAULT_BODY_SIZE: [f32; 2] = [100.0, 100.0];

pub const DEFAULT_MASS: f32 = 1.0;
pub const DEFAULT_FRICTION: f32 = 0.5;
pub const DEFAULT_ELASTICITY: f32 = 0.5;

/// Bodies whose area falls below this are treated as degenerate.
pub const DEGENERATE_AREA_EPSILON: f32 = 1e-4;

/// Lengths below this are treated as coincident points.
pub const LENGTH_EPSILON: f32 = 1e-6;

/// Whether anchored bodies may still be rotated programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AnchorRotation {
    /// Anchoring freezes translation only.
    #[default]
    Allow,
    /// Anchoring freezes the body completely; `rotate` becomes a no-op.
    Inhibit,
}

/// Engine-wide settings, validated once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub canvas: Aabb,
    pub gravity: Vec2,
    pub constraint_iterations: u32,
    pub collision_iterations: u32,
    pub use_quadtrees: bool,
    pub quadtree_capacity: usize,
    pub quadtree_max_depth: usize,
    pub anchor_rotation: AnchorRotation,
    pub friction_mixing: MixingMode,
    pub elasticity_mixing: MixingMode,
    /// Integrate vertices on the rayon pool (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas: Aabb::new(Vec2::ZERO, Vec2::from_array(DEFAULT_CANVAS_SIZE)),
            gravity: Vec2::from_array(DEFAULT_GRAVITY),
            constraint_iterations: DEFAULT_CONSTRAINT_ITERATIONS,
            collision_iterations: DEFAULT_COLLISION_ITERATIONS,
            use_quadtrees: false,
            quadtree_capacity: DEFAULT_QUADTREE_CAPACITY,
            quadtree_max_depth: DEFAULT_QUADTREE_MAX_DEPTH,
            anchor_rotation: AnchorRotation::default(),
            friction_mixing: MixingMode::default(),
            elasticity_mixing: MixingMode::default(),
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Default configuration over a canvas of the given size.
    pub fn with_canvas_size(width: f32, height: f32) -> Self {
        Self {
            canvas: Aabb::new(Vec2::ZERO, Vec2::new(width, height)),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_canvas(&self.canvas)?;
        if !self.gravity.is_finite() {
            return Err(EngineError::invalid("gravity must be finite"));
        }
        validate_iterations("constraint", self.constraint_iterations)?;
        validate_iterations("collision", self.collision_iterations)?;
        if self.quadtree_capacity == 0 {
            return Err(EngineError::invalid("quadtree capacity must be at least 1"));
        }
        if self.quadtree_max_depth == 0 {
            return Err(EngineError::invalid("quadtree max depth must be at least 1"));
        }
        Ok(())
    }
}

pub(crate) fn validate_iterations(kind: &str, n: u32) -> Result<()> {
    if (MIN_ITERATIONS..=MAX_ITERATIONS).contains(&n) {
        Ok(())
    } else {
        Err(EngineError::invalid(format!(
            "{kind} iterations must be in [{MIN_ITERATIONS}, {MAX_ITERATIONS}], got {n}"
        )))
    }
}

pub(crate) fn validate_canvas(canvas: &Aabb) -> Result<()> {
    if !canvas.min.is_finite() || !canvas.max.is_finite() {
        return Err(EngineError::invalid("canvas bounds must be finite"));
    }
    if canvas.max.x <= canvas.min.x || canvas.max.y <= canvas.min.y {
        return Err(EngineError::invalid("canvas must have positive width and height"));
    }
    Ok(())
}
