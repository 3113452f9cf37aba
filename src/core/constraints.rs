use serde::{Deserialize, Serialize};

use super::vertex::{Vertex, VertexRef};
use crate::{
    config::LENGTH_EPSILON,
    error::{EngineError, Result},
};

/// Correction policy of a distance constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Holds the distance exactly, pushing and pulling.
    Rigid,
    /// Only pulls: acts when stretched past the rest length.
    Rope,
    /// Applies `stiffness` of the full correction per relaxation.
    Spring { stiffness: f32 },
}

impl ConstraintKind {
    fn correction_scale(&self) -> f32 {
        match self {
            ConstraintKind::Rigid | ConstraintKind::Rope => 1.0,
            ConstraintKind::Spring { stiffness } => *stiffness,
        }
    }
}

/// Distance relation between two vertices.
///
/// Body edges and braces are built by the body itself; custom constraints may
/// link vertices of two different bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub a: VertexRef,
    pub b: VertexRef,
    pub kind: ConstraintKind,
    rest_length: f32,
}

impl Constraint {
    pub fn new(a: VertexRef, b: VertexRef, kind: ConstraintKind, rest_length: f32) -> Result<Self> {
        if !rest_length.is_finite() || rest_length < 0.0 {
            return Err(EngineError::invalid(format!(
                "rest length must be a non-negative number, got {rest_length}"
            )));
        }
        if let ConstraintKind::Spring { stiffness } = kind {
            if !(stiffness > 0.0 && stiffness <= 1.0) {
                return Err(EngineError::invalid(format!(
                    "spring stiffness must be in (0, 1], got {stiffness}"
                )));
            }
        }
        if a == b {
            return Err(EngineError::invalid("constraint endpoints must differ"));
        }
        Ok(Self {
            a,
            b,
            kind,
            rest_length,
        })
    }

    /// Rigid edge used by body construction; inputs are trusted.
    pub(crate) fn rigid(a: VertexRef, b: VertexRef, rest_length: f32) -> Self {
        Self {
            a,
            b,
            kind: ConstraintKind::Rigid,
            rest_length,
        }
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Only `RigidBody::set_size` re-targets body edges.
    pub(crate) fn set_rest_length(&mut self, rest_length: f32) {
        self.rest_length = rest_length;
    }

    /// Springs are relaxed once per step; everything else on every pass.
    pub fn relaxes_every_pass(&self) -> bool {
        !matches!(self.kind, ConstraintKind::Spring { .. })
    }

    /// Moves the two endpoints toward the rest length.
    ///
    /// Returns the total displacement applied to the pair, zero when the
    /// constraint was already satisfied (or slack, for ropes).
    pub fn satisfy(&self, va: &mut Vertex, vb: &mut Vertex) -> f32 {
        let delta = vb.position - va.position;
        let length = delta.length();
        if length < LENGTH_EPSILON {
            return 0.0;
        }
        if matches!(self.kind, ConstraintKind::Rope) && length <= self.rest_length {
            return 0.0;
        }

        let (weight_a, weight_b) = match (va.anchored, vb.anchored) {
            (false, false) => (0.5, 0.5),
            (true, false) => (0.0, 1.0),
            (false, true) => (1.0, 0.0),
            (true, true) => return 0.0,
        };

        let correction = delta * ((length - self.rest_length) / length) * self.kind.correction_scale();
        va.nudge(correction * weight_a);
        vb.nudge(-correction * weight_b);
        correction.length() * (weight_a + weight_b)
    }
}
