//! Surface-surface intersection tracing.
//!
//! The tracer finds a curve where two parametric surfaces coincide. It works
//! entirely in the combined four-dimensional parameter space `(u1, v1, u2, v2)`
//! and proceeds in three phases: a coarse grid scan for a starting guess,
//! gradient-descent refinement onto the intersection, then a marching loop
//! that walks the curve in fixed arc-length steps.

mod trace;

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point3;
use crate::Tolerance;

pub use trace::trace_intersection;

/// One sample on an intersection curve, as parameter coordinates on both
/// surfaces. The 3-D position is recovered by evaluating either surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionPoint {
    pub u1: f64,
    pub v1: f64,
    pub u2: f64,
    pub v2: f64,
}

impl IntersectionPoint {
    pub(crate) fn as_vector(&self) -> Vector4<f64> {
        Vector4::new(self.u1, self.v1, self.u2, self.v2)
    }

    pub(crate) fn from_vector(x: &Vector4<f64>) -> Self {
        Self {
            u1: x[0],
            v1: x[1],
            u2: x[2],
            v2: x[3],
        }
    }
}

/// A traced intersection curve. `closed` means the last point connects back
/// to the first; an open curve terminated at a surface boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionCurve {
    pub points: Vec<IntersectionPoint>,
    pub closed: bool,
}

/// Tuning knobs for [`trace_intersection`].
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Arc-length distance between consecutive curve points, in model units.
    pub step: f64,
    /// Samples per parameter dimension in the initial grid scan.
    pub grid_resolution: usize,
    /// Iteration cap for the first-point gradient descent.
    pub max_refine_iters: usize,
    /// Iteration cap for each Newton solve while marching.
    pub max_newton_iters: usize,
    /// Squared-distance threshold below which two surface points coincide.
    pub tolerance: f64,
    /// Geometric comparison tolerances: `angular` bounds tangent
    /// degeneracy, `parametric` is the domain-boundary slack.
    pub geometric: Tolerance,
    /// Optional bias point: among grid candidates, prefer starts near it.
    pub guide: Option<Point3>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            grid_resolution: 15,
            max_refine_iters: 500,
            max_newton_iters: 30,
            tolerance: 1e-10,
            geometric: Tolerance::default(),
            guide: None,
        }
    }
}

impl TraceConfig {
    pub fn with_step(step: f64) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum TraceError {
    /// The grid scan produced no usable candidate, typically because a
    /// surface evaluated to non-finite coordinates everywhere.
    #[error("no starting point found on either surface")]
    NoStartingPoint,
    /// Gradient descent stalled before reaching the coincidence tolerance.
    /// The surfaces likely do not intersect.
    #[error("first point did not converge (residual {residual:.3e})")]
    FirstPointDiverged { residual: f64 },
    /// The surface normals are parallel at the traced point, so the curve
    /// direction is undefined (tangent surfaces, or a point contact).
    #[error("surfaces are tangent, intersection direction is undefined")]
    DegenerateTangent,
}
