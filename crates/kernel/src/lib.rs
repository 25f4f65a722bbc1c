pub mod geometry;
pub mod intersection;

pub use geometry::{ParametricSurface, Point3, Vec3};
pub use intersection::{
    trace_intersection, IntersectionCurve, IntersectionPoint, TraceConfig, TraceError,
};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
    /// Parameter-space tolerance for domain membership tests.
    pub parametric: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-10,
            parametric: 1e-9,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }
}
