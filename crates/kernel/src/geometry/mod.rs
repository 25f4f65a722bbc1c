pub mod bezier;
pub mod surfaces;

pub use bezier::BezierPatch;
pub use surfaces::{PlanePatch, Sphere, Torus};

pub type Point3 = nalgebra::Point3<f64>;
pub type Vec3 = nalgebra::Vector3<f64>;

/// The capability a surface must expose to the intersection tracer:
/// point evaluation, first partial derivatives, and the parameter domain
/// `[0, max_u] x [0, max_v]`.
///
/// Implementations evaluate the underlying analytic formulas for any
/// `(u, v)`; domain enforcement is the caller's job via [`contains`].
/// Directions in which the surface is topologically closed (a torus in both,
/// a sphere in longitude) report that through `closed_u`/`closed_v`, and the
/// caller is responsible for wrap-around continuity — no wrapping happens
/// here.
///
/// [`contains`]: ParametricSurface::contains
pub trait ParametricSurface {
    fn point(&self, u: f64, v: f64) -> Point3;

    /// Partial derivative with respect to `u`.
    fn du(&self, u: f64, v: f64) -> Vec3;

    /// Partial derivative with respect to `v`.
    fn dv(&self, u: f64, v: f64) -> Vec3;

    fn max_u(&self) -> f64;

    fn max_v(&self) -> f64;

    /// Whether the surface closes onto itself in the `u` direction.
    fn closed_u(&self) -> bool {
        false
    }

    fn closed_v(&self) -> bool {
        false
    }

    /// Unit normal, `du x dv` normalized. Zero where the parameterization is
    /// degenerate (e.g. sphere poles); callers that care must check.
    fn normal(&self, u: f64, v: f64) -> Vec3 {
        self.du(u, v)
            .cross(&self.dv(u, v))
            .try_normalize(1e-12)
            .unwrap_or_else(Vec3::zeros)
    }

    fn contains(&self, u: f64, v: f64) -> bool {
        (0.0..=self.max_u()).contains(&u) && (0.0..=self.max_v()).contains(&v)
    }
}
