use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use super::{ParametricSurface, Point3, Vec3};

/// Build an orthonormal frame `(x_dir, y_dir, axis)` around a unit axis.
fn axis_frame(axis: &Vec3) -> (Vec3, Vec3) {
    let seed = if axis.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    let x_dir = seed.cross(axis).normalize();
    let y_dir = axis.cross(&x_dir);
    (x_dir, y_dir)
}

// ─── Plane patch ─────────────────────────────────────────────────────────────

/// A finite planar patch: `origin + u * u_axis + v * v_axis` over
/// `[0, u_extent] x [0, v_extent]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanePatch {
    pub origin: Point3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub u_extent: f64,
    pub v_extent: f64,
}

impl PlanePatch {
    pub fn new(origin: Point3, u_axis: Vec3, v_axis: Vec3, u_extent: f64, v_extent: f64) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
            u_extent,
            v_extent,
        }
    }

    /// An axis-aligned patch in the `z = origin.z` plane.
    pub fn horizontal(origin: Point3, u_extent: f64, v_extent: f64) -> Self {
        Self::new(origin, Vec3::x(), Vec3::y(), u_extent, v_extent)
    }
}

impl ParametricSurface for PlanePatch {
    fn point(&self, u: f64, v: f64) -> Point3 {
        self.origin + self.u_axis * u + self.v_axis * v
    }

    fn du(&self, _u: f64, _v: f64) -> Vec3 {
        self.u_axis
    }

    fn dv(&self, _u: f64, _v: f64) -> Vec3 {
        self.v_axis
    }

    fn max_u(&self) -> f64 {
        self.u_extent
    }

    fn max_v(&self) -> f64 {
        self.v_extent
    }
}

// ─── Sphere ──────────────────────────────────────────────────────────────────

/// A sphere parameterized by longitude `u` in `[0, 2*PI]` (closed) and
/// colatitude `v` in `[0, PI]` measured from the +Z pole.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl ParametricSurface for Sphere {
    fn point(&self, u: f64, v: f64) -> Point3 {
        let sin_v = v.sin();
        self.center
            + Vec3::new(
                self.radius * sin_v * u.cos(),
                self.radius * sin_v * u.sin(),
                self.radius * v.cos(),
            )
    }

    fn du(&self, u: f64, v: f64) -> Vec3 {
        let sin_v = v.sin();
        Vec3::new(
            -self.radius * sin_v * u.sin(),
            self.radius * sin_v * u.cos(),
            0.0,
        )
    }

    fn dv(&self, u: f64, v: f64) -> Vec3 {
        let (sin_v, cos_v) = v.sin_cos();
        Vec3::new(
            self.radius * cos_v * u.cos(),
            self.radius * cos_v * u.sin(),
            -self.radius * sin_v,
        )
    }

    fn max_u(&self) -> f64 {
        TAU
    }

    fn max_v(&self) -> f64 {
        PI
    }

    fn closed_u(&self) -> bool {
        true
    }
}

// ─── Torus ───────────────────────────────────────────────────────────────────

/// A torus around an arbitrary axis. `u` runs around the main ring, `v`
/// around the tube; both directions are closed with period `2*PI`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Torus {
    pub center: Point3,
    pub axis: Vec3,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl Torus {
    pub fn new(center: Point3, axis: Vec3, major_radius: f64, minor_radius: f64) -> Self {
        Self {
            center,
            axis: axis.normalize(),
            major_radius,
            minor_radius,
        }
    }

    /// Torus around the Z axis.
    pub fn upright(center: Point3, major_radius: f64, minor_radius: f64) -> Self {
        Self::new(center, Vec3::z(), major_radius, minor_radius)
    }
}

impl ParametricSurface for Torus {
    fn point(&self, u: f64, v: f64) -> Point3 {
        let (x_dir, y_dir) = axis_frame(&self.axis);
        let ring = self.major_radius + self.minor_radius * v.cos();
        self.center
            + x_dir * (ring * u.cos())
            + y_dir * (ring * u.sin())
            + self.axis * (self.minor_radius * v.sin())
    }

    fn du(&self, u: f64, v: f64) -> Vec3 {
        let (x_dir, y_dir) = axis_frame(&self.axis);
        let ring = self.major_radius + self.minor_radius * v.cos();
        x_dir * (-ring * u.sin()) + y_dir * (ring * u.cos())
    }

    fn dv(&self, u: f64, v: f64) -> Vec3 {
        let (x_dir, y_dir) = axis_frame(&self.axis);
        let (sin_v, cos_v) = v.sin_cos();
        let radial = -self.minor_radius * sin_v;
        x_dir * (radial * u.cos()) + y_dir * (radial * u.sin()) + self.axis * (self.minor_radius * cos_v)
    }

    fn max_u(&self) -> f64 {
        TAU
    }

    fn max_v(&self) -> f64 {
        TAU
    }

    fn closed_u(&self) -> bool {
        true
    }

    fn closed_v(&self) -> bool {
        true
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Tests
// ═════════════════════════════════════════════════════════════════════════════
