use serde::{Deserialize, Serialize};

use super::{ParametricSurface, Point3, Vec3};

/// Cubic Bernstein basis at `t`.
fn bernstein(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

/// Derivative of the cubic Bernstein basis at `t`.
fn bernstein_derivative(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [
        -3.0 * s * s,
        3.0 * s * s - 6.0 * t * s,
        6.0 * t * s - 3.0 * t * t,
        3.0 * t * t,
    ]
}

/// A single bicubic Bézier patch over a 4x4 control grid, parameterized on
/// `[0, 1] x [0, 1]`. `control[i][j]` is the point at row `i` (the `u`
/// direction) and column `j` (the `v` direction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BezierPatch {
    pub control: [[Point3; 4]; 4],
}

impl BezierPatch {
    pub fn new(control: [[Point3; 4]; 4]) -> Self {
        Self { control }
    }

    /// A flat patch spanning `[0, width] x [0, height]` at `z = 0`,
    /// convenient as a test fixture.
    pub fn flat(width: f64, height: f64) -> Self {
        let mut control = [[Point3::origin(); 4]; 4];
        for (i, row) in control.iter_mut().enumerate() {
            for (j, point) in row.iter_mut().enumerate() {
                *point = Point3::new(width * i as f64 / 3.0, height * j as f64 / 3.0, 0.0);
            }
        }
        Self { control }
    }

    fn weighted_sum(&self, wu: [f64; 4], wv: [f64; 4]) -> Vec3 {
        let mut sum = Vec3::zeros();
        for i in 0..4 {
            for j in 0..4 {
                sum += self.control[i][j].coords * (wu[i] * wv[j]);
            }
        }
        sum
    }
}

impl ParametricSurface for BezierPatch {
    fn point(&self, u: f64, v: f64) -> Point3 {
        Point3::from(self.weighted_sum(bernstein(u), bernstein(v)))
    }

    fn du(&self, u: f64, v: f64) -> Vec3 {
        self.weighted_sum(bernstein_derivative(u), bernstein(v))
    }

    fn dv(&self, u: f64, v: f64) -> Vec3 {
        self.weighted_sum(bernstein(u), bernstein_derivative(v))
    }

    fn max_u(&self) -> f64 {
        1.0
    }

    fn max_v(&self) -> f64 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corners_interpolate_control_points() {
        let mut control = [[Point3::origin(); 4]; 4];
        for (i, row) in control.iter_mut().enumerate() {
            for (j, point) in row.iter_mut().enumerate() {
                *point = Point3::new(i as f64, j as f64, (i * j) as f64);
            }
        }
        let patch = BezierPatch::new(control);

        assert_relative_eq!(patch.point(0.0, 0.0), control[0][0], epsilon = 1e-12);
        assert_relative_eq!(patch.point(1.0, 0.0), control[3][0], epsilon = 1e-12);
        assert_relative_eq!(patch.point(0.0, 1.0), control[0][3], epsilon = 1e-12);
        assert_relative_eq!(patch.point(1.0, 1.0), control[3][3], epsilon = 1e-12);
    }

    #[test]
    fn flat_patch_is_planar() {
        let patch = BezierPatch::flat(3.0, 2.0);
        for i in 0..=5 {
            for j in 0..=5 {
                let p = patch.point(i as f64 / 5.0, j as f64 / 5.0);
                assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
            }
        }
        // A flat grid with evenly spaced control points parameterizes
        // linearly.
        assert_relative_eq!(patch.point(0.5, 0.5), Point3::new(1.5, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn partials_match_finite_differences() {
        let mut control = [[Point3::origin(); 4]; 4];
        for (i, row) in control.iter_mut().enumerate() {
            for (j, point) in row.iter_mut().enumerate() {
                *point = Point3::new(
                    i as f64,
                    j as f64,
                    ((i + 1) * (j + 2)) as f64 * 0.1,
                );
            }
        }
        let patch = BezierPatch::new(control);

        let (u, v) = (0.37, 0.62);
        let h = 1e-6;
        let fd_du = (patch.point(u + h, v) - patch.point(u - h, v)) / (2.0 * h);
        let fd_dv = (patch.point(u, v + h) - patch.point(u, v - h)) / (2.0 * h);
        assert_relative_eq!(patch.du(u, v), fd_du, epsilon = 1e-6, max_relative = 1e-5);
        assert_relative_eq!(patch.dv(u, v), fd_dv, epsilon = 1e-6, max_relative = 1e-5);
    }

    #[test]
    fn bernstein_partition_of_unity() {
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            let sum: f64 = bernstein(t).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            let dsum: f64 = bernstein_derivative(t).iter().sum();
            assert_relative_eq!(dsum, 0.0, epsilon = 1e-12);
        }
    }
}
