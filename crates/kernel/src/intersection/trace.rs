use nalgebra::{Matrix4, RowVector4, Vector4};
use tracing::{debug, info, warn};

use super::{IntersectionCurve, IntersectionPoint, TraceConfig, TraceError};
use crate::geometry::{ParametricSurface, Point3, Vec3};

/// Hard cap on curve length, in points. A march that runs this long without
/// closing or leaving a domain is stuck orbiting.
const MAX_CURVE_POINTS: usize = 50_000;

/// Trace the intersection curve of two surfaces.
///
/// The returned curve lies in the parameter domains of both surfaces. An
/// open curve means the trace ran off the boundary of at least one surface;
/// a closed one loops back onto its first point.
pub fn trace_intersection(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    cfg: &TraceConfig,
) -> Result<IntersectionCurve, TraceError> {
    let seed = grid_scan(a, b, cfg)?;
    let start = refine_first_point(a, b, cfg, seed)?;

    let first = IntersectionPoint::from_vector(&start);
    let first_pos = a.point(first.u1, first.v1);
    let tangent = curve_tangent(a, b, &first, cfg.geometric.angular)
        .ok_or(TraceError::DegenerateTangent)?;

    let (forward, closed) = march(a, b, cfg, &first, &first_pos, tangent);

    let mut points = Vec::with_capacity(forward.len() + 1);
    let closed = if closed {
        points.push(first);
        points.extend(forward);
        true
    } else {
        // The curve left a boundary going forward; pick up whatever lies on
        // the other side of the first point.
        let (backward, closed_backward) = march(a, b, cfg, &first, &first_pos, -tangent);
        points.extend(backward.into_iter().rev());
        points.push(first);
        points.extend(forward);
        closed_backward
    };

    if points.len() < 2 {
        return Err(TraceError::DegenerateTangent);
    }

    info!(points = points.len(), closed, "traced intersection curve");
    Ok(IntersectionCurve { points, closed })
}

// ─── Phase 1: grid scan ──────────────────────────────────────────────────────

/// Exhaustively sample both parameter domains and return the pair of
/// parameter points whose surface points are closest (optionally biased
/// toward `cfg.guide`).
fn grid_scan(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    cfg: &TraceConfig,
) -> Result<Vector4<f64>, TraceError> {
    let samples_a = sample_grid(a, cfg.grid_resolution);
    let samples_b = sample_grid(b, cfg.grid_resolution);

    let mut best: Option<(f64, Vector4<f64>)> = None;
    for &(u1, v1, p1) in &samples_a {
        for &(u2, v2, p2) in &samples_b {
            let mut score = (p1 - p2).norm_squared();
            if let Some(guide) = cfg.guide {
                let mid = Point3::from((p1.coords + p2.coords) * 0.5);
                score += (mid - guide).norm_squared();
            }
            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(best_score, _)| score < best_score) {
                best = Some((score, Vector4::new(u1, v1, u2, v2)));
            }
        }
    }

    match best {
        Some((score, x)) => {
            debug!(score, "grid scan candidate");
            Ok(x)
        }
        None => Err(TraceError::NoStartingPoint),
    }
}

fn sample_grid(surface: &dyn ParametricSurface, resolution: usize) -> Vec<(f64, f64, Point3)> {
    let resolution = resolution.max(2);
    let mut samples = Vec::with_capacity(resolution * resolution);
    for i in 0..resolution {
        let u = surface.max_u() * i as f64 / (resolution - 1) as f64;
        for j in 0..resolution {
            let v = surface.max_v() * j as f64 / (resolution - 1) as f64;
            samples.push((u, v, surface.point(u, v)));
        }
    }
    samples
}

// ─── Phase 2: first-point refinement ─────────────────────────────────────────

/// Push the grid candidate onto the intersection by damped gradient descent
/// on the squared distance between the two surface points.
fn refine_first_point(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    cfg: &TraceConfig,
    seed: Vector4<f64>,
) -> Result<Vector4<f64>, TraceError> {
    let mut x = seed;
    let mut residual = coincidence_residual(a, b, &x);
    let mut lambda = 1.0;

    for iteration in 0..cfg.max_refine_iters {
        if residual < cfg.tolerance {
            debug!(iteration, residual, "first point converged");
            return Ok(x);
        }

        let g = residual_gradient(a, b, &x);
        if g.norm_squared() < 1e-30 {
            break;
        }

        // Backtrack: grow the damping factor until the residual decreases.
        let mut accepted = false;
        for _ in 0..25 {
            let candidate = clamp_into_domains(a, b, x - g / lambda);
            let candidate_residual = coincidence_residual(a, b, &candidate);
            if candidate_residual.is_finite() && candidate_residual < residual {
                x = candidate;
                residual = candidate_residual;
                lambda = (lambda / 10.0).max(1e-10);
                accepted = true;
                break;
            }
            lambda *= 10.0;
        }
        if !accepted {
            break;
        }
    }

    if residual < cfg.tolerance {
        Ok(x)
    } else {
        Err(TraceError::FirstPointDiverged { residual })
    }
}

/// Squared distance between the two surface points at `x`.
fn coincidence_residual(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    x: &Vector4<f64>,
) -> f64 {
    (a.point(x[0], x[1]) - b.point(x[2], x[3])).norm_squared()
}

/// Analytic gradient of [`coincidence_residual`] with respect to all four
/// parameters.
fn residual_gradient(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    x: &Vector4<f64>,
) -> Vector4<f64> {
    let d = a.point(x[0], x[1]) - b.point(x[2], x[3]);
    Vector4::new(
        2.0 * d.dot(&a.du(x[0], x[1])),
        2.0 * d.dot(&a.dv(x[0], x[1])),
        -2.0 * d.dot(&b.du(x[2], x[3])),
        -2.0 * d.dot(&b.dv(x[2], x[3])),
    )
}

/// Bring all four parameters back into their domains: wrap closed directions,
/// clamp open ones.
fn clamp_into_domains(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    x: Vector4<f64>,
) -> Vector4<f64> {
    let (u1, v1) = normalize_params(a, x[0], x[1]);
    let (u2, v2) = normalize_params(b, x[2], x[3]);
    Vector4::new(u1, v1, u2, v2)
}

fn normalize_params(surface: &dyn ParametricSurface, u: f64, v: f64) -> (f64, f64) {
    let u = if surface.closed_u() {
        u.rem_euclid(surface.max_u())
    } else {
        u.clamp(0.0, surface.max_u())
    };
    let v = if surface.closed_v() {
        v.rem_euclid(surface.max_v())
    } else {
        v.clamp(0.0, surface.max_v())
    };
    (u, v)
}

// ─── Phase 3: marching ───────────────────────────────────────────────────────

/// Direction of the intersection curve at a point: the cross product of the
/// two surface normals. `None` where the normals are parallel or degenerate
/// within the angular tolerance.
fn curve_tangent(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    p: &IntersectionPoint,
    angular: f64,
) -> Option<Vec3> {
    let n1 = a.normal(p.u1, p.v1);
    let n2 = b.normal(p.u2, p.v2);
    n1.cross(&n2).try_normalize(angular)
}

/// Walk the curve from `first` in the direction of `tangent`, one arc-length
/// step at a time. Returns the points found after `first` (exclusive) and
/// whether the march closed back onto `first`.
fn march(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    cfg: &TraceConfig,
    first: &IntersectionPoint,
    first_pos: &Point3,
    mut tangent: Vec3,
) -> (Vec<IntersectionPoint>, bool) {
    let mut points: Vec<IntersectionPoint> = Vec::new();
    let mut prev = *first;
    let mut prev_pos = *first_pos;

    loop {
        if points.len() >= MAX_CURVE_POINTS {
            warn!(points = points.len(), "curve trace hit point cap without closing");
            return (points, false);
        }

        // Halve the step on Newton failure; sharp turns need shorter steps.
        let mut step = cfg.step;
        let mut next = None;
        while step >= cfg.step / 1024.0 {
            if let Some(x) = newton_step(a, b, cfg, &prev_pos, &tangent, prev.as_vector(), step) {
                next = Some(x);
                break;
            }
            step *= 0.5;
        }
        let Some(x) = next else {
            return (points, false);
        };

        let slack = cfg.geometric.parametric;
        if leaves_open_domain(a, x[0], x[1], slack) || leaves_open_domain(b, x[2], x[3], slack) {
            return (points, false);
        }
        let x = clamp_into_domains(a, b, x);
        let point = IntersectionPoint::from_vector(&x);
        let pos = a.point(point.u1, point.v1);

        // Closed curve: back within one full step of the start, once the
        // curve is long enough that this cannot be the takeoff.
        if points.len() >= 2 && (pos - first_pos).norm() < cfg.step {
            points.push(point);
            return (points, true);
        }

        let Some(mut new_tangent) = curve_tangent(a, b, &point, cfg.geometric.angular) else {
            return (points, false);
        };
        // The cross product can flip sign across the curve; keep heading the
        // same way we came.
        if new_tangent.dot(&tangent) < -0.5 {
            new_tangent = -new_tangent;
        }

        points.push(point);
        prev = point;
        prev_pos = pos;
        tangent = new_tangent;
    }
}

/// Solve for the next curve point: three coincidence equations plus an
/// arc-length equation pinning the new point `step` along `tangent` from
/// `prev_pos`. Newton iteration with the analytic Jacobian.
fn newton_step(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    cfg: &TraceConfig,
    prev_pos: &Point3,
    tangent: &Vec3,
    start: Vector4<f64>,
    step: f64,
) -> Option<Vector4<f64>> {
    let mut x = start;

    for _ in 0..cfg.max_newton_iters {
        let p1 = a.point(x[0], x[1]);
        let p2 = b.point(x[2], x[3]);
        let d = p1 - p2;
        let advance = tangent.dot(&(p1 - prev_pos)) - step;
        let residual = d.norm_squared() + advance * advance;
        if !residual.is_finite() {
            return None;
        }
        if residual < cfg.tolerance {
            return Some(x);
        }

        let du1 = a.du(x[0], x[1]);
        let dv1 = a.dv(x[0], x[1]);
        let du2 = b.du(x[2], x[3]);
        let dv2 = b.dv(x[2], x[3]);
        let jacobian = Matrix4::from_rows(&[
            RowVector4::new(du1.x, dv1.x, -du2.x, -dv2.x),
            RowVector4::new(du1.y, dv1.y, -du2.y, -dv2.y),
            RowVector4::new(du1.z, dv1.z, -du2.z, -dv2.z),
            RowVector4::new(tangent.dot(&du1), tangent.dot(&dv1), 0.0, 0.0),
        ]);
        let rhs = Vector4::new(-d.x, -d.y, -d.z, -advance);
        let delta = jacobian.lu().solve(&rhs)?;
        if !delta.iter().all(|c| c.is_finite()) {
            return None;
        }
        x += delta;
    }

    None
}

/// Whether `(u, v)` has left the domain in a direction the surface does not
/// wrap around. `slack` keeps points sitting numerically on a boundary from
/// being treated as outside.
fn leaves_open_domain(surface: &dyn ParametricSurface, u: f64, v: f64, slack: f64) -> bool {
    (!surface.closed_u() && !(-slack..=surface.max_u() + slack).contains(&u))
        || (!surface.closed_v() && !(-slack..=surface.max_v() + slack).contains(&v))
}
