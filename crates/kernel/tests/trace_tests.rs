use cad_kernel::geometry::{ParametricSurface, PlanePatch, Point3, Sphere, Torus, Vec3};
use cad_kernel::intersection::{trace_intersection, IntersectionCurve, TraceConfig, TraceError};

/// Every traced point must evaluate to (nearly) the same 3-D position on
/// both surfaces and lie inside both parameter domains.
fn assert_curve_on_both(
    a: &dyn ParametricSurface,
    b: &dyn ParametricSurface,
    curve: &IntersectionCurve,
) {
    for p in &curve.points {
        let pa = a.point(p.u1, p.v1);
        let pb = b.point(p.u2, p.v2);
        let gap = (pa - pb).norm();
        assert!(gap < 1e-4, "points drift apart by {gap}");
        assert!(a.contains(p.u1, p.v1));
        assert!(b.contains(p.u2, p.v2));
    }
}

#[test]
fn concentric_tori_intersect_in_a_closed_circle() {
    // Same tube radius, major radii 1.0 and 1.4: the tubes cross where the
    // distance from the axis is 1.2 and |z| = sqrt(0.09 - 0.04).
    let a = Torus::upright(Point3::origin(), 1.0, 0.3);
    let b = Torus::upright(Point3::origin(), 1.4, 0.3);

    let curve = trace_intersection(&a, &b, &TraceConfig::with_step(0.05)).unwrap();
    assert!(curve.closed);
    // Circle of radius 1.2 has circumference ~7.54, so ~151 points at 0.05.
    assert!(
        (130..=170).contains(&curve.points.len()),
        "unexpected point count {}",
        curve.points.len()
    );
    assert_curve_on_both(&a, &b, &curve);

    let expected_z = 0.05_f64.sqrt();
    for p in &curve.points {
        let pos = a.point(p.u1, p.v1);
        let axis_dist = (pos.x * pos.x + pos.y * pos.y).sqrt();
        assert!((axis_dist - 1.2).abs() < 1e-3, "axis distance {axis_dist}");
        assert!((pos.z.abs() - expected_z).abs() < 1e-3, "z = {}", pos.z);
    }
}

#[test]
fn guide_point_selects_between_symmetric_branches() {
    // The concentric tori meet in two circles, mirrored across z = 0. The
    // guide point decides which one the trace starts on.
    let a = Torus::upright(Point3::origin(), 1.0, 0.3);
    let b = Torus::upright(Point3::origin(), 1.4, 0.3);

    let mut cfg = TraceConfig::with_step(0.05);
    cfg.guide = Some(Point3::new(1.2, 0.0, 0.3));
    let upper = trace_intersection(&a, &b, &cfg).unwrap();
    assert!(upper.points.iter().all(|p| a.point(p.u1, p.v1).z > 0.0));

    cfg.guide = Some(Point3::new(1.2, 0.0, -0.3));
    let lower = trace_intersection(&a, &b, &cfg).unwrap();
    assert!(lower.points.iter().all(|p| a.point(p.u1, p.v1).z < 0.0));
}

#[test]
fn sphere_and_bounded_plane_yield_an_open_arc() {
    // The plane z = 0.5 cuts the unit sphere in a circle of radius
    // sqrt(0.75); the patch covers only x >= 0, so the trace stops at the
    // patch boundary on both ends.
    let sphere = Sphere::new(Point3::origin(), 1.0);
    let plane = PlanePatch::horizontal(Point3::new(0.0, -1.0, 0.5), 2.0, 2.0);

    let curve = trace_intersection(&sphere, &plane, &TraceConfig::with_step(0.05)).unwrap();
    assert!(!curve.closed);
    // Half the circle is ~2.72 long, so roughly 54 points at 0.05.
    assert!(curve.points.len() >= 40, "only {} points", curve.points.len());
    assert_curve_on_both(&sphere, &plane, &curve);

    for p in &curve.points {
        let pos = sphere.point(p.u1, p.v1);
        assert!((pos.z - 0.5).abs() < 1e-4);
        assert!(pos.x > -1e-3, "point crossed the patch edge: x = {}", pos.x);
    }

    // Both endpoints sit at the x = 0 edge of the patch.
    let first = sphere.point(curve.points[0].u1, curve.points[0].v1);
    let last_point = curve.points[curve.points.len() - 1];
    let last = sphere.point(last_point.u1, last_point.v1);
    assert!(first.x < 0.1, "first endpoint x = {}", first.x);
    assert!(last.x < 0.1, "last endpoint x = {}", last.x);
}

#[test]
fn disjoint_surfaces_fail_to_converge() {
    let a = Sphere::new(Point3::origin(), 1.0);
    let b = Sphere::new(Point3::new(5.0, 0.0, 0.0), 1.0);

    match trace_intersection(&a, &b, &TraceConfig::default()) {
        Err(TraceError::FirstPointDiverged { residual }) => {
            // Closest approach leaves a gap of 3, so the squared distance
            // cannot drop below 9.
            assert!(residual > 8.0, "residual {residual}");
        }
        other => panic!("expected FirstPointDiverged, got {other:?}"),
    }
}

#[test]
fn surfaces_with_non_finite_points_are_rejected() {
    struct Broken;

    impl ParametricSurface for Broken {
        fn point(&self, _u: f64, _v: f64) -> Point3 {
            Point3::new(f64::NAN, 0.0, 0.0)
        }
        fn du(&self, _u: f64, _v: f64) -> Vec3 {
            Vec3::zeros()
        }
        fn dv(&self, _u: f64, _v: f64) -> Vec3 {
            Vec3::zeros()
        }
        fn max_u(&self) -> f64 {
            1.0
        }
        fn max_v(&self) -> f64 {
            1.0
        }
    }

    let good = Sphere::new(Point3::origin(), 1.0);
    match trace_intersection(&Broken, &good, &TraceConfig::default()) {
        Err(TraceError::NoStartingPoint) => {}
        other => panic!("expected NoStartingPoint, got {other:?}"),
    }
}

#[test]
fn coincident_surfaces_have_no_curve_direction() {
    // Identical spheres touch everywhere with parallel normals, so the
    // tangent cross product stays below the angular tolerance.
    let a = Sphere::new(Point3::origin(), 1.0);
    let b = Sphere::new(Point3::origin(), 1.0);

    match trace_intersection(&a, &b, &TraceConfig::default()) {
        Err(TraceError::DegenerateTangent) => {}
        other => panic!("expected DegenerateTangent, got {other:?}"),
    }
}

#[test]
fn tracing_is_deterministic() {
    let a = Torus::upright(Point3::origin(), 1.0, 0.3);
    let b = Torus::upright(Point3::origin(), 1.4, 0.3);
    let cfg = TraceConfig::with_step(0.05);

    let first = trace_intersection(&a, &b, &cfg).unwrap();
    let second = trace_intersection(&a, &b, &cfg).unwrap();
    assert_eq!(first.closed, second.closed);
    assert_eq!(first.points, second.points);
}

#[test]
fn offset_tori_intersect_in_a_closed_loop() {
    // Two equal tori whose centers are 1.8 apart: the tubes overlap near the
    // midpoint between the centers.
    let a = Torus::upright(Point3::origin(), 1.0, 0.3);
    let b = Torus::upright(Point3::new(1.8, 0.0, 0.0), 1.0, 0.3);

    let curve = trace_intersection(&a, &b, &TraceConfig::with_step(0.05)).unwrap();
    assert!(curve.closed);
    assert!(curve.points.len() >= 10);
    assert_curve_on_both(&a, &b, &curve);
}
