use cad_ecs::{Coordinator, Entity};
use cad_kernel::geometry::{BezierPatch, ParametricSurface, PlanePatch, Point3, Torus};

use crate::components::{PatchControlGrid, PlaneShape, Position, TorusShape};
use crate::SceneError;

/// Build the kernel surface an entity represents, selected by whichever
/// shape component it carries. [`Position`] translates the shape; without
/// one the shape sits at the origin.
pub fn surface_for_entity(
    coordinator: &Coordinator,
    entity: Entity,
) -> Result<Box<dyn ParametricSurface>, SceneError> {
    let origin = if coordinator.has_component::<Position>(entity) {
        coordinator.get_component::<Position>(entity).0
    } else {
        Point3::origin()
    };

    if coordinator.has_component::<TorusShape>(entity) {
        let shape = coordinator.get_component::<TorusShape>(entity);
        return Ok(Box::new(Torus::upright(
            origin,
            shape.major_radius,
            shape.minor_radius,
        )));
    }
    if coordinator.has_component::<PlaneShape>(entity) {
        let shape = coordinator.get_component::<PlaneShape>(entity);
        return Ok(Box::new(PlanePatch::new(
            origin,
            shape.u_axis,
            shape.v_axis,
            shape.u_extent,
            shape.v_extent,
        )));
    }
    if coordinator.has_component::<PatchControlGrid>(entity) {
        let grid = coordinator.get_component::<PatchControlGrid>(entity);
        let mut control = grid.control;
        for row in &mut control {
            for point in row.iter_mut() {
                *point += origin.coords;
            }
        }
        return Ok(Box::new(BezierPatch::new(control)));
    }

    Err(SceneError::NoSurface { entity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cad_kernel::Vec3;

    #[test]
    fn torus_entity_is_translated_by_position() {
        let mut coord = Coordinator::new();
        let e = coord.create_entity();
        coord.add_component(e, Position(Point3::new(0.0, 0.0, 2.0)));
        coord.add_component(
            e,
            TorusShape {
                major_radius: 1.0,
                minor_radius: 0.25,
            },
        );

        let surface = surface_for_entity(&coord, e).unwrap();
        // Outer equator point, lifted by the position.
        let p = surface.point(0.0, 0.0);
        assert_relative_eq!((p.x * p.x + p.y * p.y).sqrt(), 1.25, epsilon = 1e-10);
        assert_relative_eq!(p.z, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn plane_entity_uses_its_axes() {
        let mut coord = Coordinator::new();
        let e = coord.create_entity();
        coord.add_component(
            e,
            PlaneShape {
                u_axis: Vec3::x(),
                v_axis: Vec3::z(),
                u_extent: 2.0,
                v_extent: 3.0,
            },
        );

        let surface = surface_for_entity(&coord, e).unwrap();
        assert_relative_eq!(
            surface.point(1.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            epsilon = 1e-12
        );
        assert!(!surface.contains(2.5, 0.0));
    }

    #[test]
    fn patch_grid_is_offset_by_position() {
        let mut coord = Coordinator::new();
        let e = coord.create_entity();
        let mut control = [[Point3::origin(); 4]; 4];
        for (i, row) in control.iter_mut().enumerate() {
            for (j, point) in row.iter_mut().enumerate() {
                *point = Point3::new(i as f64, j as f64, 0.0);
            }
        }
        coord.add_component(e, Position(Point3::new(10.0, 0.0, 0.0)));
        coord.add_component(e, PatchControlGrid { control });

        let surface = surface_for_entity(&coord, e).unwrap();
        assert_relative_eq!(
            surface.point(0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn shapeless_entity_is_rejected() {
        let mut coord = Coordinator::new();
        let e = coord.create_entity();
        coord.add_component(e, Position(Point3::origin()));
        match surface_for_entity(&coord, e) {
            Err(SceneError::NoSurface { entity }) => assert_eq!(entity, e),
            other => panic!("expected NoSurface, got {:?}", other.map(|_| ())),
        }
    }
}
