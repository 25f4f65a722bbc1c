use cad_ecs::Coordinator;

use crate::components::{IntersectionCurveData, PatchControlGrid, Position, TorusShape};

/// Groups every placed entity, whatever its shape.
pub struct SurfaceSystem;

/// Groups placed torus entities.
pub struct TorusSystem;

/// Groups placed bicubic-patch entities.
pub struct PatchSystem;

/// Groups derived intersection-curve entities.
pub struct IntersectionSystem;

/// Register the scene systems and their required components. Membership is
/// maintained by the coordinator from here on; passes iterate `members_of`.
pub fn register_scene(coordinator: &mut Coordinator) {
    coordinator.register_system(SurfaceSystem);
    coordinator.require_component::<SurfaceSystem, Position>();

    coordinator.register_system(TorusSystem);
    coordinator.require_component::<TorusSystem, Position>();
    coordinator.require_component::<TorusSystem, TorusShape>();

    coordinator.register_system(PatchSystem);
    coordinator.require_component::<PatchSystem, Position>();
    coordinator.require_component::<PatchSystem, PatchControlGrid>();

    coordinator.register_system(IntersectionSystem);
    coordinator.require_component::<IntersectionSystem, IntersectionCurveData>();
}
