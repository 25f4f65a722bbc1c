//! Scene layer: shape components on ECS entities, the adapter that turns
//! them into kernel surfaces, and the intersection operation producing
//! derived curve entities with staleness tracking.

pub mod adapter;
pub mod components;
pub mod intersect;
pub mod systems;

use cad_ecs::Entity;
use thiserror::Error;

pub use adapter::surface_for_entity;
pub use components::{
    IntersectionCurveData, PatchControlGrid, PlaneShape, Position, Stale, TorusShape,
};
pub use intersect::find_intersection;
pub use systems::{register_scene, IntersectionSystem, PatchSystem, SurfaceSystem, TorusSystem};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("entity {} carries no surface shape", .entity.index())]
    NoSurface { entity: Entity },
    #[error("trace step must be positive and finite, got {step}")]
    InvalidStep { step: f64 },
    #[error(transparent)]
    Trace(#[from] cad_kernel::TraceError),
}
