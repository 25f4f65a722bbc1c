//! Plain-data components attached to scene entities. Shape components hold
//! dimensions only; placement comes from [`Position`], and the adapter in
//! [`crate::adapter`] combines the two into kernel surfaces.

use cad_ecs::Entity;
use cad_kernel::intersection::IntersectionPoint;
use cad_kernel::{Point3, Vec3};
use serde::{Deserialize, Serialize};

/// World-space placement of a shape entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Point3);

/// An upright torus (ring in the XY plane through the entity position).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusShape {
    pub major_radius: f64,
    pub minor_radius: f64,
}

/// A finite plane spanned by two axes from the entity position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneShape {
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub u_extent: f64,
    pub v_extent: f64,
}

/// Control grid of a bicubic patch, relative to the entity position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchControlGrid {
    pub control: [[Point3; 4]; 4],
}

/// A traced intersection curve together with the two source entities it was
/// derived from. The point list is parameter coordinates on both sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionCurveData {
    pub points: Vec<IntersectionPoint>,
    pub closed: bool,
    pub surfaces: (Entity, Entity),
}

/// Tag marking a derived curve whose source surfaces changed after tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stale;
