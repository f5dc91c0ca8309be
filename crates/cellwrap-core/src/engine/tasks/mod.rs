//! Per-frame wrapping kernels.
//!
//! Each submodule moves every entity of one frame back into the primary cell using a
//! different box representation: [`ortho`] works directly on edge lengths, [`triclinic`]
//! goes through fractional coordinates and can reshape the result into the
//! truncated-octahedron form.

pub mod ortho;
pub mod triclinic;

use super::partition::Entity;
use crate::core::geometry::center::{ReferencePolicy, reference_point};
use nalgebra::Point3;

/// How the representative point of each entity is obtained from a frame.
#[derive(Debug, Clone, Copy)]
pub struct EntityReference<'a> {
    pub policy: ReferencePolicy,
    pub masses: &'a [f64],
}

impl EntityReference<'_> {
    pub fn point(&self, coords: &[Point3<f64>], entity: &Entity) -> Point3<f64> {
        reference_point(coords, self.masses, entity.atoms(), self.policy)
    }
}
