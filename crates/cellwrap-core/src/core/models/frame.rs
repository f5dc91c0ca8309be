use crate::core::geometry::cell::SimulationBox;
use nalgebra::{Point3, Vector3};
use std::ops::Range;

/// Coordinates of every atom at one trajectory step, together with that step's box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub coords: Vec<Point3<f64>>,
    pub cell: SimulationBox,
}

impl Frame {
    pub fn new(coords: Vec<Point3<f64>>, cell: SimulationBox) -> Self {
        Self { coords, cell }
    }

    pub fn atom_count(&self) -> usize {
        self.coords.len()
    }

    /// Shifts every atom in `atoms` by the same vector.
    pub fn translate(&mut self, atoms: Range<usize>, shift: &Vector3<f64>) {
        for p in &mut self.coords[atoms] {
            *p += shift;
        }
    }
}
