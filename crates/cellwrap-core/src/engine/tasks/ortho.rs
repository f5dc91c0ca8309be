use super::EntityReference;
use crate::core::geometry::cell::SimulationBox;
use crate::core::models::frame::Frame;
use crate::engine::error::FrameSkip;
use crate::engine::partition::Entity;
use nalgebra::{Point3, Vector3};

/// Half-open wrapping window `[lower, upper)` of an orthogonal box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    lengths: Vector3<f64>,
    lower: Vector3<f64>,
    upper: Vector3<f64>,
}

impl OrthoBounds {
    /// `[-L/2, L/2)` when centered on the origin, `[0, L)` otherwise.
    pub fn new(cell: &SimulationBox, origin: bool) -> Result<Self, FrameSkip> {
        if cell.has_degenerate_length() {
            return Err(FrameSkip::ZeroBoxLength);
        }
        let lengths = cell.lengths;
        let (lower, upper) = if origin {
            (-lengths / 2.0, lengths / 2.0)
        } else {
            (Vector3::zeros(), lengths)
        };
        Ok(Self {
            lengths,
            lower,
            upper,
        })
    }

    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    /// Whole-box translation that brings `point` inside the window.
    ///
    /// Non-finite coordinates yield a zero translation on that axis.
    pub fn wrap_translation(&self, point: &Point3<f64>) -> Vector3<f64> {
        Vector3::from_fn(|i, _| {
            let (x, length, lower, upper) = (point[i], self.lengths[i], self.lower[i], self.upper[i]);
            if !x.is_finite() {
                return 0.0;
            }
            let mut boxes = ((x - lower) / length).floor();
            // Rounding in the division can leave the result one box off.
            while x - boxes * length < lower {
                boxes -= 1.0;
            }
            while x - boxes * length >= upper {
                boxes += 1.0;
            }
            -boxes * length
        })
    }
}

/// Wraps every entity of `frame` into its orthogonal box, then adds `offset` box lengths.
pub fn run(
    frame: &mut Frame,
    origin: bool,
    offset: &Vector3<f64>,
    entities: &[Entity],
    reference: EntityReference<'_>,
) -> Result<(), FrameSkip> {
    let bounds = OrthoBounds::new(&frame.cell, origin)?;
    let bias = offset.component_mul(bounds.lengths());

    for entity in entities {
        let point = reference.point(&frame.coords, entity);
        let shift = bounds.wrap_translation(&point) + bias;
        if shift != Vector3::zeros() {
            frame.translate(entity.atoms(), &shift);
        }
    }
    Ok(())
}
