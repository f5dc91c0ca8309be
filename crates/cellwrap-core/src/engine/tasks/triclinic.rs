use super::EntityReference;
use crate::core::geometry::cell::UnitCell;
use crate::core::models::frame::Frame;
use crate::engine::partition::Entity;
use nalgebra::{Point3, Vector3};

/// Translation by whole cell vectors that moves `point` into the primary cell.
///
/// The primary cell spans fractional coordinates `[0, 1)`, or `[-0.5, 0.5)` when
/// centered on the origin.
pub fn wrap_translation(cell: &UnitCell, origin: bool, point: &Point3<f64>) -> Vector3<f64> {
    let fractional = cell.to_fractional(point);
    if !fractional.iter().all(|f| f.is_finite()) {
        return Vector3::zeros();
    }
    let boxes = if origin {
        fractional.map(|f| (f + 0.5).floor())
    } else {
        fractional.map(f64::floor)
    };
    -cell.to_cartesian(&boxes)
}

pub fn wrap_point(cell: &UnitCell, origin: bool, point: &Point3<f64>) -> Point3<f64> {
    point + wrap_translation(cell, origin, point)
}

/// The 26 non-zero lattice shifts with components in {-1, 0, 1}.
fn neighbor_shifts() -> impl Iterator<Item = Vector3<f64>> {
    (-1..=1).flat_map(|i| {
        (-1..=1).flat_map(move |j| {
            (-1..=1)
                .filter(move |&k| (i, j, k) != (0, 0, 0))
                .map(move |k| Vector3::new(i as f64, j as f64, k as f64))
        })
    })
}

/// Extra lattice translation that brings an already wrapped point closest to `shape_center`.
///
/// The unshifted image is kept unless a neighbor image is strictly closer, so the
/// result never increases the distance to `shape_center`.
pub fn truncated_octahedron_shift(
    cell: &UnitCell,
    wrapped: &Point3<f64>,
    shape_center: &Point3<f64>,
) -> Vector3<f64> {
    let mut best = Vector3::zeros();
    let mut best_distance = (wrapped - shape_center).norm_squared();
    for shift in neighbor_shifts().map(|k| cell.to_cartesian(&k)) {
        let distance = (wrapped + shift - shape_center).norm_squared();
        if distance < best_distance {
            best_distance = distance;
            best = shift;
        }
    }
    best
}

/// Wraps every entity of `frame` through fractional coordinates.
///
/// With a `shape_center` each entity is additionally moved to the lattice image
/// nearest to that point, which is the familiar truncated-octahedron view. The
/// center is wrapped into the primary cell first. `offset` is applied last, in
/// units of the cell vectors.
pub fn run(
    frame: &mut Frame,
    cell: &UnitCell,
    origin: bool,
    offset: &Vector3<f64>,
    shape_center: Option<Point3<f64>>,
    entities: &[Entity],
    reference: EntityReference<'_>,
) {
    let shape_center = shape_center.map(|c| wrap_point(cell, origin, &c));
    let bias = cell.to_cartesian(offset);

    for entity in entities {
        let point = reference.point(&frame.coords, entity);
        let mut shift = wrap_translation(cell, origin, &point);
        if let Some(center) = &shape_center {
            shift += truncated_octahedron_shift(cell, &(point + shift), center);
        }
        shift += bias;
        if shift != Vector3::zeros() {
            frame.translate(entity.atoms(), &shift);
        }
    }
}
