use nalgebra::{Point3, Vector3};
use std::ops::Range;

/// How the representative point of an imaging unit is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferencePolicy {
    /// Position of the first atom of the unit.
    #[default]
    FirstAtom,
    /// Mass-weighted centroid of all atoms of the unit.
    CenterOfMass,
}

/// Mass-weighted centroid of the given atoms.
///
/// The caller guarantees a positive total mass; a zero total yields non-finite
/// coordinates.
pub fn center_of_mass<I>(coords: &[Point3<f64>], masses: &[f64], atoms: I) -> Point3<f64>
where
    I: IntoIterator<Item = usize>,
{
    let mut weighted = Vector3::zeros();
    let mut total_mass = 0.0;
    for i in atoms {
        weighted += coords[i].coords * masses[i];
        total_mass += masses[i];
    }
    Point3::from(weighted / total_mass)
}

/// Unweighted centroid of the given atoms, or the world origin for an empty set.
pub fn geometric_center<I>(coords: &[Point3<f64>], atoms: I) -> Point3<f64>
where
    I: IntoIterator<Item = usize>,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for i in atoms {
        sum += coords[i].coords;
        count += 1;
    }
    if count == 0 {
        return Point3::origin();
    }
    Point3::from(sum / count as f64)
}

/// Representative point of one contiguous imaging unit.
pub fn reference_point(
    coords: &[Point3<f64>],
    masses: &[f64],
    atoms: Range<usize>,
    policy: ReferencePolicy,
) -> Point3<f64> {
    match policy {
        ReferencePolicy::FirstAtom => coords[atoms.start],
        ReferencePolicy::CenterOfMass => center_of_mass(coords, masses, atoms),
    }
}

pub fn total_mass<I>(masses: &[f64], atoms: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    atoms.into_iter().map(|i| masses[i]).sum()
}
