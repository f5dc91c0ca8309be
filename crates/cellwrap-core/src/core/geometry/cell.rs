use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

const RIGHT_ANGLE_TOLERANCE_DEGREES: f64 = 1e-4;
const SINGULAR_VOLUME_TOLERANCE: f64 = 1e-10;

/// Classification of a periodic box by its lengths and angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoxType {
    /// The system is not periodic (all box lengths are zero).
    #[default]
    None,
    /// All three cell angles are right angles.
    Orthogonal,
    /// At least one cell angle differs from 90 degrees.
    Triclinic,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("Box lengths must be positive and finite, got ({0}, {1}, {2})")]
    InvalidLengths(f64, f64, f64),

    #[error("Box angles ({0}, {1}, {2}) do not describe a valid cell")]
    InvalidAngles(f64, f64, f64),

    #[error("Unit cell is singular (volume {volume:e})")]
    Singular { volume: f64 },
}

/// Periodic box of a single frame, described by three edge lengths (Angstroms)
/// and the three inter-edge angles alpha, beta, gamma (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBox {
    pub lengths: Vector3<f64>,
    pub angles: Vector3<f64>,
}

impl Default for SimulationBox {
    fn default() -> Self {
        Self::none()
    }
}

impl SimulationBox {
    pub fn new(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        Self {
            lengths: Vector3::from(lengths),
            angles: Vector3::from(angles),
        }
    }

    pub fn orthogonal(lengths: [f64; 3]) -> Self {
        Self::new(lengths, [90.0; 3])
    }

    /// A box carrying no periodic information.
    pub fn none() -> Self {
        Self::new([0.0; 3], [90.0; 3])
    }

    pub fn box_type(&self) -> BoxType {
        if self.lengths.iter().all(|&l| l == 0.0) {
            BoxType::None
        } else if self
            .angles
            .iter()
            .all(|&a| (a - 90.0).abs() < RIGHT_ANGLE_TOLERANCE_DEGREES)
        {
            BoxType::Orthogonal
        } else {
            BoxType::Triclinic
        }
    }

    /// True when any edge length is zero, negative or not a number.
    pub fn has_degenerate_length(&self) -> bool {
        self.lengths.iter().any(|&l| !(l > 0.0) || !l.is_finite())
    }

    /// Builds the unit-cell matrix and its reciprocal for this box.
    ///
    /// The first cell vector lies along x and the second in the xy-plane, so for
    /// an orthogonal box both matrices are diagonal.
    pub fn unit_cell(&self) -> Result<UnitCell, CellError> {
        if self.has_degenerate_length() {
            return Err(CellError::InvalidLengths(
                self.lengths.x,
                self.lengths.y,
                self.lengths.z,
            ));
        }
        if self.angles.iter().any(|&a| !(a > 0.0 && a < 180.0)) {
            return Err(CellError::InvalidAngles(
                self.angles.x,
                self.angles.y,
                self.angles.z,
            ));
        }

        let (a, b, c) = (self.lengths.x, self.lengths.y, self.lengths.z);
        let (alpha, beta, gamma) = (
            self.angles.x.to_radians(),
            self.angles.y.to_radians(),
            self.angles.z.to_radians(),
        );
        let (cos_alpha, cos_beta) = (right_angle_cos(alpha), right_angle_cos(beta));
        let (cos_gamma, sin_gamma) = (right_angle_cos(gamma), gamma.sin());

        let cx = c * cos_beta;
        let cy = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_squared = c * c - cx * cx - cy * cy;
        if !(cz_squared > 0.0) {
            return Err(CellError::InvalidAngles(
                self.angles.x,
                self.angles.y,
                self.angles.z,
            ));
        }

        let ucell = Matrix3::from_columns(&[
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_gamma, b * sin_gamma, 0.0),
            Vector3::new(cx, cy, cz_squared.sqrt()),
        ]);
        UnitCell::from_matrix(ucell)
    }
}

/// Cosine that is exactly zero for a right angle, keeping orthogonal cells diagonal.
fn right_angle_cos(radians: f64) -> f64 {
    if (radians.to_degrees() - 90.0).abs() < RIGHT_ANGLE_TOLERANCE_DEGREES {
        0.0
    } else {
        radians.cos()
    }
}

/// Fractional-coordinate transform pair of a periodic cell.
///
/// Columns of `ucell` are the cell vectors, so `cartesian = ucell * fractional`
/// and `fractional = recip * cartesian`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    ucell: Matrix3<f64>,
    recip: Matrix3<f64>,
}

impl UnitCell {
    pub fn from_matrix(ucell: Matrix3<f64>) -> Result<Self, CellError> {
        let volume = ucell.determinant();
        let scale: f64 = ucell.column_iter().map(|v| v.norm()).product();
        if !volume.is_finite() || volume.abs() <= SINGULAR_VOLUME_TOLERANCE * scale {
            return Err(CellError::Singular { volume });
        }
        let recip = ucell
            .try_inverse()
            .ok_or(CellError::Singular { volume })?;
        Ok(Self { ucell, recip })
    }

    pub fn ucell(&self) -> &Matrix3<f64> {
        &self.ucell
    }

    pub fn recip(&self) -> &Matrix3<f64> {
        &self.recip
    }

    pub fn to_fractional(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.recip * point.coords
    }

    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.ucell * fractional
    }

    /// Geometric center of the primary cell.
    pub fn center(&self) -> Point3<f64> {
        Point3::from(self.ucell * Vector3::repeat(0.5))
    }
}
