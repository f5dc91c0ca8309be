use thiserror::Error;

use super::config::ConfigError;
use crate::core::geometry::cell::CellError;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Topology '{topology}' does not contain box information")]
    NoBox { topology: String },

    #[error("No atoms selected by mask '{mask}' in topology '{topology}'")]
    NoAtomsSelected { topology: String, mask: String },

    #[error("Mask '{mask}' selects no atoms in topology '{topology}'; cannot center the truncated octahedron")]
    EmptyComMask { topology: String, mask: String },

    #[error("Atoms {first}-{last} of topology '{topology}' have zero total mass; cannot use center of mass")]
    ZeroMass {
        topology: String,
        first: usize,
        last: usize,
    },

    #[error("Reference box of topology '{topology}' is unusable: {source}")]
    Cell {
        topology: String,
        #[source]
        source: CellError,
    },

    #[error("Imaging action used before {0}")]
    NotReady(&'static str),
}

impl ImageError {
    /// True for errors that concern a single topology; the run can continue with the next one.
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            ImageError::NoBox { .. }
                | ImageError::NoAtomsSelected { .. }
                | ImageError::EmptyComMask { .. }
                | ImageError::ZeroMass { .. }
                | ImageError::Cell { .. }
        )
    }
}

/// Why a single frame was left untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameSkip {
    #[error("box has a zero length")]
    ZeroBoxLength,

    #[error("unit cell is unusable: {0}")]
    Cell(CellError),

    #[error("frame has {found} atoms but the topology has {expected}")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("action is not set up")]
    NotReady,
}

impl From<CellError> for FrameSkip {
    fn from(err: CellError) -> Self {
        match err {
            CellError::InvalidLengths(..) => FrameSkip::ZeroBoxLength,
            other => FrameSkip::Cell(other),
        }
    }
}
