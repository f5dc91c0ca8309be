//! # Geometry Module
//!
//! Periodic-cell algebra and reference-point calculations shared by the imaging engines.
//!
//! - [`cell`] - Box classification and the unit-cell / reciprocal matrix pair
//! - [`center`] - Mass-weighted centroids and first-atom reference points

pub mod cell;
pub mod center;
