//! # cellwrap
//!
//! Re-imaging of molecular dynamics trajectories under periodic boundary conditions.
//! Molecules, residues or single atoms that drifted out of the primary simulation cell are
//! translated back by whole lattice vectors, so that each unit stays intact and the system
//! is displayed in one contiguous cell.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless models (`Topology`, `Frame`), box geometry
//!   (`SimulationBox`, `UnitCell`) and the atom mask language.
//!
//! - **[`engine`]: The Logic Core.** The `ImageAction` with its validated configuration,
//!   entity partitioning and the orthogonal and triclinic wrapping kernels.
//!
//! - **[`workflows`]: The Public API.** Runs the action across trajectory segments with
//!   progress reporting and per-topology error recovery.
//!
//! ```ignore
//! use cellwrap::engine::config::ImageOptions;
//! use cellwrap::engine::progress::ProgressReporter;
//! use cellwrap::workflows::image;
//!
//! let options = ImageOptions::from_toml_str("mode = \"by-residue\"\norigin = true")?;
//! let summary = image::run_single(&topology, &mut frames, options, &ProgressReporter::new())?;
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
