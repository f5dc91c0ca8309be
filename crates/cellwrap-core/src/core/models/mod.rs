//! # Core Models Module
//!
//! Data structures describing the system being imaged.
//!
//! - [`topology`] - Atom/residue/molecule layout, masses and the [`topology::ProvidesTopology`]
//!   view consumed by the engine
//! - [`frame`] - Per-step coordinate buffer together with the step's periodic box
//!
//! ```ignore
//! use cellwrap::core::models::{frame::Frame, topology::Topology};
//!
//! let mut builder = Topology::builder("solvated");
//! builder.begin_molecule();
//! builder.add_residue("WAT")?;
//! builder.add_atom("O", 15.999)?;
//! let topology = builder.build()?;
//! ```

pub mod frame;
pub mod topology;
