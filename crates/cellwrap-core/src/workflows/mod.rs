//! # Workflows Module
//!
//! High-level entry points that drive the imaging action over whole trajectories.
//!
//! - **Imaging Workflow** ([`image`]) - Initializes the action once, sets it up for each
//!   topology segment and images every frame, skipping topologies or frames that cannot
//!   be imaged while reporting why.

pub mod image;
