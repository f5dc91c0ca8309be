//! # Core Module
//!
//! Stateless building blocks of the re-imaging toolkit.
//!
//! - **System Representation** ([`models`]) - Topology layout and per-step coordinate frames
//! - **Periodic Geometry** ([`geometry`]) - Box classification, unit-cell/reciprocal matrices
//!   and reference points (centers of mass, first-atom positions)
//! - **Atom Selection** ([`selection`]) - The mask language that restricts which atoms move
//!
//! Nothing in this layer mutates coordinates on its own; the [`crate::engine`] layer combines
//! these pieces into the imaging action.

pub mod geometry;
pub mod models;
pub mod selection;
