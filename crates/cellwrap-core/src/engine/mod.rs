//! # Engine Module
//!
//! The stateful layer that turns validated options into coordinate updates.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - `ImageOptions` as read from TOML, validated into an
//!   immutable `ImageConfig`
//! - **Action Interface** ([`action`]) - The init / setup / per-frame contract shared by
//!   trajectory actions
//! - **Imaging Action** ([`image`]) - Chooses the wrapping path per topology and per frame
//! - **Partitioning** ([`partition`]) - Expands an atom selection into rigid imaging units
//! - **Wrapping Kernels** ([`tasks`]) - Orthogonal and fractional-coordinate wrapping,
//!   including the truncated-octahedron correction
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress and warning events
//! - **Error Handling** ([`error`]) - Setup errors and per-frame skip reasons
//!
//! Options are validated once, topology-dependent state is rebuilt on every `setup`, and
//! frames only borrow that state, so frames of one topology may be processed in parallel.

pub mod action;
pub mod config;
pub mod error;
pub mod image;
pub mod partition;
pub mod progress;
pub mod tasks;
