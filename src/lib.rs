//! Taskmap - a hierarchical task tree with deterministic node-link layout
//!
//! Taskmap keeps a mutable tree of tasks (status rollup, sibling
//! ordering, soft deletion, blocker relationships) and computes
//! absolute 2D positions for any visible subset of it, suitable for
//! driving an animated node-link diagram.
//!
//! Rendering, animation, and persistence live outside this crate: the
//! tree exposes a serializable [`Snapshot`] for a storage layer, and
//! [`compute_positions`] returns target positions for an animation
//! layer to interpolate toward.

pub mod domain;
pub mod layout;

pub use domain::{BlockerPair, Snapshot, Task, TaskId, TaskStatus, TaskTree, TreeError};
pub use layout::{compute_positions, row_index, Algorithm, LayoutError, LayoutParams};
