//! Node-link layout for the task tree
//!
//! Pure geometry: no tree mutation, no rendering.

mod engine;

pub use engine::{compute_positions, row_index, Algorithm, LayoutError, LayoutParams};
