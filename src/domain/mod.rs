//! Domain model for the task tree
//!
//! Contains the core tree logic without any I/O or rendering concerns.

mod blocker;
mod id;
mod snapshot;
mod task;
mod tree;

pub use blocker::{BlockerGraph, BlockerPair};
pub use id::TaskId;
pub use snapshot::Snapshot;
pub use task::{Task, TaskStatus};
pub use tree::{TaskTree, TreeError};
