//! Serializable construction input/output shape
//!
//! The persistence collaborator supplies this shape when a tree is
//! loaded and consumes it on save. The crate treats it as plain
//! records and never reads or writes it anywhere itself.

use serde::{Deserialize, Serialize};

use super::blocker::BlockerPair;
use super::id::TaskId;
use super::task::Task;

/// Plain-record form of a whole tree, tombstones included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every task record, live and tombstoned
    pub tasks: Vec<Task>,

    /// The blocker relation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocker_pairs: Vec<BlockerPair>,

    /// The id the tree will assign next; never decreases
    pub next_task_id: TaskId,
}
