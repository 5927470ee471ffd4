//! Integer task identifiers
//!
//! Ids are allocated monotonically by the tree and never reused; a
//! tombstoned task keeps its id forever. Two values are reserved:
//! [`TaskId::ROOT`] for the structural root created at tree
//! construction, and [`TaskId::NONE`] for the root's non-existent
//! parent (the layout engine also uses it as its virtual super-root).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a task in the tree arena
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Reserved "no task" sentinel: the root's parent link
    pub const NONE: TaskId = TaskId(-1);

    /// The structural root, allocated first in every tree
    pub const ROOT: TaskId = TaskId(0);

    /// Returns true if this is the [`TaskId::NONE`] sentinel
    pub fn is_none(self) -> bool {
        self == TaskId::NONE
    }

    /// The id following this one in allocation order
    pub(crate) fn next(self) -> TaskId {
        TaskId(self.0 + 1)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
