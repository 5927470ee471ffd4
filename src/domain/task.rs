//! Task records
//!
//! A task is one node of the hierarchy. The structural fields (parent,
//! depth, priority) are maintained by the tree; status may be assigned
//! directly or derived from children via rollup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TaskId;

/// Status of a task, ordered by progress
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not shaped enough to start; blocks rollup when assigned directly
    Draft,
    /// Shaped and available to start
    #[default]
    Ready,
    /// Started, or has a started or finished child
    InProgress,
    /// Finished
    Done,
}

impl TaskStatus {
    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Returns true if this task is currently being worked on
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::InProgress)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Draft => write!(f, "draft"),
            TaskStatus::Ready => write!(f, "ready"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

/// A task within the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the tree
    pub id: TaskId,

    /// Containing task; [`TaskId::NONE`] on the root only
    pub parent: TaskId,

    /// Free-form label; may carry an external document reference,
    /// which is opaque to this crate
    pub name: String,

    /// Current status
    pub status: TaskStatus,

    /// Manual-override flag: set when a caller assigns `Draft`
    /// directly, cleared by any other direct assignment. Rollup never
    /// crosses a pinned task.
    #[serde(default, skip_serializing_if = "is_false")]
    pub draft_pinned: bool,

    /// Distance from the root; the root is 0
    pub depth: u32,

    /// Zero-based rank among live siblings
    pub priority: usize,

    /// Soft-delete tombstone flag
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,

    /// Collapses this task's subtree in every view
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Task {
    pub(crate) fn new(
        id: TaskId,
        parent: TaskId,
        name: impl Into<String>,
        status: TaskStatus,
        depth: u32,
        priority: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent,
            name: name.into(),
            status,
            draft_pinned: false,
            depth,
            priority,
            deleted: false,
            hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this is the structural root
    pub fn is_root(&self) -> bool {
        self.id == TaskId::ROOT
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
