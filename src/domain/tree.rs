//! Task tree arena
//!
//! The tree owns every task record and the blocker relation. Tasks
//! live in a flat arena keyed by id; deletion tombstones a record
//! instead of removing it, so ids are never reused and structural
//! queries simply skip tombstones.
//!
//! Every mutation leaves the tree in a renderable state: exactly one
//! live root, child depths one below their parent, sibling priorities
//! contiguous from zero, and parent links acyclic.

use thiserror::Error;

use super::blocker::{BlockerGraph, BlockerPair};
use super::id::TaskId;
use super::snapshot::Snapshot;
use super::task::{Task, TaskStatus};

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("no task found with id {0}")]
    TaskNotFound(TaskId),

    #[error("task {0} is deleted")]
    TaskDeleted(TaskId),

    #[error("operation not allowed on the root task")]
    RootImmutable,

    #[error("reparenting {task} under {new_parent} would create a cycle")]
    WouldCreateCycle { task: TaskId, new_parent: TaskId },

    #[error("priority {priority} out of range for {sibling_count} siblings")]
    PriorityOutOfRange {
        priority: usize,
        sibling_count: usize,
    },

    #[error("snapshot has no valid root task")]
    InvalidRoot,
}

/// The task hierarchy and its blocker relation
#[derive(Debug)]
pub struct TaskTree {
    tasks: Vec<Task>,
    next_task_id: TaskId,
    blockers: BlockerGraph,
}

impl Default for TaskTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTree {
    /// Creates a tree holding only the structural root
    pub fn new() -> Self {
        let root = Task::new(
            TaskId::ROOT,
            TaskId::NONE,
            "root",
            TaskStatus::InProgress,
            0,
            0,
        );
        Self {
            tasks: vec![root],
            next_task_id: TaskId::ROOT.next(),
            blockers: BlockerGraph::new(),
        }
    }

    /// Rebuilds a tree from the persistence layer's records
    ///
    /// An empty task list yields a fresh default tree. A non-empty list
    /// must contain the live root record, or the snapshot is rejected.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, TreeError> {
        if snapshot.tasks.is_empty() {
            return Ok(Self::new());
        }

        let live_roots = snapshot
            .tasks
            .iter()
            .filter(|t| t.parent == TaskId::NONE && !t.deleted)
            .count();
        let has_root = snapshot
            .tasks
            .iter()
            .any(|t| t.id == TaskId::ROOT && t.parent == TaskId::NONE && t.depth == 0 && !t.deleted);
        if live_roots != 1 || !has_root {
            return Err(TreeError::InvalidRoot);
        }

        let mut blockers = BlockerGraph::new();
        for pair in snapshot.blocker_pairs {
            blockers.insert(pair);
        }

        Ok(Self {
            tasks: snapshot.tasks,
            next_task_id: snapshot.next_task_id,
            blockers,
        })
    }

    /// Exports the tree as plain records, tombstones included
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            blocker_pairs: self.blockers.pairs(),
            next_task_id: self.next_task_id,
        }
    }

    // ---- lookups -------------------------------------------------------

    /// Looks up a task record, tombstoned or not
    pub fn task(&self, id: TaskId) -> Result<&Task, TreeError> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(TreeError::TaskNotFound(id))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, TreeError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TreeError::TaskNotFound(id))
    }

    fn live_task(&self, id: TaskId) -> Result<&Task, TreeError> {
        let task = self.task(id)?;
        if task.deleted {
            return Err(TreeError::TaskDeleted(id));
        }
        Ok(task)
    }

    /// Every record in the arena, tombstones included
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Number of live tasks, root included
    pub fn live_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.deleted).count()
    }

    pub fn name(&self, id: TaskId) -> Result<&str, TreeError> {
        Ok(&self.task(id)?.name)
    }

    pub fn status(&self, id: TaskId) -> Result<TaskStatus, TreeError> {
        Ok(self.task(id)?.status)
    }

    pub fn is_deleted(&self, id: TaskId) -> Result<bool, TreeError> {
        Ok(self.task(id)?.deleted)
    }

    // ---- structural queries --------------------------------------------

    /// Direct children of `id`, in arena order
    pub fn children(&self, id: TaskId, include_deleted: bool) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.parent == id && (include_deleted || !t.deleted))
            .map(|t| t.id)
            .collect()
    }

    /// `id` and every task below it, pre-order with `id` first
    pub fn descendant_ids(&self, id: TaskId, include_deleted: bool) -> Vec<TaskId> {
        let mut stack = vec![id];
        let mut result = Vec::new();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current, include_deleted));
        }
        result
    }

    /// Strict ancestors of `id`, nearest first, root last
    pub fn ancestors(&self, id: TaskId) -> Result<Vec<TaskId>, TreeError> {
        let mut result = Vec::new();
        let mut task = self.task(id)?;
        while task.depth != 0 {
            task = self.task(task.parent)?;
            result.push(task.id);
        }
        Ok(result)
    }

    /// Returns true if `task` is a strict ancestor of `candidate`
    pub fn is_ancestor_of(&self, task: TaskId, candidate: TaskId) -> Result<bool, TreeError> {
        Ok(self.ancestors(candidate)?.contains(&task))
    }

    /// Returns true if `task` is a strict descendant of `candidate`
    pub fn is_descendant_of(&self, task: TaskId, candidate: TaskId) -> Result<bool, TreeError> {
        self.is_ancestor_of(candidate, task)
    }

    /// Returns true if any strict ancestor of `id` is collapsed
    pub fn is_branch_hidden(&self, id: TaskId) -> Result<bool, TreeError> {
        for ancestor in self.ancestors(id)? {
            if self.task(ancestor)?.hidden {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The live tasks a renderer should show under `focus`: the focused
    /// task itself, its strict ancestors, and its descendants, minus
    /// anything under a collapsed branch.
    ///
    /// This is exactly the set the layout engine expects as input.
    pub fn visible_tasks(&self, focus: TaskId) -> Result<Vec<&Task>, TreeError> {
        let focus_ancestors = self.ancestors(focus)?;
        let focus_descendants = self.descendant_ids(focus, false);

        let mut result = Vec::new();
        for task in &self.tasks {
            if task.deleted || self.is_branch_hidden(task.id)? {
                continue;
            }
            let in_scope = task.id == focus
                || focus_ancestors.contains(&task.id)
                || focus_descendants.contains(&task.id);
            if in_scope {
                result.push(task);
            }
        }
        Ok(result)
    }

    // ---- mutations -----------------------------------------------------

    /// Creates a new task as the last live child of `parent` and
    /// returns its id
    pub fn add_task(&mut self, parent: TaskId) -> Result<TaskId, TreeError> {
        let depth = self.live_task(parent)?.depth + 1;
        let priority = self.children(parent, false).len();

        let id = self.next_task_id;
        self.tasks
            .push(Task::new(id, parent, "default", TaskStatus::Ready, depth, priority));
        self.next_task_id = id.next();

        self.recalculate_status_recursive(parent)?;
        Ok(id)
    }

    /// Tombstones `id` alone; its children are promoted to `id`'s
    /// former parent, keeping their relative order
    pub fn remove_task_single(&mut self, id: TaskId) -> Result<(), TreeError> {
        if id == TaskId::ROOT {
            return Err(TreeError::RootImmutable);
        }
        let parent = self.task(id)?.parent;
        let promoted = self.children(id, false);

        {
            let task = self.task_mut(id)?;
            task.deleted = true;
            task.touch();
        }

        for child in promoted {
            {
                let task = self.task_mut(child)?;
                task.parent = parent;
                task.touch();
            }
            self.refresh_depths(child)?;
        }

        self.recalc_priorities(parent);
        self.recalculate_status_recursive(parent)?;
        Ok(())
    }

    /// Tombstones `id` and its whole subtree
    pub fn remove_task_branch(&mut self, id: TaskId) -> Result<(), TreeError> {
        if id == TaskId::ROOT {
            return Err(TreeError::RootImmutable);
        }
        let parent = self.task(id)?.parent;

        for member in self.descendant_ids(id, false) {
            let task = self.task_mut(member)?;
            task.deleted = true;
            task.touch();
        }

        self.recalc_priorities(parent);
        self.recalculate_status_recursive(parent)?;
        Ok(())
    }

    /// Moves `task` (and its subtree) under `new_parent`
    ///
    /// The move is rejected before any mutation if it would detach the
    /// root or fold the tree into a cycle. The moved task keeps its
    /// carried priority rank; both affected sibling groups are
    /// recompacted, and callers that want a specific slot follow up
    /// with [`set_priority`](Self::set_priority).
    pub fn change_parent(&mut self, task: TaskId, new_parent: TaskId) -> Result<(), TreeError> {
        if task == TaskId::ROOT {
            return Err(TreeError::RootImmutable);
        }
        self.live_task(new_parent)?;
        if new_parent == task || self.descendant_ids(task, false).contains(&new_parent) {
            return Err(TreeError::WouldCreateCycle { task, new_parent });
        }

        let old_parent = self.task(task)?.parent;
        if old_parent == new_parent {
            return Ok(());
        }

        {
            let task = self.task_mut(task)?;
            task.parent = new_parent;
            task.touch();
        }
        self.refresh_depths(task)?;

        self.recalc_priorities(old_parent);
        self.recalc_priorities(new_parent);
        self.recalculate_status_recursive(old_parent)?;
        self.recalculate_status_recursive(new_parent)?;
        Ok(())
    }

    /// Moves one sibling to a new rank, shifting everyone between the
    /// old and new rank by one. O(siblings), no re-sort.
    pub fn set_priority(&mut self, task: TaskId, new_priority: usize) -> Result<(), TreeError> {
        let (parent, old_priority) = {
            let t = self.live_task(task)?;
            (t.parent, t.priority)
        };
        let sibling_count = self.children(parent, false).len();
        if new_priority >= sibling_count {
            return Err(TreeError::PriorityOutOfRange {
                priority: new_priority,
                sibling_count,
            });
        }
        if new_priority == old_priority {
            return Ok(());
        }

        for i in 0..self.tasks.len() {
            let t = &self.tasks[i];
            if t.id == task || t.parent != parent || t.deleted {
                continue;
            }
            let p = t.priority;
            if new_priority > old_priority && p > old_priority && p <= new_priority {
                self.tasks[i].priority = p - 1;
                self.tasks[i].touch();
            } else if new_priority < old_priority && p >= new_priority && p < old_priority {
                self.tasks[i].priority = p + 1;
                self.tasks[i].touch();
            }
        }

        let t = self.task_mut(task)?;
        t.priority = new_priority;
        t.touch();
        Ok(())
    }

    /// Re-ranks the live children of `parent` by their current
    /// priority order, closing any gaps left by deletions
    pub fn recalc_priorities(&mut self, parent: TaskId) {
        let mut members: Vec<usize> = (0..self.tasks.len())
            .filter(|&i| self.tasks[i].parent == parent && !self.tasks[i].deleted)
            .collect();
        // stable: arena order breaks priority ties deterministically
        members.sort_by_key(|&i| self.tasks[i].priority);

        for (rank, &i) in members.iter().enumerate() {
            if self.tasks[i].priority != rank {
                self.tasks[i].priority = rank;
                self.tasks[i].touch();
            }
        }
    }

    /// Assigns a status directly, pinning `Draft` and unpinning
    /// everything else, then rolls the parent chain up
    pub fn set_status(&mut self, task: TaskId, status: TaskStatus) -> Result<(), TreeError> {
        let parent = {
            let t = self.task_mut(task)?;
            t.status = status;
            t.draft_pinned = status == TaskStatus::Draft;
            t.touch();
            t.parent
        };
        self.recalculate_status_recursive(parent)?;
        Ok(())
    }

    /// Recomputes statuses from `from` up the parent chain
    ///
    /// Stops before the root (the root's status is never derived) and
    /// at the first pinned-`Draft` task, which absorbs the update.
    pub fn recalculate_status_recursive(&mut self, from: TaskId) -> Result<(), TreeError> {
        let mut current = from;
        while current != TaskId::ROOT && current != TaskId::NONE {
            if self.task(current)?.draft_pinned {
                return Ok(());
            }
            let status = self.calculate_status(current)?;
            let task = self.task_mut(current)?;
            if task.status != status {
                task.status = status;
                task.touch();
            }
            current = task.parent;
        }
        Ok(())
    }

    /// Derives a task's status from its live children
    ///
    /// A task with no live children keeps its current status.
    pub fn calculate_status(&self, id: TaskId) -> Result<TaskStatus, TreeError> {
        let children = self.children(id, false);
        if children.is_empty() {
            return Ok(self.task(id)?.status);
        }

        let mut done = 0;
        let mut in_progress = 0;
        let mut draft = 0;
        for child in &children {
            match self.task(*child)?.status {
                TaskStatus::Done => done += 1,
                TaskStatus::InProgress => in_progress += 1,
                TaskStatus::Draft => draft += 1,
                TaskStatus::Ready => {}
            }
        }

        let status = if done == children.len() {
            TaskStatus::Done
        } else if done > 0 || in_progress > 0 {
            TaskStatus::InProgress
        } else if draft == children.len() {
            TaskStatus::Draft
        } else {
            TaskStatus::Ready
        };
        Ok(status)
    }

    pub fn set_name(&mut self, id: TaskId, name: impl Into<String>) -> Result<(), TreeError> {
        let task = self.task_mut(id)?;
        task.name = name.into();
        task.touch();
        Ok(())
    }

    /// Collapses or expands the subtree below `id`
    pub fn set_hidden(&mut self, id: TaskId, hidden: bool) -> Result<(), TreeError> {
        let task = self.task_mut(id)?;
        if task.hidden != hidden {
            task.hidden = hidden;
            task.touch();
        }
        Ok(())
    }

    pub fn toggle_hidden(&mut self, id: TaskId) -> Result<(), TreeError> {
        let hidden = self.task(id)?.hidden;
        self.set_hidden(id, !hidden)
    }

    /// Rewrites depths for `from` and its subtree from the current
    /// parent links. Pre-order, so parents settle before children.
    fn refresh_depths(&mut self, from: TaskId) -> Result<(), TreeError> {
        for id in self.descendant_ids(from, false) {
            let parent = self.task(id)?.parent;
            let depth = self.task(parent)?.depth + 1;
            self.task_mut(id)?.depth = depth;
        }
        Ok(())
    }

    // ---- blockers ------------------------------------------------------

    /// Validity predicate for a candidate pair: no self pairs, and no
    /// pairs where either side contains the other (containment already
    /// expresses ordering). Ancestry is directional, so both roles are
    /// checked.
    ///
    /// Callers gate insertion through this; [`add_blocker_pair`](Self::add_blocker_pair)
    /// does not re-validate.
    pub fn is_valid_blocker_pair(&self, pair: BlockerPair) -> Result<bool, TreeError> {
        if pair.blocker == pair.blocked {
            return Ok(false);
        }
        if self.is_ancestor_of(pair.blocker, pair.blocked)?
            || self.is_ancestor_of(pair.blocked, pair.blocker)?
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Stores a pair; both endpoints must exist. Validity is the
    /// caller's contract, checked via [`is_valid_blocker_pair`](Self::is_valid_blocker_pair).
    pub fn add_blocker_pair(&mut self, pair: BlockerPair) -> Result<(), TreeError> {
        self.task(pair.blocker)?;
        self.task(pair.blocked)?;
        self.blockers.insert(pair);
        Ok(())
    }

    /// Removes a pair; returns false if it was not present
    pub fn remove_blocker_pair(&mut self, pair: BlockerPair) -> bool {
        self.blockers.remove(pair)
    }

    pub fn contains_blocker_pair(&self, pair: BlockerPair) -> bool {
        self.blockers.contains(pair)
    }

    /// Every stored pair, for snapshot export and edge rendering
    pub fn blocker_pairs(&self) -> Vec<BlockerPair> {
        self.blockers.pairs()
    }

    /// Returns true if some unfinished task blocks `id`. Finished
    /// tasks are never considered blocked.
    pub fn is_task_blocked(&self, id: TaskId) -> Result<bool, TreeError> {
        if self.task(id)?.status.is_complete() {
            return Ok(false);
        }
        for blocker in self.blockers.blockers_of(id) {
            if !self.task(blocker)?.status.is_complete() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns true if `id` is unfinished and holds up some other
    /// unfinished task
    pub fn is_task_blocking(&self, id: TaskId) -> Result<bool, TreeError> {
        if self.task(id)?.status.is_complete() {
            return Ok(false);
        }
        for blocked in self.blockers.blocked_by(id) {
            if !self.task(blocked)?.status.is_complete() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
