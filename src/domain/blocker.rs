//! Blocker relation between tasks
//!
//! A blocker pair is a directed "must finish before" edge between two
//! tasks, independent of parent/child containment. The graph stores
//! the raw relation; validity of a candidate pair against the tree
//! (no self pairs, no pairs along an ancestry line) is checked by
//! [`TaskTree::is_valid_blocker_pair`](super::TaskTree::is_valid_blocker_pair)
//! before insertion.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::id::TaskId;

/// A directed blocking edge: `blocker` must reach `Done` before
/// `blocked` counts as unblocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockerPair {
    pub blocker: TaskId,
    pub blocked: TaskId,
}

impl BlockerPair {
    pub fn new(blocker: TaskId, blocked: TaskId) -> Self {
        Self { blocker, blocked }
    }
}

/// The blocker relation over the whole tree
#[derive(Debug, Default)]
pub struct BlockerGraph {
    /// Edge direction: blocker -> blocked
    graph: DiGraph<TaskId, ()>,

    /// Map from task id to node index
    node_map: HashMap<TaskId, NodeIndex>,
}

impl BlockerGraph {
    /// Creates an empty relation
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    fn node(&mut self, id: TaskId) -> NodeIndex {
        match self.node_map.get(&id) {
            Some(idx) => *idx,
            None => {
                let idx = self.graph.add_node(id);
                self.node_map.insert(id, idx);
                idx
            }
        }
    }

    /// Inserts a pair; returns false if it was already present
    pub fn insert(&mut self, pair: BlockerPair) -> bool {
        if self.contains(pair) {
            return false;
        }
        let blocker = self.node(pair.blocker);
        let blocked = self.node(pair.blocked);
        self.graph.add_edge(blocker, blocked, ());
        true
    }

    /// Removes a pair; returns false if it was not present
    pub fn remove(&mut self, pair: BlockerPair) -> bool {
        let (Some(&blocker), Some(&blocked)) = (
            self.node_map.get(&pair.blocker),
            self.node_map.get(&pair.blocked),
        ) else {
            return false;
        };

        match self.graph.find_edge(blocker, blocked) {
            Some(edge) => {
                self.graph.remove_edge(edge);
                true
            }
            None => false,
        }
    }

    /// Returns true if the exact pair is present
    pub fn contains(&self, pair: BlockerPair) -> bool {
        let (Some(&blocker), Some(&blocked)) = (
            self.node_map.get(&pair.blocker),
            self.node_map.get(&pair.blocked),
        ) else {
            return false;
        };
        self.graph.find_edge(blocker, blocked).is_some()
    }

    /// Tasks that directly block `id`
    pub fn blockers_of(&self, id: TaskId) -> Vec<TaskId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks that `id` directly blocks
    pub fn blocked_by(&self, id: TaskId) -> Vec<TaskId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: TaskId, direction: Direction) -> Vec<TaskId> {
        let Some(&idx) = self.node_map.get(&id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    /// Every stored pair, for snapshot export
    pub fn pairs(&self) -> Vec<BlockerPair> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (blocker, blocked) = self.graph.edge_endpoints(edge)?;
                Some(BlockerPair {
                    blocker: *self.graph.node_weight(blocker)?,
                    blocked: *self.graph.node_weight(blocked)?,
                })
            })
            .collect()
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if no pairs are stored
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}
