//! Layout engine
//!
//! Converts a visible task set into absolute 2D positions. A bottom-up
//! subtree-extent pass reserves enough vertical room for every subtree,
//! then children are stacked tightly inside their parent's block and
//! absolute positions accumulate from a virtual super-root. Wide
//! shallow trees can opt into single-row or double-row packing of the
//! root's children.
//!
//! The engine is a pure function of its arguments: it re-filters
//! nothing (the caller picks the visible set) and keeps no state
//! between calls, so an unchanged input always yields identical
//! output.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{Task, TaskId};

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("task {task} references parent {parent}, which is not in the visible set")]
    MissingParent { task: TaskId, parent: TaskId },

    #[error("task {task} is not deeper than its parent {parent}")]
    DepthInversion { task: TaskId, parent: TaskId },

    #[error("row index is undefined under {algorithm:?}")]
    RowIndexUnsupported { algorithm: Algorithm },
}

/// Layout algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Vertically stacked subtrees, one depth level per column
    #[default]
    DefaultTree,
    /// The root's children forced onto one horizontal row
    SingleRow,
    /// The root's children alternated between two horizontal rows
    DoubleRow,
}

/// Tunable presentation constants
///
/// The defaults suit node cards a few hundred pixels wide. None of
/// these affect which positions exist, only where they land.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Fixed horizontal spacing between a parent and its children
    pub horizontal_step: f64,

    /// Vertical pixels per abstract sibling slot
    pub sibling_delta: f64,

    /// Where a node sits inside its subtree box: 0 top, 0.5 center,
    /// 1 bottom
    pub alignment_ratio: Vec2,

    /// Extra vertical extent added to every internal subtree so
    /// adjacent subtrees stay visually separated
    pub subtree_padding_y: f64,

    /// Horizontal gap between row-packed subtrees, as a fraction of
    /// `horizontal_step`
    pub row_gap_ratio: f64,

    /// Minimum clearance between a packed row and the root row, in
    /// sibling slots
    pub row_min_y_shift: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            horizontal_step: 400.0,
            sibling_delta: 90.0,
            alignment_ratio: Vec2::new(0.0, 0.5),
            subtree_padding_y: 0.15,
            row_gap_ratio: 0.25,
            row_min_y_shift: 0.3,
        }
    }
}

/// Which packed row a depth-1 task lands on
///
/// Defined only for the row-packing algorithms; asking under
/// [`Algorithm::DefaultTree`] is a contract violation.
pub fn row_index(algorithm: Algorithm, task: &Task) -> Result<usize, LayoutError> {
    match algorithm {
        Algorithm::SingleRow => Ok(0),
        Algorithm::DoubleRow => Ok(task.priority % 2),
        Algorithm::DefaultTree => Err(LayoutError::RowIndexUnsupported { algorithm }),
    }
}

/// Computes an absolute position for every task in `tasks`
///
/// `tasks` is the caller-filtered visible set; it must be connected to
/// the virtual super-root ([`TaskId::NONE`]) through tasks that are
/// themselves in the set, or the computation fails with
/// [`LayoutError::MissingParent`]. The returned map holds exactly one
/// entry per input task, translated by `origin`.
pub fn compute_positions(
    tasks: &[&Task],
    origin: Point,
    algorithm: Algorithm,
    params: &LayoutParams,
) -> Result<HashMap<TaskId, Point>, LayoutError> {
    let shifts = positions_in_parent_frame(tasks, algorithm, params)?;

    // Parents first, so every relative shift lands on a resolved base.
    let mut by_depth: Vec<&Task> = tasks.to_vec();
    by_depth.sort_by_key(|t| (t.depth, t.parent, t.priority));

    let mut positions: HashMap<TaskId, Point> = HashMap::with_capacity(tasks.len() + 1);
    positions.insert(TaskId::NONE, Point::ZERO);
    for task in &by_depth {
        let base = *positions
            .get(&task.parent)
            .ok_or(LayoutError::MissingParent {
                task: task.id,
                parent: task.parent,
            })?;
        positions.insert(task.id, base + shifts[&task.id]);
    }

    positions.remove(&TaskId::NONE);
    for position in positions.values_mut() {
        *position += origin.to_vec2();
    }
    Ok(positions)
}

/// Relative shift of every task from its parent's position
fn positions_in_parent_frame(
    tasks: &[&Task],
    algorithm: Algorithm,
    params: &LayoutParams,
) -> Result<HashMap<TaskId, Vec2>, LayoutError> {
    // The extent pass below trusts depth ordering; reject input whose
    // depths contradict its parent links before relying on them.
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, *t)).collect();
    for task in tasks {
        if let Some(parent) = by_id.get(&task.parent) {
            if task.depth != parent.depth + 1 {
                return Err(LayoutError::DepthInversion {
                    task: task.id,
                    parent: task.parent,
                });
            }
        }
    }

    // Bottom-up order: every child before its parent.
    let mut sorted: Vec<&Task> = tasks.to_vec();
    sorted.sort_by(|a, b| {
        b.depth
            .cmp(&a.depth)
            .then(a.parent.cmp(&b.parent))
            .then(a.priority.cmp(&b.priority))
    });

    // Sibling lists inherit the sort, so each one is priority-ordered.
    let mut children_by_parent: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for task in &sorted {
        children_by_parent.entry(task.parent).or_default().push(task.id);
    }

    // Subtree extents in abstract units: leaves are one slot, an
    // internal node spans one extra column and the padded sum of its
    // children's rows. Only ids present in `children_by_parent` have
    // children, so the horizontal max is never over an empty list.
    let mut extents: HashMap<TaskId, Vec2> = HashMap::new();
    for id in sorted.iter().map(|t| t.id).chain([TaskId::NONE]) {
        let extent = match children_by_parent.get(&id) {
            Some(children) => {
                let mut max_x = 0.0f64;
                let mut sum_y = 0.0;
                for child in children {
                    let child_extent = extents[child];
                    max_x = max_x.max(child_extent.x);
                    sum_y += child_extent.y;
                }
                Vec2::new(max_x + 1.0, sum_y + params.subtree_padding_y)
            }
            None => Vec2::new(1.0, 1.0),
        };
        extents.insert(id, extent);
    }

    // Offset of each child from the top of its parent's child block:
    // its own aligned offset plus the accumulated remainder of every
    // previous sibling. A running accumulation, not a fixed step, so
    // subtrees of different sizes pack tightly without overlap.
    let mut sibling_shifts: HashMap<TaskId, Vec2> = HashMap::new();
    for children in children_by_parent.values() {
        let mut previous: Option<TaskId> = None;
        for &child in children {
            let mut shift = component_mul(extents[&child], params.alignment_ratio);
            if let Some(prev) = previous {
                shift += component_mul(
                    extents[&prev],
                    Vec2::new(1.0, 1.0) - params.alignment_ratio,
                );
                shift += sibling_shifts[&prev];
            }
            sibling_shifts.insert(child, shift);
            previous = Some(child);
        }
    }

    // Each parent's own offset inside its subtree box, with the
    // padding backed out so the parent row lines up with the center of
    // its children block.
    let mut parent_align: HashMap<TaskId, Vec2> = HashMap::new();
    for &parent in children_by_parent.keys() {
        if let Some(extent) = extents.get(&parent) {
            let padded = *extent - Vec2::new(0.0, params.subtree_padding_y);
            parent_align.insert(parent, component_mul(padded, params.alignment_ratio));
        }
    }

    let mut shifts: HashMap<TaskId, Vec2> = HashMap::new();
    for task in &sorted {
        let parent_shift =
            parent_align
                .get(&task.parent)
                .copied()
                .ok_or(LayoutError::MissingParent {
                    task: task.id,
                    parent: task.parent,
                })?;
        let sibling_shift = sibling_shifts[&task.id];
        let vertical = (sibling_shift.y - parent_shift.y) * params.sibling_delta;
        shifts.insert(task.id, Vec2::new(params.horizontal_step, vertical));
    }

    let root_child_count = children_by_parent
        .get(&TaskId::ROOT)
        .map_or(0, |children| children.len());
    if root_child_count > 1 && algorithm != Algorithm::DefaultTree {
        pack_rows(&sorted, &extents, &parent_align, &mut shifts, algorithm, params)?;
    }

    Ok(shifts)
}

/// Rewrites the depth-1 shifts for the row-packing algorithms
fn pack_rows(
    sorted: &[&Task],
    extents: &HashMap<TaskId, Vec2>,
    parent_align: &HashMap<TaskId, Vec2>,
    shifts: &mut HashMap<TaskId, Vec2>,
    algorithm: Algorithm,
    params: &LayoutParams,
) -> Result<(), LayoutError> {
    // Priority order, courtesy of the caller's sort.
    let depth_one: Vec<&Task> = sorted.iter().copied().filter(|t| t.depth == 1).collect();

    // The tallest member of a row decides how far the whole row sits
    // from the root row. Childless members align at the bare ratio.
    let mut max_align: HashMap<usize, f64> = HashMap::new();
    for &task in &depth_one {
        let row = row_index(algorithm, task)?;
        let align_y = parent_align
            .get(&task.id)
            .map_or(params.alignment_ratio.y, |shift| shift.y);
        let slot = max_align.entry(row).or_insert(align_y);
        if align_y > *slot {
            *slot = align_y;
        }
    }
    let row_shift: HashMap<usize, f64> = max_align
        .into_iter()
        .map(|(row, max)| (row, (max + params.row_min_y_shift) * params.sibling_delta))
        .collect();

    match algorithm {
        Algorithm::SingleRow => {
            let mut width_acc = params.row_gap_ratio;
            for &task in &depth_one {
                let row = row_index(algorithm, task)?;
                let base = shifts[&task.id];
                shifts.insert(
                    task.id,
                    Vec2::new(
                        base.x + width_acc * params.horizontal_step,
                        row_shift[&row],
                    ),
                );
                width_acc += extents[&task.id].x + params.row_gap_ratio;
            }
        }
        Algorithm::DoubleRow => {
            // Width of each front-to-back pair of root children: the
            // wider of the two subtrees stacked at the same pair index.
            let mut pair_width: HashMap<usize, f64> = HashMap::new();
            for &task in &depth_one {
                let pair = task.priority / 2;
                let width = extents[&task.id].x;
                let slot = pair_width.entry(pair).or_insert(width);
                if width > *slot {
                    *slot = width;
                }
            }

            for &task in &depth_one {
                let pair = task.priority / 2;
                let mut preceding_width = 0.0;
                let mut preceding_count = 0usize;
                for k in 0..pair {
                    if let Some(width) = pair_width.get(&k) {
                        preceding_width += *width;
                        preceding_count += 1;
                    }
                }

                let row = row_index(algorithm, task)?;
                let magnitude = row_shift[&row];
                let y = if row == 0 { magnitude } else { -magnitude };

                let base = shifts[&task.id];
                let x = base.x
                    + (params.row_gap_ratio * (1 + preceding_count) as f64 + preceding_width)
                        * params.horizontal_step;
                shifts.insert(task.id, Vec2::new(x, y));
            }
        }
        Algorithm::DefaultTree => {}
    }
    Ok(())
}

fn component_mul(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x, a.y * b.y)
}
