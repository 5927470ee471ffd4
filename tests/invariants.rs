//! Property suite: arbitrary mutation sequences must leave the tree
//! navigable, and the layout engine must behave as a pure function of
//! its input.

use std::collections::HashMap;

use kurbo::Point;
use proptest::prelude::*;

use taskmap::{
    compute_positions, Algorithm, LayoutParams, TaskId, TaskStatus, TaskTree,
};

fn live_ids(tree: &TaskTree) -> Vec<TaskId> {
    tree.all_tasks()
        .filter(|t| !t.deleted)
        .map(|t| t.id)
        .collect()
}

fn status_from(raw: u16) -> TaskStatus {
    match raw % 4 {
        0 => TaskStatus::Draft,
        1 => TaskStatus::Ready,
        2 => TaskStatus::InProgress,
        _ => TaskStatus::Done,
    }
}

/// Applies one encoded operation, ignoring rejections: invalid picks
/// (the root, a descendant target) are part of the input space and
/// must fail without corrupting the tree.
fn apply(tree: &mut TaskTree, op: (u8, u16, u16)) {
    let (kind, a, b) = op;
    let live = live_ids(tree);
    let pick = |raw: u16| live[raw as usize % live.len()];

    match kind {
        // adds get double weight so trees actually grow
        0 | 1 => {
            let _ = tree.add_task(pick(a));
        }
        2 => {
            let _ = tree.remove_task_single(pick(a));
        }
        3 => {
            let _ = tree.remove_task_branch(pick(a));
        }
        4 => {
            let _ = tree.change_parent(pick(a), pick(b));
        }
        5 => {
            let id = pick(a);
            let parent = tree.task(id).unwrap().parent;
            let count = tree.children(parent, false).len();
            if count > 0 {
                let _ = tree.set_priority(id, b as usize % count);
            }
        }
        _ => {
            let _ = tree.set_status(pick(a), status_from(b));
        }
    }
}

fn assert_structure(tree: &TaskTree) {
    let arena_size = tree.all_tasks().count();
    let live: Vec<_> = tree.all_tasks().filter(|t| !t.deleted).collect();

    // exactly one live root, with the reserved parent and depth 0
    let roots: Vec<_> = live
        .iter()
        .filter(|t| t.parent == TaskId::NONE)
        .collect();
    assert_eq!(roots.len(), 1, "root invariant broken");
    assert_eq!(roots[0].id, TaskId::ROOT);
    assert_eq!(roots[0].depth, 0);

    let mut sibling_priorities: HashMap<TaskId, Vec<usize>> = HashMap::new();
    for task in &live {
        sibling_priorities
            .entry(task.parent)
            .or_default()
            .push(task.priority);

        if task.id == TaskId::ROOT {
            continue;
        }

        // depth: exactly one below a live parent
        let parent = tree.task(task.parent).unwrap();
        assert!(
            !parent.deleted,
            "live task {} hangs under tombstone {}",
            task.id, parent.id
        );
        assert_eq!(
            task.depth,
            parent.depth + 1,
            "depth invariant broken at {}",
            task.id
        );

        // acyclicity: the parent chain reaches the super-root within
        // the arena size
        let mut current = task.parent;
        let mut steps = 0;
        while current != TaskId::NONE {
            current = tree.task(current).unwrap().parent;
            steps += 1;
            assert!(steps <= arena_size, "parent cycle through {}", task.id);
        }
        assert!(!tree.is_ancestor_of(task.id, task.id).unwrap());
    }

    // priorities per live sibling group are exactly {0..k-1}
    for (parent, mut priorities) in sibling_priorities {
        priorities.sort_unstable();
        let expected: Vec<usize> = (0..priorities.len()).collect();
        assert_eq!(priorities, expected, "priority gap under {parent}");
    }
}

proptest! {
    #[test]
    fn mutation_sequences_preserve_invariants(
        ops in prop::collection::vec((0u8..7, any::<u16>(), any::<u16>()), 1..60)
    ) {
        let mut tree = TaskTree::new();
        for op in ops {
            apply(&mut tree, op);
            assert_structure(&tree);
        }
    }

    #[test]
    fn layout_is_deterministic_and_total(
        ops in prop::collection::vec((0u8..7, any::<u16>(), any::<u16>()), 1..40)
    ) {
        let mut tree = TaskTree::new();
        for op in ops {
            apply(&mut tree, op);
        }

        let visible = tree.visible_tasks(TaskId::ROOT).unwrap();
        let params = LayoutParams::default();
        for algorithm in [Algorithm::DefaultTree, Algorithm::SingleRow, Algorithm::DoubleRow] {
            let first = compute_positions(&visible, Point::new(7.0, -3.0), algorithm, &params)
                .unwrap();
            let second = compute_positions(&visible, Point::new(7.0, -3.0), algorithm, &params)
                .unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), visible.len());
            for position in first.values() {
                prop_assert!(position.x.is_finite() && position.y.is_finite());
            }
        }
    }

    #[test]
    fn default_tree_positions_never_coincide(
        ops in prop::collection::vec((0u8..2, any::<u16>(), any::<u16>()), 1..30)
    ) {
        // additive sequences build arbitrary tree shapes
        let mut tree = TaskTree::new();
        for op in ops {
            apply(&mut tree, op);
        }

        let visible = tree.visible_tasks(TaskId::ROOT).unwrap();
        let positions = compute_positions(
            &visible,
            Point::ZERO,
            Algorithm::DefaultTree,
            &LayoutParams::default(),
        )
        .unwrap();

        let placed: Vec<(TaskId, Point)> = positions.into_iter().collect();
        for (i, (id_a, a)) in placed.iter().enumerate() {
            for (id_b, b) in placed.iter().skip(i + 1) {
                let apart = (a.x - b.x).abs() > 1e-6 || (a.y - b.y).abs() > 1e-6;
                prop_assert!(apart, "{} and {} coincide at {:?}", id_a, id_b, a);
            }
        }
    }
}
