//! End-to-end scenarios: mutate the tree, filter a visible set, lay it
//! out, and check the contract the rendering layer relies on.

use kurbo::Point;
use std::collections::HashMap;

use taskmap::{
    compute_positions, Algorithm, BlockerPair, LayoutParams, TaskId, TaskStatus, TaskTree,
};

fn layout(tree: &TaskTree, focus: TaskId) -> HashMap<TaskId, Point> {
    let visible = tree.visible_tasks(focus).unwrap();
    compute_positions(
        &visible,
        Point::ZERO,
        Algorithm::DefaultTree,
        &LayoutParams::default(),
    )
    .unwrap()
}

#[test]
fn every_visible_task_gets_exactly_one_position() {
    let mut tree = TaskTree::new();
    let backend = tree.add_task(TaskId::ROOT).unwrap();
    let frontend = tree.add_task(TaskId::ROOT).unwrap();
    for parent in [backend, frontend] {
        for _ in 0..3 {
            tree.add_task(parent).unwrap();
        }
    }

    let positions = layout(&tree, TaskId::ROOT);
    assert_eq!(positions.len(), tree.live_task_count());
    for task in tree.all_tasks().filter(|t| !t.deleted) {
        assert!(positions.contains_key(&task.id), "{} unplaced", task.id);
    }
}

#[test]
fn focus_scope_narrows_the_layout() {
    let mut tree = TaskTree::new();
    let backend = tree.add_task(TaskId::ROOT).unwrap();
    let frontend = tree.add_task(TaskId::ROOT).unwrap();
    let api = tree.add_task(backend).unwrap();
    let ui = tree.add_task(frontend).unwrap();

    let positions = layout(&tree, backend);

    // ancestors and descendants of the focus stay, siblings go
    for id in [TaskId::ROOT, backend, api] {
        assert!(positions.contains_key(&id));
    }
    for id in [frontend, ui] {
        assert!(!positions.contains_key(&id));
    }
}

#[test]
fn collapsing_a_branch_removes_it_from_the_layout() {
    let mut tree = TaskTree::new();
    let noisy = tree.add_task(TaskId::ROOT).unwrap();
    let child = tree.add_task(noisy).unwrap();
    let quiet = tree.add_task(TaskId::ROOT).unwrap();

    tree.toggle_hidden(noisy).unwrap();
    let positions = layout(&tree, TaskId::ROOT);

    // the collapsed task itself remains as the branch stub
    assert!(positions.contains_key(&noisy));
    assert!(!positions.contains_key(&child));
    assert!(positions.contains_key(&quiet));
}

#[test]
fn mutations_move_targets_deterministically() {
    let mut tree = TaskTree::new();
    let first = tree.add_task(TaskId::ROOT).unwrap();
    let second = tree.add_task(TaskId::ROOT).unwrap();

    let before = layout(&tree, TaskId::ROOT);
    assert!(before[&first].y < before[&second].y);

    // the drag layer settles a new display order and commits it back
    tree.set_priority(first, 1).unwrap();

    let after = layout(&tree, TaskId::ROOT);
    assert!(after[&second].y < after[&first].y);

    // swapping ranks swaps targets exactly
    assert_eq!(after[&first], before[&second]);
    assert_eq!(after[&second], before[&first]);
}

#[test]
fn deleting_a_middle_task_keeps_the_layout_connected() {
    let mut tree = TaskTree::new();
    let middle = tree.add_task(TaskId::ROOT).unwrap();
    let left = tree.add_task(middle).unwrap();
    let right = tree.add_task(middle).unwrap();

    tree.remove_task_single(middle).unwrap();
    let positions = layout(&tree, TaskId::ROOT);

    // promoted children are positioned as root children now
    assert!(!positions.contains_key(&middle));
    assert!(positions.contains_key(&left));
    assert!(positions.contains_key(&right));
    assert!(positions[&left].y < positions[&right].y);
}

#[test]
fn rollup_and_blockers_survive_a_snapshot_cycle() {
    let mut tree = TaskTree::new();
    let build = tree.add_task(TaskId::ROOT).unwrap();
    let test = tree.add_task(TaskId::ROOT).unwrap();
    let compile = tree.add_task(build).unwrap();
    let link = tree.add_task(build).unwrap();
    tree.set_name(build, "build").unwrap();
    tree.set_status(compile, TaskStatus::Done).unwrap();

    // one of two children finished: build rolls up to in-progress and
    // keeps blocking the test task
    assert_eq!(tree.status(build).unwrap(), TaskStatus::InProgress);
    let pair = BlockerPair::new(build, test);
    assert!(tree.is_valid_blocker_pair(pair).unwrap());
    tree.add_blocker_pair(pair).unwrap();

    let json = serde_json::to_string(&tree.snapshot()).unwrap();
    let restored = TaskTree::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

    assert_eq!(restored.name(build).unwrap(), "build");
    assert_eq!(restored.status(build).unwrap(), TaskStatus::InProgress);
    assert_eq!(restored.status(link).unwrap(), TaskStatus::Ready);
    assert!(restored.is_task_blocked(test).unwrap());

    // and the restored tree lays out like the original
    assert_eq!(layout(&restored, TaskId::ROOT), layout(&tree, TaskId::ROOT));
}

#[test]
fn reparented_subtrees_stay_layoutable() {
    let mut tree = TaskTree::new();
    let early = tree.add_task(TaskId::ROOT).unwrap();
    let late = tree.add_task(TaskId::ROOT).unwrap();
    let moved = tree.add_task(early).unwrap();
    let grandchild = tree.add_task(moved).unwrap();

    // move an early-created subtree under a later-created parent; the
    // engine must still resolve parents before children
    tree.change_parent(moved, late).unwrap();

    let positions = layout(&tree, TaskId::ROOT);
    let step = LayoutParams::default().horizontal_step;
    assert_eq!(positions.len(), 5);
    assert!((positions[&moved].x - (positions[&late].x + step)).abs() < 1e-9);
    assert!((positions[&grandchild].x - (positions[&moved].x + step)).abs() < 1e-9);
}
