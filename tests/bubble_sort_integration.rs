//! Integration tests for the bubble sort template
//!
//! These tests play the built-in bubble sort end to end:
//! - The bars end up sorted
//! - Every step reaches the observer exactly once, in order
//! - Geometry stays consistent with the values

mod common;

use algoviz_rs::animation::{AnimationObserver, StepLog};
use algoviz_rs::layout::{GeometrySnapshot, MAX_BAR_HEIGHT, MIN_BAR_HEIGHT};
use algoviz_rs::scripting::builtins;
use algoviz_rs::{
    AnimationConfig, AnimationState, Animator, Graph, ScriptEngine, SelectionMode, StepSource,
};
use common::{assert_float_eq, numbers, play_frames};

/// Line sequence the bubble sort script yields for the template's values
fn expected_lines() -> Vec<usize> {
    let config = AnimationConfig::from_template(&builtins::BUBBLE_SORT);
    let registry = ScriptEngine::new()
        .load_functions(&config.executable, config.display_lines.len())
        .unwrap();
    let mut graph = Graph::new(
        config.structure,
        config.effective_node_kind(),
        config.initial_values.clone(),
    )
    .unwrap();
    let mut run: Box<dyn StepSource> = registry
        .get("Bubble sort")
        .unwrap()
        .invoke(&graph, &[])
        .unwrap();
    std::iter::from_fn(|| run.next_step(&mut graph))
        .map(|step| step.unwrap().line())
        .collect()
}

#[test]
fn test_bubble_sort_sorts_bars() {
    let mut animator = Animator::default();
    animator.load_template("bubbleSort").unwrap();
    assert_eq!(numbers(&animator), vec![9.0, 1.0, 5.0, 7.0, 2.0, 4.0, 3.0]);

    let mut log = StepLog::new();
    animator.run("Bubble sort", &[]).unwrap();
    let played = play_frames(&mut animator, &mut log, 16).unwrap();

    assert_eq!(animator.state(), AnimationState::Done);
    assert_eq!(numbers(&animator), vec![1.0, 2.0, 3.0, 4.0, 5.0, 7.0, 9.0]);
    assert_eq!(played, log.step_count());
    assert!(log.finished());
}

#[test]
fn test_every_step_is_observed_once_in_order() {
    let mut animator = Animator::default();
    animator.load_template("Bubble sort").unwrap();
    let mut log = StepLog::new();
    animator.run("Bubble sort", &[]).unwrap();
    animator.run_to_end(&mut log).unwrap();

    let expected = expected_lines();
    assert!(!expected.is_empty());
    assert_eq!(log.lines(), expected);
    assert_eq!(log.lines().first(), Some(&0));
    assert_eq!(log.lines().last(), Some(&8));
}

#[test]
fn test_sorted_geometry() {
    let mut animator = Animator::default();
    animator.load_template("bubbleSort").unwrap();
    let mut log = StepLog::new();
    animator.run("Bubble sort", &[]).unwrap();
    animator.run_to_end(&mut log).unwrap();

    let snapshot: GeometrySnapshot = log.last_snapshot.clone().unwrap();
    assert_eq!(snapshot.nodes.len(), 7);
    for pair in snapshot.nodes.windows(2) {
        assert!(pair[0].left < pair[1].left);
    }
    // lo = 0, hi = 9
    for node in &snapshot.nodes {
        let value = node.value.as_number().unwrap();
        let expected = value * MAX_BAR_HEIGHT / 9.0 + MIN_BAR_HEIGHT;
        assert_float_eq(node.height.unwrap(), expected, 1e-9);
    }
    assert!(snapshot
        .nodes
        .iter()
        .all(|n| n.selection_mode == SelectionMode::Selected));
}

#[test]
fn test_ids_follow_their_values() {
    let mut animator = Animator::default();
    animator.load_template("bubbleSort").unwrap();
    let id_of_nine = animator.graph().unwrap().get(0).unwrap().id;

    let mut log = StepLog::new();
    animator.run("Bubble sort", &[]).unwrap();
    animator.run_to_end(&mut log).unwrap();

    let graph = animator.graph().unwrap();
    assert_eq!(graph.get(6).unwrap().id, id_of_nine);
    let mut ids: Vec<u64> = graph.nodes().iter().map(|n| n.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..7).collect::<Vec<_>>());
}

struct CountingObserver {
    steps: usize,
    finished: usize,
}

impl AnimationObserver for CountingObserver {
    fn on_step(&mut self, _line: usize, comment: &str) {
        assert!(!comment.is_empty());
        self.steps += 1;
    }

    fn on_finished(&mut self) {
        self.finished += 1;
    }
}

#[test]
fn test_finished_is_reported_once() {
    let mut animator = Animator::default();
    animator.load_template("bubbleSort").unwrap();
    let mut observer = CountingObserver {
        steps: 0,
        finished: 0,
    };
    animator.run("Bubble sort", &[]).unwrap();
    animator.run_to_end(&mut observer).unwrap();
    animator.advance_by(10_000, &mut observer).unwrap();

    assert_eq!(observer.steps, expected_lines().len());
    assert_eq!(observer.finished, 1);
}
