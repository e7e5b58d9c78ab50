//! Playback control under a fake clock
//!
//! The executor never sleeps; these tests move its clock by hand and check
//! exactly when steps are delivered.

mod common;

use algoviz_rs::animation::{
    ActiveFunction, PlainSteps, SharedTempo, Step, StepExecutor, StepLog, PAUSE_POLL_MS,
};
use algoviz_rs::dispatch::LineRange;
use algoviz_rs::{AnimationState, Animator, DisplayLine, Graph, NodeKind, StructureKind};

fn executor(tempo: SharedTempo, steps: Vec<Step>) -> StepExecutor {
    let mut executor = StepExecutor::new(Box::new(tempo));
    executor.set_display_lines(
        (0..5)
            .map(|i| DisplayLine::new(format!("code {}", i), format!("comment {}", i)))
            .collect(),
    );
    executor.load(
        Box::new(PlainSteps::new(steps)),
        ActiveFunction {
            name: "walk".to_string(),
            line_range: LineRange::new(0, 4),
        },
    );
    executor
}

fn empty_graph() -> Graph {
    Graph::new(StructureKind::List, NodeKind::Square, Vec::new()).unwrap()
}

#[test]
fn test_start_pause_clear_leaves_nothing_behind() {
    let mut animator = Animator::default();
    animator.load_template("queue").unwrap();
    let mut log = StepLog::new();

    animator.run("Enqueue", &["3"]).unwrap();
    animator.advance_by(0, &mut log).unwrap();
    animator.toggle_pause();
    assert_eq!(animator.state(), AnimationState::Paused);
    animator.clear();

    let executor = animator.executor();
    assert_eq!(executor.state(), AnimationState::Idle);
    assert_eq!(executor.current_line(), None);
    assert_eq!(executor.current_comment(), None);
    assert_eq!(executor.current_function(), None);
    assert!(!executor.has_pending_tick());

    animator.advance_by(60_000, &mut log).unwrap();
    assert_eq!(log.step_count(), 1);
    assert!(!log.finished());
}

#[test]
fn test_tempo_changes_apply_to_the_next_step() {
    let tempo = SharedTempo::new(100);
    let mut executor = executor(tempo.clone(), vec![Step::Line(0), Step::Line(1), Step::Line(2)]);
    let mut graph = empty_graph();
    let mut log = StepLog::new();

    executor.start();
    executor.advance_by(0, &mut graph, &mut log).unwrap();
    assert_eq!(executor.next_tick_at(), Some(100));

    tempo.set(1_000);
    executor.advance_by(100, &mut graph, &mut log).unwrap();
    assert_eq!(log.lines(), vec![0, 1]);
    assert_eq!(executor.next_tick_at(), Some(1_100));
}

#[test]
fn test_paused_executor_polls() {
    let tempo = SharedTempo::new(100);
    let mut executor = executor(tempo, vec![Step::Line(0), Step::Line(1)]);
    let mut graph = empty_graph();
    let mut log = StepLog::new();

    executor.start();
    executor.pause();
    // the first tick finds the executor paused
    executor.advance_by(0, &mut graph, &mut log).unwrap();
    assert_eq!(log.step_count(), 0);
    assert_eq!(executor.next_tick_at(), Some(PAUSE_POLL_MS));

    executor.advance_by(PAUSE_POLL_MS * 3, &mut graph, &mut log).unwrap();
    assert_eq!(executor.next_tick_at(), Some(PAUSE_POLL_MS * 4));
    assert_eq!(log.step_count(), 0);

    executor.resume();
    executor.advance_by(PAUSE_POLL_MS, &mut graph, &mut log).unwrap();
    assert_eq!(log.lines(), vec![0]);
}

#[test]
fn test_many_ticks_in_one_advance_stay_ordered() {
    let tempo = SharedTempo::new(10);
    let steps = (0..5).map(Step::Line).collect();
    let mut executor = executor(tempo, steps);
    let mut graph = empty_graph();
    let mut log = StepLog::new();

    executor.start();
    let played = executor.advance_by(1_000, &mut graph, &mut log).unwrap();
    assert_eq!(played, 5);
    assert_eq!(log.lines(), vec![0, 1, 2, 3, 4]);
    assert!(log.finished());
    assert_eq!(executor.state(), AnimationState::Done);
}

#[test]
fn test_start_is_a_no_op_unless_ready() {
    let mut animator = Animator::default();
    animator.load_template("queue").unwrap();
    assert!(!animator.start());

    animator.select_function("Dequeue").unwrap();
    animator.invoke().unwrap();
    assert!(animator.start());
    assert!(!animator.start());
    assert_eq!(animator.state(), AnimationState::Running);
}
