//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use algoviz_rs::animation::{AnimationObserver, PlaybackEvent, StepLog};
use algoviz_rs::{Animator, NodeValue};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Numeric values of the animator's graph
pub fn numbers(animator: &Animator) -> Vec<f64> {
    animator
        .graph()
        .map(|g| g.values().iter().filter_map(NodeValue::as_number).collect())
        .unwrap_or_default()
}

/// Comments of every played step, in order
pub fn comments(log: &StepLog) -> Vec<String> {
    log.events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::Step { comment, .. } => Some(comment.clone()),
            PlaybackEvent::Finished => None,
        })
        .collect()
}

/// Play the current run to the end with a fake clock ticking `frame_ms`
pub fn play_frames(
    animator: &mut Animator,
    observer: &mut dyn AnimationObserver,
    frame_ms: u64,
) -> algoviz_rs::Result<usize> {
    let mut played = 0;
    let mut frames = 0;
    while animator.state().is_running() {
        played += animator.advance_by(frame_ms, observer)?;
        frames += 1;
        assert!(frames < 1_000_000, "animation did not finish");
    }
    Ok(played)
}
