//! Callbacks from the executor to the display layer

use crate::layout::GeometrySnapshot;

/// Receives playback events
///
/// `on_step` is called exactly once per played step, in order. The other
/// callbacks default to doing nothing.
#[cfg_attr(test, mockall::automock)]
pub trait AnimationObserver {
    /// Highlight `line` and show `comment`
    fn on_step(&mut self, line: usize, comment: &str);

    /// Geometry after the step's mutations were applied
    fn on_structure_changed(&mut self, _snapshot: &GeometrySnapshot) {}

    /// The step producer was exhausted
    fn on_finished(&mut self) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl AnimationObserver for NullObserver {
    fn on_step(&mut self, _line: usize, _comment: &str) {}
}

/// One recorded playback event
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Step { line: usize, comment: String },
    Finished,
}

/// Observer that keeps every event, plus the latest geometry
#[derive(Debug, Default, Clone)]
pub struct StepLog {
    pub events: Vec<PlaybackEvent>,
    pub last_snapshot: Option<GeometrySnapshot>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of every played step, in order
    pub fn lines(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Step { line, .. } => Some(*line),
                PlaybackEvent::Finished => None,
            })
            .collect()
    }

    /// Number of played steps
    pub fn step_count(&self) -> usize {
        self.lines().len()
    }

    pub fn finished(&self) -> bool {
        self.events.contains(&PlaybackEvent::Finished)
    }
}

impl AnimationObserver for StepLog {
    fn on_step(&mut self, line: usize, comment: &str) {
        self.events.push(PlaybackEvent::Step {
            line,
            comment: comment.to_string(),
        });
    }

    fn on_structure_changed(&mut self, snapshot: &GeometrySnapshot) {
        self.last_snapshot = Some(snapshot.clone());
    }

    fn on_finished(&mut self) {
        self.events.push(PlaybackEvent::Finished);
    }
}
