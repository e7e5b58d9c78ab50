//! Step executor: the timed player for step producers
//!
//! The executor is externally clocked. Instead of owning a timer thread it
//! keeps a virtual clock and at most one pending tick; the host calls
//! [`StepExecutor::advance_by`] with elapsed milliseconds and every tick that
//! falls due is fired in order. Tests drive it with a fake clock the same way.

use std::fmt;

use tracing::{debug, info, warn};

use super::observer::AnimationObserver;
use super::step::{Step, StepSource};
use super::tempo::TempoSource;
use crate::config::DisplayLine;
use crate::dispatch::LineRange;
use crate::error::{AlgoVizError, Result};
use crate::graph::Graph;

/// Poll interval while paused, in milliseconds
pub const PAUSE_POLL_MS: u64 = 100;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// Nothing loaded
    #[default]
    Idle,
    /// A step producer is loaded and waiting for `start`
    Ready,
    /// Ticks advance the producer
    Running,
    /// Ticks keep polling but do not advance
    Paused,
    /// The producer was exhausted
    Done,
}

impl AnimationState {
    /// Check if ticks are scheduled
    pub fn is_active(&self) -> bool {
        matches!(self, AnimationState::Running | AnimationState::Paused)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, AnimationState::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, AnimationState::Paused)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            AnimationState::Idle => "Idle",
            AnimationState::Ready => "Ready",
            AnimationState::Running => "Running",
            AnimationState::Paused => "Paused",
            AnimationState::Done => "Done",
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The function whose steps are being played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFunction {
    pub name: String,
    pub line_range: LineRange,
}

/// Plays a step producer one step per tick
pub struct StepExecutor {
    state: AnimationState,
    producer: Option<Box<dyn StepSource>>,
    active: Option<ActiveFunction>,
    display_lines: Vec<DisplayLine>,
    current_line: Option<usize>,
    current_comment: Option<String>,
    tempo: Box<dyn TempoSource>,
    clock_ms: u64,
    pending_tick: Option<u64>,
    steps_played: usize,
}

impl StepExecutor {
    /// Create an idle executor reading its delay from `tempo`
    pub fn new(tempo: Box<dyn TempoSource>) -> Self {
        Self {
            state: AnimationState::Idle,
            producer: None,
            active: None,
            display_lines: Vec::new(),
            current_line: None,
            current_comment: None,
            tempo,
            clock_ms: 0,
            pending_tick: None,
            steps_played: 0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Line highlighted by the last step
    pub fn current_line(&self) -> Option<usize> {
        self.current_line
    }

    /// Comment shown for the last step
    pub fn current_comment(&self) -> Option<&str> {
        self.current_comment.as_deref()
    }

    /// Name of the loaded function
    pub fn current_function(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    pub fn active_function(&self) -> Option<&ActiveFunction> {
        self.active.as_ref()
    }

    /// Display lines of the active function only
    pub fn function_lines(&self) -> &[DisplayLine] {
        let Some(active) = &self.active else {
            return &[];
        };
        let start = active.line_range.start.min(self.display_lines.len());
        let end = (active.line_range.end + 1).min(self.display_lines.len());
        &self.display_lines[start..end.max(start)]
    }

    pub fn display_lines(&self) -> &[DisplayLine] {
        &self.display_lines
    }

    /// Replace the code/comment lines steps refer to
    pub fn set_display_lines(&mut self, lines: Vec<DisplayLine>) {
        self.display_lines = lines;
    }

    /// Replace the tempo source
    pub fn set_tempo(&mut self, tempo: Box<dyn TempoSource>) {
        self.tempo = tempo;
    }

    /// Virtual time in milliseconds
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// When the pending tick fires, if one is scheduled
    pub fn next_tick_at(&self) -> Option<u64> {
        self.pending_tick
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending_tick.is_some()
    }

    /// Steps played since the producer was loaded
    pub fn steps_played(&self) -> usize {
        self.steps_played
    }

    /// Load a producer, replacing (and clearing) any previous run
    ///
    /// Playback does not start until [`StepExecutor::start`].
    pub fn load(&mut self, producer: Box<dyn StepSource>, active: ActiveFunction) {
        self.clear();
        debug!(function = %active.name, "Loaded step producer");
        self.producer = Some(producer);
        self.active = Some(active);
        self.state = AnimationState::Ready;
    }

    /// Start playback of a loaded producer
    ///
    /// The first tick fires immediately. Returns false when nothing was
    /// started (no producer loaded, or already playing).
    pub fn start(&mut self) -> bool {
        if self.state != AnimationState::Ready {
            return false;
        }
        info!(function = ?self.current_function(), "Animation started");
        self.state = AnimationState::Running;
        self.pending_tick = Some(self.clock_ms);
        true
    }

    /// Suspend advancement; ticks keep polling
    pub fn pause(&mut self) {
        if self.state == AnimationState::Running {
            debug!("Animation paused");
            self.state = AnimationState::Paused;
        }
    }

    /// Resume advancement at the next poll
    pub fn resume(&mut self) {
        if self.state == AnimationState::Paused {
            debug!("Animation resumed");
            self.state = AnimationState::Running;
        }
    }

    /// Pause if running, resume if paused
    pub fn toggle_pause(&mut self) {
        match self.state {
            AnimationState::Running => self.pause(),
            AnimationState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Cancel the pending tick, drop the producer and reset all highlight
    /// state. Safe to call in any state.
    pub fn clear(&mut self) {
        if self.state != AnimationState::Idle {
            debug!(state = %self.state, "Animation cleared");
        }
        self.pending_tick = None;
        self.producer = None;
        self.active = None;
        self.current_line = None;
        self.current_comment = None;
        self.steps_played = 0;
        self.state = AnimationState::Idle;
    }

    /// Move the clock forward and fire every tick that falls due
    ///
    /// Returns the number of steps played. A failing step clears the run
    /// (the graph keeps its last successful mutation) and the error is
    /// returned.
    pub fn advance_by(
        &mut self,
        elapsed_ms: u64,
        graph: &mut Graph,
        observer: &mut dyn AnimationObserver,
    ) -> Result<usize> {
        let target = self.clock_ms.saturating_add(elapsed_ms);
        let mut played = 0;
        while let Some(due) = self.pending_tick {
            if due > target {
                break;
            }
            self.clock_ms = due;
            self.pending_tick = None;
            if self.tick(graph, observer)? {
                played += 1;
            }
            // saturated clock: the tick rescheduled onto itself
            if self.pending_tick == Some(due) {
                break;
            }
        }
        self.clock_ms = target;
        Ok(played)
    }

    /// Fire the pending tick now, regardless of when it is due
    pub fn tick_now(
        &mut self,
        graph: &mut Graph,
        observer: &mut dyn AnimationObserver,
    ) -> Result<bool> {
        if self.pending_tick.take().is_none() {
            return Ok(false);
        }
        self.tick(graph, observer)
    }

    fn tick(&mut self, graph: &mut Graph, observer: &mut dyn AnimationObserver) -> Result<bool> {
        match self.state {
            AnimationState::Paused => {
                self.pending_tick = Some(self.clock_ms.saturating_add(PAUSE_POLL_MS));
                Ok(false)
            }
            AnimationState::Running => self.advance_producer(graph, observer),
            _ => Ok(false),
        }
    }

    fn advance_producer(
        &mut self,
        graph: &mut Graph,
        observer: &mut dyn AnimationObserver,
    ) -> Result<bool> {
        let next = match self.producer.as_mut() {
            Some(producer) => producer.next_step(graph),
            None => None,
        };

        let step = match next {
            None => {
                self.finish(observer);
                return Ok(false);
            }
            Some(Err(err)) => return Err(self.fail(err)),
            Some(Ok(step)) => step,
        };

        let (line, comment) = match self.resolve(&step) {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail(err)),
        };

        observer.on_step(line, &comment);
        if let Some(snapshot) = graph.snapshot() {
            observer.on_structure_changed(&snapshot);
        }
        graph.settle();
        self.current_line = Some(line);
        self.current_comment = Some(comment);
        self.steps_played += 1;
        self.pending_tick = Some(self.clock_ms.saturating_add(self.tempo.delay_ms()));
        Ok(true)
    }

    /// Resolve a step to the line it highlights and the comment to show
    pub fn resolve(&self, step: &Step) -> Result<(usize, String)> {
        let line = step.line();
        let range = self
            .active
            .as_ref()
            .map(|a| a.line_range)
            .unwrap_or_else(|| LineRange::covering(self.display_lines.len()));

        let out_of_range = AlgoVizError::Range {
            line,
            start: range.start,
            end: range.end,
        };
        if !range.contains(line) {
            return Err(out_of_range);
        }
        let static_comment = self
            .function_lines()
            .get(line - range.start)
            .or_else(|| {
                self.active
                    .is_none()
                    .then(|| self.display_lines.get(line))
                    .flatten()
            })
            .map(|d| d.comment.clone());

        match (step.comment(), static_comment) {
            (Some(dynamic), _) => Ok((line, dynamic.to_string())),
            (None, Some(comment)) => Ok((line, comment)),
            (None, None) => Err(out_of_range),
        }
    }

    fn finish(&mut self, observer: &mut dyn AnimationObserver) {
        info!(steps = self.steps_played, "Animation finished");
        self.state = AnimationState::Done;
        self.producer = None;
        self.pending_tick = None;
        self.active = None;
        self.current_line = None;
        self.current_comment = None;
        observer.on_finished();
    }

    fn fail(&mut self, err: AlgoVizError) -> AlgoVizError {
        warn!(error = %err, "Animation aborted");
        self.clear();
        err
    }
}

impl fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepExecutor")
            .field("state", &self.state)
            .field("active", &self.active)
            .field("current_line", &self.current_line)
            .field("clock_ms", &self.clock_ms)
            .field("pending_tick", &self.pending_tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::observer::{MockAnimationObserver, StepLog};
    use crate::animation::step::PlainSteps;
    use crate::animation::tempo::{FixedTempo, MockTempoSource};
    use crate::types::{NodeKind, StructureKind};

    fn lines(n: usize) -> Vec<DisplayLine> {
        (0..n)
            .map(|i| DisplayLine::new(format!("code {}", i), format!("comment {}", i)))
            .collect()
    }

    fn graph() -> Graph {
        Graph::new(StructureKind::List, NodeKind::Square, Vec::new()).unwrap()
    }

    fn executor_with(steps: Vec<Step>, range: LineRange, delay: u64) -> StepExecutor {
        let mut executor = StepExecutor::new(Box::new(FixedTempo(delay)));
        executor.set_display_lines(lines(10));
        executor.load(
            Box::new(PlainSteps::new(steps)),
            ActiveFunction {
                name: "demo".to_string(),
                line_range: range,
            },
        );
        executor
    }

    #[test]
    fn test_initial_state_is_empty() {
        let executor = StepExecutor::new(Box::new(FixedTempo::default()));
        assert_eq!(executor.state(), AnimationState::Idle);
        assert_eq!(executor.current_line(), None);
        assert_eq!(executor.current_comment(), None);
        assert_eq!(executor.current_function(), None);
        assert!(!executor.has_pending_tick());
    }

    #[test]
    fn test_load_does_not_start() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let mut executor = executor_with(vec![Step::Line(1)], LineRange::new(0, 9), 100);
        assert_eq!(executor.state(), AnimationState::Ready);
        assert_eq!(executor.advance_by(1_000, &mut graph, &mut log).unwrap(), 0);
        assert!(log.events.is_empty());
    }

    #[test]
    fn test_plays_steps_in_order_with_tempo() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let steps = vec![Step::Line(3), Step::annotated(4, "dynamic"), Step::Line(5)];
        let mut executor = executor_with(steps, LineRange::new(2, 6), 100);
        assert!(executor.start());

        assert_eq!(executor.advance_by(0, &mut graph, &mut log).unwrap(), 1);
        assert_eq!(executor.current_line(), Some(3));
        assert_eq!(executor.current_comment(), Some("comment 3"));

        assert_eq!(executor.advance_by(99, &mut graph, &mut log).unwrap(), 0);
        assert_eq!(executor.advance_by(1, &mut graph, &mut log).unwrap(), 1);
        assert_eq!(executor.current_comment(), Some("dynamic"));

        assert_eq!(executor.advance_by(100, &mut graph, &mut log).unwrap(), 1);
        assert_eq!(executor.state(), AnimationState::Running);

        executor.advance_by(100, &mut graph, &mut log).unwrap();
        assert_eq!(executor.state(), AnimationState::Done);
        assert_eq!(log.lines(), vec![3, 4, 5]);
        assert!(log.finished());
        assert_eq!(executor.current_line(), None);
        assert_eq!(executor.current_function(), None);
        assert!(executor.active_function().is_none());
        assert!(!executor.has_pending_tick());
    }

    #[test]
    fn test_huge_delay_saturates_instead_of_overflowing() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let steps = vec![Step::Line(1), Step::Line(2)];
        let mut executor = executor_with(steps, LineRange::new(0, 9), u64::MAX);
        assert!(executor.start());

        assert_eq!(executor.advance_by(0, &mut graph, &mut log).unwrap(), 1);
        assert_eq!(executor.next_tick_at(), Some(u64::MAX));
        assert_eq!(executor.advance_by(u64::MAX, &mut graph, &mut log).unwrap(), 1);
        assert_eq!(executor.clock_ms(), u64::MAX);

        executor.pause();
        assert_eq!(executor.advance_by(1, &mut graph, &mut log).unwrap(), 0);
        assert_eq!(executor.next_tick_at(), Some(u64::MAX));
        assert_eq!(log.lines(), vec![1, 2]);
    }

    #[test]
    fn test_tempo_is_read_every_tick() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let mut tempo = MockTempoSource::new();
        tempo.expect_delay_ms().times(2).return_const(50u64);
        let mut executor = StepExecutor::new(Box::new(tempo));
        executor.set_display_lines(lines(3));
        executor.load(
            Box::new(PlainSteps::new(vec![Step::Line(0), Step::Line(1)])),
            ActiveFunction {
                name: "demo".to_string(),
                line_range: LineRange::new(0, 2),
            },
        );
        executor.start();
        executor.advance_by(200, &mut graph, &mut log).unwrap();
        assert_eq!(executor.state(), AnimationState::Done);
        assert_eq!(log.step_count(), 2);
    }

    #[test]
    fn test_pause_polls_without_advancing() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let steps = vec![Step::Line(0), Step::Line(1)];
        let mut executor = executor_with(steps, LineRange::new(0, 9), 1_000);
        executor.start();
        executor.advance_by(0, &mut graph, &mut log).unwrap();
        executor.pause();

        assert_eq!(executor.advance_by(5_000, &mut graph, &mut log).unwrap(), 0);
        assert!(executor.has_pending_tick());
        assert_eq!(log.step_count(), 1);

        executor.resume();
        // the next poll is at most PAUSE_POLL_MS away
        assert_eq!(executor.advance_by(PAUSE_POLL_MS, &mut graph, &mut log).unwrap(), 1);
        assert_eq!(log.lines(), vec![0, 1]);
    }

    #[test]
    fn test_pause_then_clear_stops_ticks() {
        let mut graph = graph();
        let steps = vec![Step::Line(0), Step::Line(1), Step::Line(2)];
        let mut executor = executor_with(steps, LineRange::new(0, 9), 100);

        let mut observer = MockAnimationObserver::new();
        observer.expect_on_step().times(1).returning(|_, _| ());
        observer.expect_on_structure_changed().returning(|_| ());
        observer.expect_on_finished().never();

        executor.start();
        executor.advance_by(0, &mut graph, &mut observer).unwrap();
        executor.toggle_pause();
        executor.clear();

        assert_eq!(executor.state(), AnimationState::Idle);
        assert_eq!(executor.current_line(), None);
        assert_eq!(executor.current_comment(), None);
        assert_eq!(executor.current_function(), None);
        assert!(!executor.has_pending_tick());

        assert_eq!(executor.advance_by(10_000, &mut graph, &mut observer).unwrap(), 0);
        executor.clear();
        assert_eq!(executor.state(), AnimationState::Idle);
    }

    #[test]
    fn test_line_outside_function_aborts_run() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let steps = vec![Step::Line(2), Step::Line(8), Step::Line(3)];
        let mut executor = executor_with(steps, LineRange::new(2, 4), 10);
        executor.start();
        let err = executor.advance_by(100, &mut graph, &mut log).unwrap_err();
        assert!(matches!(err, AlgoVizError::Range { line: 8, start: 2, end: 4 }));
        assert_eq!(executor.state(), AnimationState::Idle);
        assert_eq!(log.lines(), vec![2]);
        assert!(!executor.has_pending_tick());
    }

    #[test]
    fn test_line_beyond_display_lines_is_range_error() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let mut executor = executor_with(vec![Step::Line(12)], LineRange::new(0, 20), 10);
        executor.start();
        assert!(executor.advance_by(0, &mut graph, &mut log).is_err());
    }

    #[test]
    fn test_load_replaces_active_run() {
        let mut graph = graph();
        let mut log = StepLog::new();
        let mut executor = executor_with(vec![Step::Line(0); 5], LineRange::new(0, 9), 10);
        executor.start();
        executor.advance_by(0, &mut graph, &mut log).unwrap();

        executor.load(
            Box::new(PlainSteps::new(vec![Step::Line(7)])),
            ActiveFunction {
                name: "other".to_string(),
                line_range: LineRange::new(5, 9),
            },
        );
        assert_eq!(executor.state(), AnimationState::Ready);
        assert_eq!(executor.current_function(), Some("other"));
        assert_eq!(executor.current_line(), None);
        assert_eq!(executor.function_lines().len(), 5);
        assert!(executor.start());
        assert_eq!(executor.state(), AnimationState::Running);
    }

    #[test]
    fn test_start_requires_loaded_producer() {
        let mut executor = StepExecutor::new(Box::new(FixedTempo(10)));
        assert!(!executor.start());
        assert_eq!(executor.state(), AnimationState::Idle);
    }

    #[test]
    fn test_step_snapshot_carries_make_room_once() {
        use crate::graph::GraphOp;
        use crate::layout::FixedViewport;
        use crate::scripting::{ScriptedRun, TraceEvent};
        use crate::types::NodeValue;

        let mut graph = Graph::new(
            StructureKind::BarPlot,
            NodeKind::Bar,
            vec![NodeValue::Number(1.0), NodeValue::Number(2.0)],
        )
        .unwrap()
        .with_viewport(Box::new(FixedViewport::new(200.0, 300.0)))
        .unwrap();
        let trace = vec![
            TraceEvent::Mutate(GraphOp::Push(NodeValue::Number(3.0))),
            TraceEvent::Step(Step::Line(1)),
            TraceEvent::Step(Step::Line(2)),
        ];
        let mut executor = StepExecutor::new(Box::new(FixedTempo(10)));
        executor.set_display_lines(lines(10));
        executor.load(
            Box::new(ScriptedRun::new("push", trace)),
            ActiveFunction {
                name: "push".to_string(),
                line_range: LineRange::new(0, 9),
            },
        );
        assert!(executor.start());
        let mut log = StepLog::new();

        executor.advance_by(0, &mut graph, &mut log).unwrap();
        let snapshot = log.last_snapshot.clone().unwrap();
        // both old bars moved half a slot (17.5) to the left of the new one
        let shifted: Vec<f64> = snapshot.make_room.iter().map(|s| s.left).collect();
        assert_eq!(shifted, vec![50.0, 85.0]);
        assert_eq!(snapshot.nodes.len(), 3);
        assert!(graph.make_room_shifts().is_empty());

        executor.advance_by(10, &mut graph, &mut log).unwrap();
        assert!(log.last_snapshot.unwrap().make_room.is_empty());
    }
}
