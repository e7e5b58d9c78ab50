//! Recording and replaying script runs
//!
//! A script body runs to completion against a detached copy of the graph.
//! Every mutation and every `step` call is appended to a trace; a
//! [`ScriptedRun`] then replays that trace against the live graph, one step
//! per call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rhai::{Array, Dynamic, EvalAltResult, INT};
use tracing::warn;

use crate::animation::{Step, StepSource};
use crate::error::{AlgoVizError, Result};
use crate::graph::{Graph, GraphOp};
use crate::types::{HexColor, NodeValue, SelectionMode};

/// Maximum number of events a single run may record
pub const MAX_TRACE_EVENTS: usize = 100_000;

type RhaiResult<T> = std::result::Result<T, Box<EvalAltResult>>;

/// One recorded event of a script run
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// A mutation to replay on the live graph
    Mutate(GraphOp),
    /// A point where playback pauses
    Step(Step),
    /// The script failed here
    Fault(String),
}

/// The state a script body mutates while it runs
#[derive(Debug)]
pub struct Rehearsal {
    graph: Graph,
    trace: Vec<TraceEvent>,
    max_events: usize,
}

impl Rehearsal {
    pub fn new(graph: Graph, max_events: usize) -> Self {
        Self {
            graph,
            trace: Vec::new(),
            max_events,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    fn record(&mut self, event: TraceEvent) -> Result<()> {
        if self.trace.len() >= self.max_events {
            return Err(AlgoVizError::Runtime(format!(
                "Run exceeded the limit of {} recorded events",
                self.max_events
            )));
        }
        self.trace.push(event);
        Ok(())
    }

    /// Apply `op` to the rehearsal graph and record it
    pub fn mutate(&mut self, op: GraphOp) -> Result<Option<NodeValue>> {
        let out = self.graph.apply(&op)?;
        self.record(TraceEvent::Mutate(op))?;
        Ok(out)
    }

    /// Record a step
    pub fn step(&mut self, step: Step) -> Result<()> {
        self.record(TraceEvent::Step(step))
    }

    /// Whether a fault has been recorded
    pub fn has_fault(&self) -> bool {
        self.trace.iter().any(|e| matches!(e, TraceEvent::Fault(_)))
    }

    /// Record a terminal fault; only the first one is kept
    pub fn fault(&mut self, message: impl Into<String>) {
        if !self.has_fault() {
            self.trace.push(TraceEvent::Fault(message.into()));
        }
    }

    /// Consume the rehearsal, keeping only the trace
    pub fn into_trace(self) -> Vec<TraceEvent> {
        self.trace
    }
}

/// The `graph` value scripts receive as their first argument
#[derive(Debug, Clone)]
pub struct GraphHandle(Arc<Mutex<Rehearsal>>);

impl GraphHandle {
    pub fn new(rehearsal: Rehearsal) -> Self {
        Self(Arc::new(Mutex::new(rehearsal)))
    }

    fn with<T>(&self, f: impl FnOnce(&mut Rehearsal) -> Result<T>) -> RhaiResult<T> {
        let mut rehearsal = self
            .0
            .lock()
            .map_err(|e| format!("Graph handle poisoned: {}", e))?;
        f(&mut rehearsal).map_err(|e| e.to_string().into())
    }

    /// Record a fault unless the run already holds one
    pub fn fault(&self, message: impl Into<String>) {
        if let Ok(mut rehearsal) = self.0.lock() {
            rehearsal.fault(message);
        }
    }

    /// Take the recorded trace out of the handle
    pub fn take_trace(&self) -> Vec<TraceEvent> {
        self.0
            .lock()
            .map(|mut r| std::mem::take(&mut r.trace))
            .unwrap_or_default()
    }

    pub fn len(&mut self) -> RhaiResult<INT> {
        self.with(|r| Ok(r.graph.len() as INT))
    }

    pub fn get(&mut self, index: INT) -> RhaiResult<Dynamic> {
        self.with(|r| {
            let len = r.graph.len();
            let index = to_index("get", index, len)?;
            r.graph
                .get(index)
                .map(|node| to_dynamic(&node.value))
                .ok_or(AlgoVizError::Index {
                    op: "get",
                    index,
                    len,
                })
        })
    }

    pub fn values(&mut self) -> RhaiResult<Array> {
        self.with(|r| Ok(r.graph.values().iter().map(to_dynamic).collect()))
    }

    pub fn push(&mut self, value: Dynamic) -> RhaiResult<()> {
        let value = to_node_value(value)?;
        self.with(|r| r.mutate(GraphOp::Push(value)).map(drop))
    }

    pub fn pop(&mut self) -> RhaiResult<Dynamic> {
        self.with(|r| r.mutate(GraphOp::Pop).map(removed))
    }

    pub fn unshift(&mut self, value: Dynamic) -> RhaiResult<()> {
        let value = to_node_value(value)?;
        self.with(|r| r.mutate(GraphOp::Unshift(value)).map(drop))
    }

    pub fn shift(&mut self) -> RhaiResult<Dynamic> {
        self.with(|r| r.mutate(GraphOp::Shift).map(removed))
    }

    pub fn insert_at(&mut self, index: INT, value: Dynamic) -> RhaiResult<()> {
        let value = to_node_value(value)?;
        self.with(|r| {
            let index = to_index("insert_at", index, r.graph.len())?;
            r.mutate(GraphOp::InsertAt(index, value)).map(drop)
        })
    }

    pub fn remove_at(&mut self, index: INT) -> RhaiResult<Dynamic> {
        self.with(|r| {
            let index = to_index("remove_at", index, r.graph.len())?;
            r.mutate(GraphOp::RemoveAt(index)).map(removed)
        })
    }

    pub fn replace_at(&mut self, index: INT, value: Dynamic) -> RhaiResult<Dynamic> {
        let value = to_node_value(value)?;
        self.with(|r| {
            let index = to_index("replace_at", index, r.graph.len())?;
            r.mutate(GraphOp::ReplaceAt(index, value)).map(removed)
        })
    }

    pub fn swap(&mut self, i: INT, j: INT) -> RhaiResult<()> {
        self.with(|r| {
            let len = r.graph.len();
            let (i, j) = (to_index("swap", i, len)?, to_index("swap", j, len)?);
            r.mutate(GraphOp::Swap(i, j)).map(drop)
        })
    }

    pub fn set_mode(&mut self, index: INT, mode: SelectionMode) -> RhaiResult<()> {
        self.with(|r| {
            let index = to_index(mode_op(mode), index, r.graph.len())?;
            r.mutate(GraphOp::SetMode(index, mode)).map(drop)
        })
    }

    pub fn set_color(&mut self, index: INT, color: &str) -> RhaiResult<()> {
        let color = HexColor::parse(color).map_err(|e| e.to_string())?;
        self.with(|r| {
            let index = to_index("set_color", index, r.graph.len())?;
            r.mutate(GraphOp::SetColor(index, color)).map(drop)
        })
    }

    pub fn append_values(&mut self, values: Array) -> RhaiResult<()> {
        let values = values
            .into_iter()
            .map(to_node_value)
            .collect::<RhaiResult<Vec<_>>>()?;
        self.with(|r| {
            for value in values {
                r.mutate(GraphOp::Push(value))?;
            }
            Ok(())
        })
    }

    pub fn step(&mut self, line: INT) -> RhaiResult<()> {
        let line = to_line(line)?;
        self.with(|r| r.step(Step::Line(line)))
    }

    pub fn step_with_comment(&mut self, line: INT, comment: &str) -> RhaiResult<()> {
        let line = to_line(line)?;
        self.with(|r| r.step(Step::annotated(line, comment)))
    }
}

fn mode_op(mode: SelectionMode) -> &'static str {
    match mode {
        SelectionMode::Selected => "select",
        SelectionMode::Compared => "compare",
        _ => "clear_mode",
    }
}

fn removed(value: Option<NodeValue>) -> Dynamic {
    value.as_ref().map(to_dynamic).unwrap_or(Dynamic::UNIT)
}

fn to_index(op: &'static str, index: INT, len: usize) -> Result<usize> {
    usize::try_from(index).map_err(|_| {
        AlgoVizError::Runtime(format!(
            "{}: index {} is negative (length {})",
            op, index, len
        ))
    })
}

fn to_line(line: INT) -> RhaiResult<usize> {
    usize::try_from(line).map_err(|_| format!("Invalid line number {}", line).into())
}

/// Convert a script value into a node value
pub fn to_node_value(value: Dynamic) -> RhaiResult<NodeValue> {
    if let Ok(i) = value.as_int() {
        return Ok(NodeValue::Number(i as f64));
    }
    if let Ok(f) = value.as_float() {
        return Ok(NodeValue::Number(f));
    }
    let type_name = value.type_name();
    value
        .into_string()
        .map(NodeValue::Text)
        .map_err(|_| format!("Nodes cannot hold a value of type {}", type_name).into())
}

/// Convert a node value into a script value; whole numbers become integers
pub fn to_dynamic(value: &NodeValue) -> Dynamic {
    match value {
        NodeValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Dynamic::from_int(*n as INT),
        NodeValue::Number(n) => Dynamic::from_float(*n),
        NodeValue::Text(s) => Dynamic::from(s.clone()),
    }
}

/// Step producer replaying a recorded trace against the live graph
#[derive(Debug)]
pub struct ScriptedRun {
    function: String,
    trace: VecDeque<TraceEvent>,
}

impl ScriptedRun {
    pub fn new(function: impl Into<String>, trace: Vec<TraceEvent>) -> Self {
        Self {
            function: function.into(),
            trace: trace.into(),
        }
    }

    /// Events not yet replayed
    pub fn remaining(&self) -> usize {
        self.trace.len()
    }
}

impl StepSource for ScriptedRun {
    fn next_step(&mut self, graph: &mut Graph) -> Option<Result<Step>> {
        while let Some(event) = self.trace.pop_front() {
            match event {
                TraceEvent::Mutate(op) => {
                    if let Err(e) = graph.apply(&op) {
                        self.trace.clear();
                        return Some(Err(AlgoVizError::Runtime(e.to_string())));
                    }
                }
                TraceEvent::Step(step) => return Some(Ok(step)),
                TraceEvent::Fault(message) => {
                    warn!(function = %self.function, error = %message, "Script fault reached");
                    self.trace.clear();
                    return Some(Err(AlgoVizError::Runtime(message)));
                }
            }
        }
        None
    }
}
