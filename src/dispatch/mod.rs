//! Interactive functions and their invocation
//!
//! A configuration declares a set of [`DynamicFunction`]s. The user picks one
//! through a [`FunctionSelection`], fills in one raw input per parameter and
//! invokes it once every input validates. Invocation casts the inputs and
//! asks the function body for a step producer, which is then handed to the
//! executor by the caller.

pub mod input;

pub use input::{InputKind, ParamSpec, ParamValue};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::StepSource;
use crate::error::{AlgoVizError, Result};
use crate::graph::Graph;

/// Inclusive range of display lines belonging to a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Range over all of `len` display lines
    pub fn covering(len: usize) -> Self {
        Self::new(0, len.saturating_sub(1))
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces the step producer for one invocation
pub trait FunctionBody: Send + Sync {
    /// Start a run against `graph` with already cast arguments
    fn invoke(&self, graph: &Graph, args: Vec<ParamValue>) -> Result<Box<dyn StepSource>>;
}

/// A user-invocable function declared by a configuration
#[derive(Clone)]
pub struct DynamicFunction {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub line_range: LineRange,
    body: Arc<dyn FunctionBody>,
}

impl DynamicFunction {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        line_range: LineRange,
        body: Arc<dyn FunctionBody>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            line_range,
            body,
        }
    }

    /// Cast `raw` inputs and start a run
    pub fn invoke(&self, graph: &Graph, raw: &[String]) -> Result<Box<dyn StepSource>> {
        if raw.len() != self.params.len() {
            return Err(AlgoVizError::Runtime(format!(
                "'{}' expects {} argument(s), got {}",
                self.name,
                self.params.len(),
                raw.len()
            )));
        }
        let args = self
            .params
            .iter()
            .zip(raw)
            .map(|(spec, raw)| spec.cast(raw))
            .collect::<Result<Vec<_>>>()?;
        debug!(function = %self.name, args = ?args, "Invoking function");
        self.body.invoke(graph, args)
    }
}

impl fmt::Debug for DynamicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("line_range", &self.line_range)
            .finish_non_exhaustive()
    }
}

/// Ordered set of functions from one configuration
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<DynamicFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function; a later one with the same name replaces the earlier
    pub fn register(&mut self, function: DynamicFunction) {
        match self.functions.iter_mut().find(|f| f.name == function.name) {
            Some(existing) => *existing = function,
            None => self.functions.push(function),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DynamicFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicFunction> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Start a selection for the named function
    pub fn select(&self, name: &str) -> Result<FunctionSelection> {
        self.get(name)
            .cloned()
            .map(FunctionSelection::new)
            .ok_or_else(|| AlgoVizError::Runtime(format!("Unknown function '{}'", name)))
    }
}

/// The function picked by the user and its raw parameter inputs
#[derive(Debug, Clone)]
pub struct FunctionSelection {
    function: DynamicFunction,
    inputs: Vec<String>,
}

impl FunctionSelection {
    pub fn new(function: DynamicFunction) -> Self {
        let inputs = vec![String::new(); function.params.len()];
        Self { function, inputs }
    }

    pub fn function(&self) -> &DynamicFunction {
        &self.function
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Set the raw input of parameter `index`
    pub fn set_input(&mut self, index: usize, raw: impl Into<String>) -> Result<()> {
        let len = self.inputs.len();
        let slot = self.inputs.get_mut(index).ok_or(AlgoVizError::Index {
            op: "set_input",
            index,
            len,
        })?;
        *slot = raw.into();
        Ok(())
    }

    /// Set the raw input of the parameter called `name`
    pub fn set_input_by_name(&mut self, name: &str, raw: impl Into<String>) -> Result<()> {
        let index = self
            .function
            .params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| AlgoVizError::Validation {
                param: name.to_string(),
                message: format!("'{}' has no such parameter", self.function.name),
            })?;
        self.set_input(index, raw)
    }

    /// Validation result per parameter, in declaration order
    pub fn validation(&self) -> Vec<Result<()>> {
        self.function
            .params
            .iter()
            .zip(&self.inputs)
            .map(|(spec, raw)| spec.validate(raw))
            .collect()
    }

    /// True when every parameter validates
    pub fn can_invoke(&self) -> bool {
        self.validation().iter().all(|r| r.is_ok())
    }

    /// Invoke with the current inputs
    ///
    /// Fails with the first validation error if any input is invalid.
    pub fn invoke(&self, graph: &Graph) -> Result<Box<dyn StepSource>> {
        if let Some(err) = self.validation().into_iter().find_map(|r| r.err()) {
            return Err(err);
        }
        self.function.invoke(graph, &self.inputs)
    }
}
