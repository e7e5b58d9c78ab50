//! Rhai Script Engine Implementation
//!
//! Compiles an animation's executable, reads the function descriptors it
//! evaluates to and turns each into a [`DynamicFunction`] whose body runs
//! the named script function against a rehearsal graph.
//!
//! ## Graph methods
//!
//! - `graph.len()`, `graph.get(i)`, `graph.values()`
//! - `graph.push(v)`, `graph.pop()`, `graph.unshift(v)`, `graph.shift()`
//! - `graph.insert_at(i, v)`, `graph.remove_at(i)`, `graph.replace_at(i, v)`
//! - `graph.swap(i, j)`, `graph.append_values([..])`
//! - `graph.select(i)`, `graph.compare(i)`, `graph.clear_mode(i)`,
//!   `graph.set_color(i, "#abc")`
//! - `graph.step(line)`, `graph.step(line, comment)`

use std::sync::Arc;

use rhai::{CallFnOptions, Dynamic, Engine, FnPtr, Map, Scope, AST};
use tracing::{debug, warn};

use super::rehearsal::{GraphHandle, Rehearsal, ScriptedRun, MAX_TRACE_EVENTS};
use super::{CompiledScript, SharedScriptCache};
use crate::animation::StepSource;
use crate::dispatch::{
    DynamicFunction, FunctionBody, FunctionRegistry, InputKind, LineRange, ParamSpec, ParamValue,
};
use crate::error::{AlgoVizError, Result, ResultExt};
use crate::graph::Graph;
use crate::types::{NodeValue, SelectionMode};

/// Name of the graph type as seen from scripts
pub const GRAPH_TYPE_NAME: &str = "Graph";

/// The script engine that loads animation functions
pub struct ScriptEngine {
    /// The Rhai engine instance
    engine: Arc<Engine>,
    /// Cache of compiled scripts
    cache: SharedScriptCache,
    /// Event cap for a single run
    max_trace_events: usize,
}

impl ScriptEngine {
    /// Create a new script engine with default configuration
    pub fn new() -> Self {
        Self::with_cache(super::create_shared_cache())
    }

    /// Create a new script engine with a shared cache
    pub fn with_cache(cache: SharedScriptCache) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);

        Self {
            engine: Arc::new(engine),
            cache,
            max_trace_events: MAX_TRACE_EVENTS,
        }
    }

    /// Change the event cap for runs started by functions loaded afterwards
    pub fn with_max_trace_events(mut self, max: usize) -> Self {
        self.max_trace_events = max;
        self
    }

    /// Configure the Rhai engine with the graph API and safety limits
    fn configure_engine(engine: &mut Engine) {
        // Set safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(64);
        engine.set_max_operations(1_000_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(10_000);
        engine.set_max_map_size(1_000);
        engine.disable_symbol("eval");

        engine.on_print(|s| debug!(target: "algoviz_rs::script", "{}", s));
        engine.on_debug(|s, _, pos| debug!(target: "algoviz_rs::script", "{:?} {}", pos, s));

        engine.register_type_with_name::<GraphHandle>(GRAPH_TYPE_NAME);

        // Queries
        engine.register_fn("len", GraphHandle::len);
        engine.register_fn("get", GraphHandle::get);
        engine.register_fn("values", GraphHandle::values);

        // Structural mutations
        engine.register_fn("push", GraphHandle::push);
        engine.register_fn("pop", GraphHandle::pop);
        engine.register_fn("unshift", GraphHandle::unshift);
        engine.register_fn("shift", GraphHandle::shift);
        engine.register_fn("insert_at", GraphHandle::insert_at);
        engine.register_fn("remove_at", GraphHandle::remove_at);
        engine.register_fn("replace_at", GraphHandle::replace_at);
        engine.register_fn("swap", GraphHandle::swap);
        engine.register_fn("append_values", GraphHandle::append_values);

        // Highlighting
        engine.register_fn("select", |g: &mut GraphHandle, i: rhai::INT| {
            g.set_mode(i, SelectionMode::Selected)
        });
        engine.register_fn("compare", |g: &mut GraphHandle, i: rhai::INT| {
            g.set_mode(i, SelectionMode::Compared)
        });
        engine.register_fn("clear_mode", |g: &mut GraphHandle, i: rhai::INT| {
            g.set_mode(i, SelectionMode::None)
        });
        engine.register_fn("set_color", GraphHandle::set_color);

        // Steps
        engine.register_fn("step", GraphHandle::step);
        engine.register_fn("step", GraphHandle::step_with_comment);
    }

    /// Compile a script and cache it
    pub fn compile(&self, source: &str) -> Result<CompiledScript> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| AlgoVizError::Runtime(format!("Failed to acquire cache lock: {}", e)))?;

        cache.get_or_compile(&self.engine, source)
    }

    /// Validate a script without evaluating it
    pub fn validate(&self, source: &str) -> Result<()> {
        self.engine
            .compile(source)
            .map(|_| ())
            .map_err(AlgoVizError::from_rhai_syntax)
    }

    /// Compile `source` and build the functions it declares
    ///
    /// `display_len` is the number of display lines, used for descriptors
    /// without a line range. Any failure is reported as a syntax error.
    pub fn load_functions(&self, source: &str, display_len: usize) -> Result<FunctionRegistry> {
        let script = self.compile(source)?;
        let descriptors = self
            .engine
            .eval_ast::<Dynamic>(&script.ast)
            .map_err(|e| AlgoVizError::Syntax(format!("Evaluation error: {}", e)))?;

        let list = descriptors.try_cast::<rhai::Array>().ok_or_else(|| {
            AlgoVizError::Syntax("The executable must evaluate to an array of functions".into())
        })?;

        let mut registry = FunctionRegistry::new();
        for (position, item) in list.into_iter().enumerate() {
            let map = item.try_cast::<Map>().ok_or_else(|| {
                AlgoVizError::Syntax(format!("Function descriptor {} is not a map", position))
            })?;
            let descriptor = Descriptor::parse(&map, display_len)
                .map_err(|e| AlgoVizError::Syntax(format!("Function {}: {}", position, e)))?;
            descriptor.check_body(&script.ast)?;

            let body = ScriptedFunction {
                engine: self.engine.clone(),
                ast: script.ast.clone(),
                fn_name: descriptor.body,
                max_trace_events: self.max_trace_events,
            };
            registry.register(DynamicFunction::new(
                descriptor.name,
                descriptor.params,
                descriptor.lines,
                Arc::new(body),
            ));
        }

        debug!(functions = ?registry.names(), "Loaded script functions");
        Ok(registry)
    }

    /// Clear the script cache
    pub fn clear_cache(&self) -> Result<()> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| AlgoVizError::Runtime(format!("Failed to acquire cache lock: {}", e)))?;
        cache.clear();
        Ok(())
    }

    /// Get a reference to the underlying Rhai engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Get a reference to the shared cache
    pub fn cache(&self) -> &SharedScriptCache {
        &self.cache
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("cache_size", &self.cache.read().map(|c| c.len()).ok())
            .field("max_trace_events", &self.max_trace_events)
            .finish()
    }
}

/// A parsed function descriptor
#[derive(Debug)]
struct Descriptor {
    name: String,
    body: String,
    params: Vec<ParamSpec>,
    lines: LineRange,
}

impl Descriptor {
    fn parse(map: &Map, display_len: usize) -> std::result::Result<Self, String> {
        let name = map
            .get("name")
            .and_then(|v| v.clone().into_string().ok())
            .ok_or("missing string field 'name'")?;

        let body = match map.get("body") {
            Some(v) if v.is::<FnPtr>() => v.clone().cast::<FnPtr>().fn_name().to_string(),
            Some(v) => v
                .clone()
                .into_string()
                .map_err(|t| format!("'body' must be a function name, found {}", t))?,
            None => return Err("missing field 'body'".into()),
        };

        let params = match map.get("params") {
            None => Vec::new(),
            Some(v) => v
                .clone()
                .try_cast::<rhai::Array>()
                .ok_or("'params' must be an array")?
                .into_iter()
                .map(Self::parse_param)
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        let lines = match map.get("lines") {
            None => LineRange::covering(display_len),
            Some(v) => {
                let lines = v.clone().try_cast::<Map>().ok_or("'lines' must be a map")?;
                let bound = |key: &str| {
                    lines
                        .get(key)
                        .and_then(|v| v.as_int().ok())
                        .and_then(|v| usize::try_from(v).ok())
                        .ok_or_else(|| format!("'lines.{}' must be a non-negative integer", key))
                };
                let range = LineRange::new(bound("start")?, bound("end")?);
                if range.start > range.end {
                    return Err(format!(
                        "line range {}..{} is reversed",
                        range.start, range.end
                    ));
                }
                range
            }
        };

        Ok(Self {
            name,
            body,
            params,
            lines,
        })
    }

    fn parse_param(value: Dynamic) -> std::result::Result<ParamSpec, String> {
        let map = value
            .try_cast::<Map>()
            .ok_or("parameter descriptors must be maps")?;
        let name = map
            .get("name")
            .and_then(|v| v.clone().into_string().ok())
            .ok_or("parameter is missing 'name'")?;
        let kind = map
            .get("type")
            .and_then(|v| v.clone().into_string().ok())
            .ok_or_else(|| format!("parameter '{}' is missing 'type'", name))?;
        let kind = InputKind::from_name(&kind)
            .ok_or_else(|| format!("parameter '{}' has unknown type '{}'", name, kind))?;
        Ok(ParamSpec::new(name, kind))
    }

    /// The body must be a script function taking the graph plus every param
    fn check_body(&self, ast: &AST) -> Result<()> {
        let arity = self.params.len() + 1;
        let found = ast
            .iter_functions()
            .any(|f| f.name == self.body && f.params.len() == arity);
        if found {
            Ok(())
        } else {
            Err(AlgoVizError::Syntax(format!(
                "Function '{}' refers to '{}' taking {} argument(s), which is not defined",
                self.name, self.body, arity
            )))
        }
    }
}

/// Body of a function declared by a script
struct ScriptedFunction {
    engine: Arc<Engine>,
    ast: Arc<AST>,
    fn_name: String,
    max_trace_events: usize,
}

impl FunctionBody for ScriptedFunction {
    fn invoke(&self, graph: &Graph, args: Vec<ParamValue>) -> Result<Box<dyn StepSource>> {
        let handle = GraphHandle::new(Rehearsal::new(graph.detached(), self.max_trace_events));

        let mut call_args: Vec<Dynamic> = Vec::with_capacity(args.len() + 1);
        call_args.push(Dynamic::from(handle.clone()));
        call_args.extend(args.into_iter().map(param_to_dynamic));

        let options = CallFnOptions::new().eval_ast(false);
        let result = self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut Scope::new(),
            &self.ast,
            &self.fn_name,
            call_args,
        );
        if let Err(e) = result.with_context(|| format!("In function '{}'", self.fn_name)) {
            warn!(function = %self.fn_name, error = %e, "Script failed during rehearsal");
            handle.fault(e.to_string());
        }

        Ok(Box::new(ScriptedRun::new(
            self.fn_name.clone(),
            handle.take_trace(),
        )))
    }
}

fn param_to_dynamic(value: ParamValue) -> Dynamic {
    match value {
        ParamValue::Number(n) => number_to_dynamic(n),
        ParamValue::NumberList(ns) => ns
            .into_iter()
            .map(number_to_dynamic)
            .collect::<rhai::Array>()
            .into(),
        ParamValue::String(s) => s.into(),
        ParamValue::StringList(ss) => ss
            .into_iter()
            .map(Dynamic::from)
            .collect::<rhai::Array>()
            .into(),
    }
}

fn number_to_dynamic(n: f64) -> Dynamic {
    super::rehearsal::to_dynamic(&NodeValue::Number(n))
}
