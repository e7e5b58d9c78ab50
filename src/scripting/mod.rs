//! Rhai Scripting for Animation Functions
//!
//! An animation's executable is a Rhai script. Its top level evaluates to an
//! array of function descriptors, and each descriptor names a script
//! function that receives the graph as its first argument:
//!
//! ```rhai
//! fn push_value(graph, value) {
//!     graph.step(0);
//!     graph.push(value);
//!     graph.step(1, "pushed " + value);
//! }
//!
//! [
//!     #{
//!         name: "Push",
//!         body: "push_value",
//!         params: [#{ name: "value", type: "number" }],
//!         lines: #{ start: 0, end: 1 },
//!     },
//! ]
//! ```
//!
//! `body` may also be a function pointer (`Fn("push_value")`), and `lines`
//! defaults to every display line. Parameter types are `number`,
//! `numberList`, `string` and `stringList`.
//!
//! Calling a function does not touch the live graph. The body runs against a
//! copy, its mutations and steps are recorded, and the resulting
//! [`ScriptedRun`] replays them one step at a time during playback.

mod engine;
mod rehearsal;

pub use engine::{ScriptEngine, GRAPH_TYPE_NAME};
pub use rehearsal::{GraphHandle, Rehearsal, ScriptedRun, TraceEvent, MAX_TRACE_EVENTS};

use crate::error::{AlgoVizError, Result};
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled executable
#[derive(Clone)]
pub struct CompiledScript {
    /// The compiled AST
    ast: Arc<AST>,
    /// Source text the script was compiled from
    source: String,
}

impl CompiledScript {
    /// Get the source code of this script
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of the script functions defined by this script
    pub fn function_names(&self) -> Vec<String> {
        self.ast
            .iter_functions()
            .map(|f| f.name.to_string())
            .collect()
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("source", &self.source)
            .finish()
    }
}

/// Cache for compiled scripts to avoid recompilation
#[derive(Default)]
pub struct ScriptCache {
    /// Map from script source to compiled script
    cache: HashMap<String, CompiledScript>,
}

impl ScriptCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get a cached script or compile and cache it
    pub fn get_or_compile(&mut self, engine: &Engine, source: &str) -> Result<CompiledScript> {
        if let Some(script) = self.cache.get(source) {
            return Ok(script.clone());
        }

        let ast = engine
            .compile(source)
            .map_err(|e| AlgoVizError::Syntax(format!("Compilation error: {}", e)))?;

        let script = CompiledScript {
            ast: Arc::new(ast),
            source: source.to_string(),
        };

        self.cache.insert(source.to_string(), script.clone());
        Ok(script)
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Remove a specific script from the cache
    pub fn invalidate(&mut self, source: &str) {
        self.cache.remove(source);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Thread-safe script cache wrapper
pub type SharedScriptCache = Arc<RwLock<ScriptCache>>;

/// Create a new shared script cache
pub fn create_shared_cache() -> SharedScriptCache {
    Arc::new(RwLock::new(ScriptCache::new()))
}

/// Built-in animation templates
pub mod builtins {
    use crate::types::StructureKind;

    /// A ready-made animation
    #[derive(Debug, Clone, Copy)]
    pub struct Template {
        /// Key used to pick the template, e.g. on the command line
        pub key: &'static str,
        pub title: &'static str,
        pub structure: StructureKind,
        pub initial_values: &'static [f64],
        /// (code, comment) pairs
        pub display_lines: &'static [(&'static str, &'static str)],
        pub executable: &'static str,
    }

    /// Bubble sort over a bar plot
    pub const BUBBLE_SORT: Template = Template {
        key: "bubbleSort",
        title: "Bubble sort",
        structure: StructureKind::BarPlot,
        initial_values: &[9.0, 1.0, 5.0, 7.0, 2.0, 4.0, 3.0],
        display_lines: &[
            ("function bubbleSort(bars) {", "Sort the bars in ascending order"),
            (
                "  for (let i = 0; i < n - 1; i++) {",
                "Each pass moves the largest unsorted bar to the end",
            ),
            (
                "    for (let j = 0; j < n - i - 1; j++) {",
                "Walk over the unsorted part",
            ),
            ("      if (bars[j] > bars[j + 1]) {", "Compare two neighbouring bars"),
            ("        swap(bars, j, j + 1);", "They are out of order, swap them"),
            ("      }", ""),
            ("    }", "The last unsorted bar is now in place"),
            ("  }", ""),
            ("}", "All bars are sorted"),
        ],
        executable: r#"
fn bubble_sort(graph) {
    let n = graph.len();
    graph.step(0);
    for i in 0..(n - 1) {
        graph.step(1);
        for j in 0..(n - i - 1) {
            graph.step(2);
            graph.compare(j);
            graph.compare(j + 1);
            graph.step(3);
            if graph.get(j) > graph.get(j + 1) {
                graph.swap(j, j + 1);
                graph.step(4);
            }
            graph.clear_mode(j);
            graph.clear_mode(j + 1);
        }
        graph.select(n - i - 1);
        graph.step(6);
    }
    if n > 0 {
        graph.select(0);
    }
    graph.step(8);
}

[
    #{ name: "Bubble sort", body: "bubble_sort", params: [], lines: #{ start: 0, end: 8 } },
]
"#,
    };

    /// Enqueue and dequeue on a list
    pub const QUEUE: Template = Template {
        key: "queue",
        title: "Queue",
        structure: StructureKind::List,
        initial_values: &[1.0, 6.0, 2.0, 4.0],
        display_lines: &[
            ("class Queue {", "A first-in first-out queue"),
            ("  enqueue(value) {", "Add a value at the back"),
            ("    this.items.push(value);", "The new value joins the end"),
            ("  }", "Enqueued"),
            ("  dequeue() {", "Take the value at the front"),
            (
                "    if (this.items.length === 0) return;",
                "Nothing to take from an empty queue",
            ),
            ("    return this.items.shift();", "The front value leaves"),
            ("  }", "Dequeued"),
            ("}", ""),
        ],
        executable: r#"
fn enqueue(graph, value) {
    graph.step(1);
    graph.push(value);
    let last = graph.len() - 1;
    graph.select(last);
    graph.step(2);
    graph.clear_mode(last);
    graph.step(3);
}

fn dequeue(graph) {
    graph.step(4);
    if graph.len() == 0 {
        graph.step(5, "The queue is empty");
        return;
    }
    graph.compare(0);
    graph.step(6);
    let front = graph.shift();
    graph.step(7, "Removed " + front);
}

[
    #{
        name: "Enqueue",
        body: "enqueue",
        params: [#{ name: "value", type: "number" }],
        lines: #{ start: 1, end: 3 },
    },
    #{ name: "Dequeue", body: Fn("dequeue"), params: [], lines: #{ start: 4, end: 7 } },
]
"#,
    };

    /// Get all built-in templates
    pub fn all() -> &'static [Template] {
        &[BUBBLE_SORT, QUEUE]
    }

    /// Look a template up by key (case-insensitive) or title
    pub fn find(name: &str) -> Option<&'static Template> {
        all()
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case(name) || t.title.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_load() {
        let engine = ScriptEngine::new();
        for template in builtins::all() {
            let registry = engine
                .load_functions(template.executable, template.display_lines.len())
                .unwrap_or_else(|e| panic!("{} failed: {}", template.key, e));
            assert!(!registry.is_empty(), "{} declares no functions", template.key);
            for function in registry.iter() {
                assert!(function.line_range.end < template.display_lines.len());
            }
        }
    }

    #[test]
    fn test_find_template() {
        assert_eq!(builtins::find("queue").map(|t| t.title), Some("Queue"));
        assert_eq!(builtins::find("Bubble sort").map(|t| t.key), Some("bubbleSort"));
        assert!(builtins::find("heap").is_none());
    }

    #[test]
    fn test_cache_compile_errors_are_syntax() {
        let engine = Engine::new();
        let mut cache = ScriptCache::new();
        let err = cache.get_or_compile(&engine, "fn (").unwrap_err();
        assert!(matches!(err, AlgoVizError::Syntax(_)));
        assert!(cache.is_empty());

        let script = cache.get_or_compile(&engine, "fn f(graph) {} []").unwrap();
        assert_eq!(script.function_names(), vec!["f".to_string()]);
        cache.invalidate("fn f(graph) {} []");
        assert!(cache.is_empty());
    }
}
