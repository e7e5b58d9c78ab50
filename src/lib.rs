//! # AlgoViz-RS: step-by-step algorithm animation
//!
//! Users describe an algorithm as a Rhai script plus the code lines to show
//! next to it. The engine seeds a graph of nodes, lets the user invoke the
//! script's functions and plays the resulting steps one at a time,
//! highlighting a code line and keeping node geometry up to date.
//!
//! ## Architecture
//!
//! - **Graph**: ordered nodes with stable ids, mutated in place
//! - **Layout**: bar heights, centering and zoom/pan for the graph
//! - **Animation**: the externally clocked step executor
//! - **Dispatch**: interactive functions, parameter validation and casting
//! - **Scripting**: Rhai executables and their recorded runs
//!
//! ## Example
//!
//! ```ignore
//! use algoviz_rs::{animation::StepLog, Animator};
//!
//! let mut animator = Animator::default();
//! animator.load_template("bubbleSort")?;
//! animator.run("Bubble sort", &[])?;
//!
//! let mut log = StepLog::new();
//! while animator.state().is_running() {
//!     animator.advance_by(16, &mut log)?;
//! }
//! ```

pub mod animation;
pub mod animator;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod layout;
pub mod scripting;
pub mod types;

// Re-export commonly used types
pub use animation::{AnimationObserver, AnimationState, Step, StepExecutor, StepSource};
pub use animator::Animator;
pub use config::{AnimationConfig, DisplayLine, PlaybackSettings};
pub use dispatch::{DynamicFunction, FunctionRegistry, FunctionSelection, InputKind};
pub use error::{AlgoVizError, ErrorSurface, Result};
pub use graph::Graph;
pub use scripting::ScriptEngine;
pub use types::{Node, NodeKind, NodeValue, SelectionMode, StructureKind};
