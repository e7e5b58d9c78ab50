//! The animator ties one configuration, its graph, its functions and the
//! step executor together.
//!
//! Loading a config compiles its executable and builds a fresh graph; only
//! when both succeed does the new config replace the active one. Invoking a
//! function cancels whatever run was in progress and prepares a new one,
//! which plays once [`Animator::start`] is called and the host advances the
//! clock.

use tracing::{debug, info};

use crate::animation::{
    ActiveFunction, AnimationObserver, AnimationState, SharedTempo, StepExecutor,
};
use crate::config::{AnimationConfig, PlaybackSettings};
use crate::dispatch::{FunctionRegistry, FunctionSelection};
use crate::error::{AlgoVizError, Result};
use crate::graph::Graph;
use crate::layout::{FixedViewport, GeometrySnapshot, TransitionTiming, ViewportSource};
use crate::scripting::{builtins, ScriptEngine};

/// Builds the viewport source for each new graph
pub type ViewportFactory = Box<dyn Fn() -> Box<dyn ViewportSource> + Send>;

/// Drives animations for one configuration at a time
pub struct Animator {
    scripts: ScriptEngine,
    settings: PlaybackSettings,
    viewport: ViewportFactory,
    tempo: SharedTempo,
    executor: StepExecutor,
    config: Option<AnimationConfig>,
    graph: Option<Graph>,
    registry: FunctionRegistry,
    selection: Option<FunctionSelection>,
}

impl Animator {
    /// Create an animator with a fixed viewport taken from the settings
    pub fn new(settings: PlaybackSettings) -> Self {
        let (width, height) = (settings.viewport.width, settings.viewport.height);
        Self::with_viewport(
            settings,
            Box::new(move || Box::new(FixedViewport::new(width, height))),
        )
    }

    /// Create an animator whose graphs read their size from `viewport`
    pub fn with_viewport(settings: PlaybackSettings, viewport: ViewportFactory) -> Self {
        let tempo = SharedTempo::new(settings.step_delay_ms);
        Self {
            scripts: ScriptEngine::new().with_max_trace_events(settings.max_trace_events),
            executor: StepExecutor::new(Box::new(tempo.clone())),
            tempo,
            settings,
            viewport,
            config: None,
            graph: None,
            registry: FunctionRegistry::new(),
            selection: None,
        }
    }

    // ==================== Configuration ====================

    /// Activate a configuration
    ///
    /// On failure the previously active config, graph and functions are
    /// left untouched.
    pub fn load_config(&mut self, config: AnimationConfig) -> Result<()> {
        let registry = self
            .scripts
            .load_functions(&config.executable, config.display_lines.len())?;
        let graph = Graph::new(
            config.structure,
            config.effective_node_kind(),
            config.initial_values.iter().cloned(),
        )?
        .with_viewport((self.viewport)())?;

        self.executor.clear();
        self.executor.set_display_lines(config.display_lines.clone());
        info!(
            title = ?config.title,
            structure = %config.structure,
            nodes = graph.len(),
            functions = registry.len(),
            "Activated animation config"
        );
        self.graph = Some(graph);
        self.registry = registry;
        self.selection = None;
        self.config = Some(config);
        Ok(())
    }

    /// Activate a built-in template by key or title
    pub fn load_template(&mut self, name: &str) -> Result<()> {
        let template = builtins::find(name)
            .ok_or_else(|| AlgoVizError::Config(format!("Unknown template '{}'", name)))?;
        self.load_config(AnimationConfig::from_template(template))
    }

    /// Rebuild the graph from the active config's initial values
    pub fn reset_graph(&mut self) -> Result<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AlgoVizError::Config("No config loaded".into()))?;
        let graph = Graph::new(
            config.structure,
            config.effective_node_kind(),
            config.initial_values.iter().cloned(),
        )?
        .with_viewport((self.viewport)())?;
        self.executor.clear();
        self.graph = Some(graph);
        Ok(())
    }

    pub fn config(&self) -> Option<&AnimationConfig> {
        self.config.as_ref()
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn state(&self) -> AnimationState {
        self.executor.state()
    }

    // ==================== Function dispatch ====================

    /// Pick the function to invoke next
    pub fn select_function(&mut self, name: &str) -> Result<()> {
        self.selection = Some(self.registry.select(name)?);
        Ok(())
    }

    pub fn selection(&self) -> Option<&FunctionSelection> {
        self.selection.as_ref()
    }

    /// Set the raw input of parameter `index` of the selected function
    pub fn set_input(&mut self, index: usize, raw: impl Into<String>) -> Result<()> {
        self.selection_mut()?.set_input(index, raw)
    }

    /// Set the raw input of the named parameter of the selected function
    pub fn set_input_by_name(&mut self, name: &str, raw: impl Into<String>) -> Result<()> {
        self.selection_mut()?.set_input_by_name(name, raw)
    }

    /// Whether the selected function can be invoked with the current inputs
    pub fn can_invoke(&self) -> bool {
        self.selection.as_ref().is_some_and(|s| s.can_invoke()) && self.graph.is_some()
    }

    /// Invoke the selected function
    ///
    /// Inputs are validated before anything else happens, so a rejected
    /// invocation leaves the current run alone. Otherwise the run in
    /// progress is replaced and the new one waits in the `Ready` state for
    /// [`Animator::start`].
    pub fn invoke(&mut self) -> Result<()> {
        let selection = self
            .selection
            .as_ref()
            .ok_or_else(|| AlgoVizError::Runtime("No function selected".into()))?;
        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| AlgoVizError::Config("No config loaded".into()))?;

        let producer = selection.invoke(graph)?;
        let function = selection.function();
        debug!(function = %function.name, inputs = ?selection.inputs(), "Function invoked");
        self.executor.load(
            producer,
            ActiveFunction {
                name: function.name.clone(),
                line_range: function.line_range,
            },
        );
        Ok(())
    }

    /// Select, fill in and invoke a function, then start playback
    pub fn run(&mut self, name: &str, inputs: &[&str]) -> Result<()> {
        self.select_function(name)?;
        for (index, raw) in inputs.iter().enumerate() {
            self.set_input(index, *raw)?;
        }
        self.invoke()?;
        self.start();
        Ok(())
    }

    fn selection_mut(&mut self) -> Result<&mut FunctionSelection> {
        self.selection
            .as_mut()
            .ok_or_else(|| AlgoVizError::Runtime("No function selected".into()))
    }

    // ==================== Playback ====================

    pub fn start(&mut self) -> bool {
        self.executor.start()
    }

    pub fn pause(&mut self) {
        self.executor.pause();
    }

    pub fn resume(&mut self) {
        self.executor.resume();
    }

    pub fn toggle_pause(&mut self) {
        self.executor.toggle_pause();
    }

    /// Stop and forget the current run; the graph keeps its state
    pub fn clear(&mut self) {
        self.executor.clear();
    }

    /// Change the delay between steps, effective from the next step
    pub fn set_step_delay(&mut self, delay_ms: u64) {
        self.tempo.set(delay_ms);
        self.settings.step_delay_ms = delay_ms;
    }

    /// Transition timing matching the current step delay
    pub fn transition_timing(&self) -> TransitionTiming {
        TransitionTiming::from_speed(self.settings.step_delay_ms as f64)
    }

    /// Advance the playback clock by `elapsed_ms`
    pub fn advance_by(
        &mut self,
        elapsed_ms: u64,
        observer: &mut dyn AnimationObserver,
    ) -> Result<usize> {
        match self.graph.as_mut() {
            Some(graph) => self.executor.advance_by(elapsed_ms, graph, observer),
            None => Ok(0),
        }
    }

    /// Fire ticks back to back until the run is finished or paused
    ///
    /// Returns the number of steps played.
    pub fn run_to_end(&mut self, observer: &mut dyn AnimationObserver) -> Result<usize> {
        let mut played = 0;
        while self.executor.state().is_running() {
            let Some(due) = self.executor.next_tick_at() else {
                break;
            };
            let wait = due.saturating_sub(self.executor.clock_ms());
            played += self.advance_by(wait, observer)?;
        }
        Ok(played)
    }

    // ==================== View ====================

    /// Current geometry of the graph
    pub fn snapshot(&self) -> Option<GeometrySnapshot> {
        self.graph.as_ref().and_then(|g| g.snapshot())
    }

    /// Apply a wheel tick; false when rejected or nothing is loaded
    pub fn zoom(&mut self, delta_y: f64) -> bool {
        self.graph
            .as_mut()
            .and_then(|g| g.layout_mut())
            .is_some_and(|l| l.view_mut().zoom(delta_y))
    }

    pub fn begin_pan(&mut self, x: f64, y: f64) {
        if let Some(layout) = self.graph.as_mut().and_then(|g| g.layout_mut()) {
            layout.view_mut().begin_pan(x, y);
        }
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some(layout) = self.graph.as_mut().and_then(|g| g.layout_mut()) {
            layout.view_mut().drag_to(x, y);
        }
    }

    pub fn end_pan(&mut self) {
        if let Some(layout) = self.graph.as_mut().and_then(|g| g.layout_mut()) {
            layout.view_mut().end_pan();
        }
    }

    /// Re-run layout, e.g. after the viewport was resized
    pub fn relayout(&mut self) {
        if let Some(graph) = self.graph.as_mut() {
            graph.relayout();
        }
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(PlaybackSettings::default())
    }
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("title", &self.config.as_ref().and_then(|c| c.title.as_ref()))
            .field("functions", &self.registry.names())
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
