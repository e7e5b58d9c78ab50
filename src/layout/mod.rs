//! Layout engine turning a node sequence into pixel geometry
//!
//! The engine owns no nodes. It is handed the graph's node slice whenever
//! the structure or the values change and writes `left` and `height` back.
//!
//! # Geometry
//!
//! - Every node occupies a slot of `NODE_WIDTH + padding` pixels, where the
//!   padding depends on the structure kind ([`BAR_PADDING`] for bar plots,
//!   [`SQUARE_PADDING`] for lists). The last slot has no trailing gap.
//! - The graph is centered horizontally and vertically inside the viewport,
//!   whose size is read on demand from a [`ViewportSource`].
//! - Bar heights are normalized into `MIN_BAR_HEIGHT..=MIN_BAR_HEIGHT +
//!   MAX_BAR_HEIGHT` with zero (or the smallest negative value) at the bottom.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = LayoutEngine::new(StructureKind::BarPlot, Box::new(FixedViewport::new(200.0, 300.0)))?;
//! engine.build(&mut nodes);
//! let snapshot = engine.snapshot(&nodes);
//! ```

pub mod viewport;

pub use viewport::{TransitionTiming, ViewTransform, MIN_SCALE, ZOOM_STEP};

use crate::error::{AlgoVizError, Result};
use crate::types::{Node, NodeValue, SelectionMode, StructureKind};
use serde::{Deserialize, Serialize};

/// Width of every node in pixels
pub const NODE_WIDTH: f64 = 30.0;

/// Height of the shortest bar in pixels
pub const MIN_BAR_HEIGHT: f64 = 5.0;

/// Height added on top of [`MIN_BAR_HEIGHT`] for the tallest bar
pub const MAX_BAR_HEIGHT: f64 = 200.0;

/// Gap between bars
pub const BAR_PADDING: f64 = 5.0;

/// Gap between list squares
pub const SQUARE_PADDING: f64 = 30.0;

/// Height of a list square
pub const SQUARE_HEIGHT: f64 = NODE_WIDTH;

/// Provides the size of the container the graph is drawn in
#[cfg_attr(test, mockall::automock)]
pub trait ViewportSource: Send {
    /// Current `(width, height)` in pixels
    fn size(&self) -> (f64, f64);
}

/// A viewport with a fixed size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl FixedViewport {
    /// Create a viewport of the given size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl ViewportSource for FixedViewport {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

/// What changed in the graph since the last layout pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Nodes were added or removed
    StructureChanged,
    /// A value changed in place, the node count is unchanged
    ValueChanged,
}

/// Kind of positional edit, see [`LayoutEngine::make_room`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert,
    Remove,
}

/// Per-node geometry handed to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub id: u64,
    pub value: NodeValue,
    pub left: f64,
    pub height: Option<f64>,
    pub color: String,
    pub selection_mode: SelectionMode,
}

/// Where a node stood after the make-room pass of a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeShift {
    pub id: u64,
    pub left: f64,
}

/// Full geometry of one graph at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub nodes: Vec<NodeGeometry>,
    /// Intermediate positions of the latest insert or remove, before the
    /// recentring pass. A renderer animates from these to `nodes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub make_room: Vec<NodeShift>,
    pub left_margin: f64,
    pub bottom_margin: f64,
    pub graph_width: f64,
    pub graph_height: f64,
    pub scale: f64,
    pub offset: (f64, f64),
}

/// Computes node geometry for one structure kind
pub struct LayoutEngine {
    structure: StructureKind,
    viewport: Box<dyn ViewportSource>,
    view: ViewTransform,
    type_padding: f64,
    graph_width: f64,
    graph_height: f64,
    left_margin: f64,
    bottom_margin: f64,
}

impl LayoutEngine {
    /// Create an engine for the given structure kind
    ///
    /// Trees have no layout rules and are rejected.
    pub fn new(structure: StructureKind, viewport: Box<dyn ViewportSource>) -> Result<Self> {
        let type_padding = match structure {
            StructureKind::BarPlot => BAR_PADDING,
            StructureKind::List => SQUARE_PADDING,
            StructureKind::Tree => return Err(AlgoVizError::UnsupportedStructure(structure)),
        };
        Ok(Self {
            structure,
            viewport,
            view: ViewTransform::new(),
            type_padding,
            graph_width: 0.0,
            graph_height: 0.0,
            left_margin: 0.0,
            bottom_margin: 0.0,
        })
    }

    /// Structure kind this engine lays out
    pub fn structure(&self) -> StructureKind {
        self.structure
    }

    /// Gap between two adjacent nodes
    pub fn type_padding(&self) -> f64 {
        self.type_padding
    }

    /// Width of one node plus its gap
    pub fn slot_width(&self) -> f64 {
        NODE_WIDTH + self.type_padding
    }

    pub fn graph_width(&self) -> f64 {
        self.graph_width
    }

    pub fn graph_height(&self) -> f64 {
        self.graph_height
    }

    pub fn left_margin(&self) -> f64 {
        self.left_margin
    }

    pub fn bottom_margin(&self) -> f64 {
        self.bottom_margin
    }

    /// Zoom/pan state
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Mutable zoom/pan state, for pointer and wheel handlers
    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    /// Replace the viewport source
    pub fn set_viewport(&mut self, viewport: Box<dyn ViewportSource>) {
        self.viewport = viewport;
    }

    /// Full layout pass: heights (bar plots) then centering
    pub fn build(&mut self, nodes: &mut [Node]) {
        match self.structure {
            StructureKind::BarPlot => self.adjust_bars_height_to_screen(nodes),
            _ => self.graph_height = SQUARE_HEIGHT,
        }
        self.center_nodes(nodes);
    }

    /// React to a graph change
    pub fn refresh(&mut self, nodes: &mut [Node], change: Refresh) {
        if self.structure.has_bar_heights() {
            self.adjust_bars_height_to_screen(nodes);
        }
        if change == Refresh::StructureChanged {
            self.center_nodes(nodes);
        }
    }

    /// Normalize bar heights and record the tallest one as graph height
    pub fn adjust_bars_height_to_screen(&mut self, nodes: &mut [Node]) {
        normalize_bar_heights(nodes);
        self.graph_height = nodes
            .iter()
            .filter_map(|n| n.height)
            .fold(0.0, f64::max);
    }

    /// Center the nodes horizontally and compute the bottom margin
    pub fn center_nodes(&mut self, nodes: &mut [Node]) {
        let (width, height) = self.viewport.size();
        let slot = self.slot_width();
        self.graph_width = if nodes.is_empty() {
            0.0
        } else {
            slot * nodes.len() as f64 - self.type_padding
        };
        self.left_margin = (width - self.graph_width) / 2.0;
        for (index, node) in nodes.iter_mut().enumerate() {
            node.left = index as f64 * slot + self.left_margin;
        }
        self.bottom_margin = (height - self.graph_height) / 2.0;
    }

    /// Move a node half a slot to the right
    pub fn shift_node_to_right(&self, node: &mut Node) {
        self.shift_node(node, 1.0);
    }

    /// Move a node half a slot to the left
    pub fn shift_node_to_left(&self, node: &mut Node) {
        self.shift_node(node, -1.0);
    }

    fn shift_node(&self, node: &mut Node, direction: f64) {
        node.left += self.slot_width() * 0.5 * direction;
    }

    /// Shift the neighbours of an edit half a slot away from it
    ///
    /// Runs before an insert or remove so the other nodes visibly move
    /// before the recentring pass snaps them into place. For an insert the
    /// gap opens in front of `index` (which may equal `nodes.len()`); for a
    /// remove the node at `index` itself stays put.
    pub fn make_room(&self, nodes: &mut [Node], index: usize, edit: Edit) {
        for (i, node) in nodes.iter_mut().enumerate() {
            if i < index {
                self.shift_node_to_left(node);
            } else if i > index || edit == Edit::Insert {
                self.shift_node_to_right(node);
            }
        }
    }

    /// Geometry of the given nodes as currently laid out
    pub fn snapshot(&self, nodes: &[Node]) -> GeometrySnapshot {
        GeometrySnapshot {
            nodes: nodes
                .iter()
                .map(|n| NodeGeometry {
                    id: n.id,
                    value: n.value.clone(),
                    left: n.left,
                    height: n.height,
                    color: n.color.clone(),
                    selection_mode: n.selection_mode,
                })
                .collect(),
            make_room: Vec::new(),
            left_margin: self.left_margin,
            bottom_margin: self.bottom_margin,
            graph_width: self.graph_width,
            graph_height: self.graph_height,
            scale: self.view.scale(),
            offset: self.view.offset(),
        }
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("structure", &self.structure)
            .field("graph_width", &self.graph_width)
            .field("graph_height", &self.graph_height)
            .field("left_margin", &self.left_margin)
            .field("bottom_margin", &self.bottom_margin)
            .finish()
    }
}

/// Map raw values to bar heights
///
/// With `lo = min(0, min(values))` and `span = |max(values)| - lo`, a value
/// `v` gets `(v - lo) / span * MAX_BAR_HEIGHT + MIN_BAR_HEIGHT`. When the
/// span is zero every bar gets [`MIN_BAR_HEIGHT`]. Non-numeric values count
/// as zero.
pub fn normalize_bar_heights(nodes: &mut [Node]) {
    if nodes.is_empty() {
        return;
    }
    let values: Vec<f64> = nodes
        .iter()
        .map(|n| n.value.as_number().unwrap_or(0.0))
        .collect();
    let min_value = values.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let max_value = values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        .abs();
    let span = max_value - min_value;

    for (node, value) in nodes.iter_mut().zip(values) {
        node.height = Some(if span > 0.0 {
            (value - min_value) * MAX_BAR_HEIGHT / span + MIN_BAR_HEIGHT
        } else {
            MIN_BAR_HEIGHT
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes_from(values: &[f64]) -> Vec<Node> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Node::new(i as u64, v.into()))
            .collect()
    }

    fn heights(nodes: &[Node]) -> Vec<f64> {
        nodes.iter().map(|n| n.height.unwrap()).collect()
    }

    fn engine(structure: StructureKind, width: f64, height: f64) -> LayoutEngine {
        LayoutEngine::new(structure, Box::new(FixedViewport::new(width, height))).unwrap()
    }

    #[test]
    fn test_normalize_positive_values() {
        let mut nodes = nodes_from(&[0.0, 1.0, 2.0]);
        normalize_bar_heights(&mut nodes);
        assert_eq!(heights(&nodes), vec![5.0, 105.0, 205.0]);
    }

    #[test]
    fn test_normalize_negative_values() {
        let mut nodes = nodes_from(&[-3.0, 1.0, 2.0]);
        normalize_bar_heights(&mut nodes);
        assert_eq!(heights(&nodes), vec![5.0, 165.0, 205.0]);
    }

    #[test]
    fn test_normalize_zero_span() {
        let mut nodes = nodes_from(&[0.0, 0.0]);
        normalize_bar_heights(&mut nodes);
        assert_eq!(heights(&nodes), vec![MIN_BAR_HEIGHT, MIN_BAR_HEIGHT]);
    }

    #[test]
    fn test_graph_height_is_tallest_bar() {
        let mut nodes = nodes_from(&[-3.0, 1.0, 2.0]);
        let mut engine = engine(StructureKind::BarPlot, 200.0, 400.0);
        engine.adjust_bars_height_to_screen(&mut nodes);
        assert_eq!(engine.graph_height(), 205.0);
    }

    #[test]
    fn test_center_nodes_bar_plot() {
        let mut nodes = nodes_from(&[1.0, 2.0, 3.0]);
        let mut engine = engine(StructureKind::BarPlot, 200.0, 300.0);
        engine.center_nodes(&mut nodes);
        assert_eq!(engine.slot_width(), 35.0);
        assert_eq!(engine.graph_width(), 100.0);
        assert_eq!(engine.left_margin(), 50.0);
        let lefts: Vec<f64> = nodes.iter().map(|n| n.left).collect();
        assert_eq!(lefts, vec![50.0, 85.0, 120.0]);
    }

    #[test]
    fn test_list_build_uses_square_height() {
        let mut nodes = nodes_from(&[1.0, 2.0]);
        let mut engine = engine(StructureKind::List, 300.0, 100.0);
        engine.build(&mut nodes);
        assert_eq!(engine.graph_height(), SQUARE_HEIGHT);
        assert_eq!(engine.bottom_margin(), 35.0);
        assert!(nodes.iter().all(|n| n.height.is_none()));
        // slot 60, width 90, margin 105
        assert_eq!(nodes[1].left, 165.0);
    }

    #[test]
    fn test_tree_is_rejected() {
        let err = LayoutEngine::new(StructureKind::Tree, Box::new(FixedViewport::new(1.0, 1.0)))
            .unwrap_err();
        assert!(matches!(
            err,
            AlgoVizError::UnsupportedStructure(StructureKind::Tree)
        ));
    }

    #[test]
    fn test_make_room_for_remove_keeps_edited_node() {
        let mut nodes = nodes_from(&[1.0, 2.0, 3.0]);
        let mut engine = engine(StructureKind::BarPlot, 200.0, 300.0);
        engine.center_nodes(&mut nodes);
        engine.make_room(&mut nodes, 1, Edit::Remove);
        assert_eq!(nodes[0].left, 50.0 - 17.5);
        assert_eq!(nodes[1].left, 85.0);
        assert_eq!(nodes[2].left, 120.0 + 17.5);
    }

    #[test]
    fn test_make_room_for_insert_opens_gap_before_index() {
        let mut nodes = nodes_from(&[1.0, 2.0, 3.0]);
        let mut engine = engine(StructureKind::BarPlot, 200.0, 300.0);
        engine.center_nodes(&mut nodes);
        engine.make_room(&mut nodes, 1, Edit::Insert);
        assert_eq!(nodes[0].left, 50.0 - 17.5);
        assert_eq!(nodes[1].left, 85.0 + 17.5);
        assert_eq!(nodes[2].left, 120.0 + 17.5);
    }

    #[test]
    fn test_viewport_is_read_on_every_pass() {
        let mut viewport = MockViewportSource::new();
        viewport.expect_size().times(2).return_const((100.0, 100.0));
        let mut engine = LayoutEngine::new(StructureKind::List, Box::new(viewport)).unwrap();
        let mut nodes = nodes_from(&[1.0]);
        engine.build(&mut nodes);
        engine.refresh(&mut nodes, Refresh::StructureChanged);
        engine.refresh(&mut nodes, Refresh::ValueChanged);
    }

    #[test]
    fn test_empty_graph_layout() {
        let mut nodes: Vec<Node> = Vec::new();
        let mut engine = engine(StructureKind::BarPlot, 200.0, 300.0);
        engine.build(&mut nodes);
        assert_eq!(engine.graph_width(), 0.0);
        assert_eq!(engine.graph_height(), 0.0);
        assert_eq!(engine.left_margin(), 100.0);
    }
}
