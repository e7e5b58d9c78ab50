//! Node & graph model
//!
//! A [`Graph`] owns the ordered sequence of [`Node`]s shown by one
//! animation, hands out ids that are never reused, and keeps the attached
//! [`LayoutEngine`] informed of every change so geometry stays current.
//!
//! # Mutations
//!
//! | Operation      | Node count | Layout reaction                         |
//! |----------------|------------|-----------------------------------------|
//! | push/unshift   | +1         | make room, heights, recentre            |
//! | pop/shift      | -1         | make room, heights, recentre            |
//! | insert_at      | +1         | make room, heights, recentre            |
//! | remove_at      | -1         | make room, heights, recentre            |
//! | replace_at     | =          | heights (bar plots)                     |
//! | swap           | =          | `left` values exchanged                 |
//!
//! The make-room positions of the latest insert or remove stay visible in
//! [`Graph::snapshot`] until [`Graph::settle`], so a renderer can animate
//! the shift before the recentred layout.
//!
//! A graph without a layout (see [`Graph::detached`]) applies the same
//! mutations without any geometry, which is what script rehearsals use.

pub mod ops;

pub use ops::GraphOp;

use crate::error::{AlgoVizError, Result};
use crate::layout::{Edit, GeometrySnapshot, LayoutEngine, NodeShift, Refresh, ViewportSource};
use crate::types::{HexColor, Node, NodeKind, NodeValue, SelectionMode, StructureKind};

/// Ordered collection of nodes for one visualization
#[derive(Debug)]
pub struct Graph {
    node_kind: NodeKind,
    structure: StructureKind,
    nodes: Vec<Node>,
    next_id: u64,
    layout: Option<LayoutEngine>,
    make_room: Vec<NodeShift>,
}

impl Graph {
    /// Create a graph seeded with `initial_values`
    ///
    /// Fails for structure kinds the engine cannot animate.
    pub fn new(
        structure: StructureKind,
        node_kind: NodeKind,
        initial_values: impl IntoIterator<Item = NodeValue>,
    ) -> Result<Self> {
        if !structure.is_supported() {
            return Err(AlgoVizError::UnsupportedStructure(structure));
        }
        let mut graph = Self {
            node_kind,
            structure,
            nodes: Vec::new(),
            next_id: 0,
            layout: None,
            make_room: Vec::new(),
        };
        for value in initial_values {
            let node = graph.create_node(value);
            graph.nodes.push(node);
        }
        Ok(graph)
    }

    /// Attach a layout engine reading the given viewport and run a full pass
    pub fn with_viewport(mut self, viewport: Box<dyn ViewportSource>) -> Result<Self> {
        let layout = LayoutEngine::new(self.structure, viewport)?;
        self.attach_layout(layout);
        Ok(self)
    }

    /// Attach a layout engine and run a full pass
    pub fn attach_layout(&mut self, mut layout: LayoutEngine) {
        layout.build(&mut self.nodes);
        self.layout = Some(layout);
    }

    /// Copy of this graph without a layout
    ///
    /// Ids keep counting from the same point, so mutations applied to the
    /// copy hand out the same ids the live graph would.
    pub fn detached(&self) -> Graph {
        Graph {
            node_kind: self.node_kind,
            structure: self.structure,
            nodes: self.nodes.clone(),
            next_id: self.next_id,
            layout: None,
            make_room: Vec::new(),
        }
    }

    fn create_node(&mut self, value: NodeValue) -> Node {
        let node = Node::new(self.next_id, value);
        self.next_id += 1;
        node
    }

    pub fn node_kind(&self) -> NodeKind {
        self.node_kind
    }

    pub fn structure(&self) -> StructureKind {
        self.structure
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// All values in order
    pub fn values(&self) -> Vec<NodeValue> {
        self.nodes.iter().map(|n| n.value.clone()).collect()
    }

    pub fn layout(&self) -> Option<&LayoutEngine> {
        self.layout.as_ref()
    }

    pub fn layout_mut(&mut self) -> Option<&mut LayoutEngine> {
        self.layout.as_mut()
    }

    /// Current geometry, `None` for a detached graph
    ///
    /// Carries the make-room positions of the latest insert or remove until
    /// [`Graph::settle`] is called.
    pub fn snapshot(&self) -> Option<GeometrySnapshot> {
        self.layout.as_ref().map(|l| {
            let mut snapshot = l.snapshot(&self.nodes);
            snapshot.make_room = self.make_room.clone();
            snapshot
        })
    }

    /// Make-room positions recorded by the latest insert or remove
    pub fn make_room_shifts(&self) -> &[NodeShift] {
        &self.make_room
    }

    /// Forget the recorded make-room positions once they were shown
    pub fn settle(&mut self) {
        self.make_room.clear();
    }

    /// Re-run the full layout pass, e.g. after the viewport was resized
    pub fn relayout(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            layout.build(&mut self.nodes);
        }
    }

    fn refresh(&mut self, change: Refresh) {
        if let Some(layout) = self.layout.as_mut() {
            layout.refresh(&mut self.nodes, change);
        }
    }

    fn make_room(&mut self, index: usize, edit: Edit) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        layout.make_room(&mut self.nodes, index, edit);
        self.make_room = self
            .nodes
            .iter()
            .enumerate()
            .filter(|&(i, _)| edit == Edit::Insert || i != index)
            .map(|(_, n)| NodeShift {
                id: n.id,
                left: n.left,
            })
            .collect();
    }

    fn check_index(&self, op: &'static str, index: usize) -> Result<()> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(AlgoVizError::Index {
                op,
                index,
                len: self.nodes.len(),
            })
        }
    }

    fn insert_node(&mut self, index: usize, value: NodeValue) {
        self.make_room(index, Edit::Insert);
        let node = self.create_node(value);
        self.nodes.insert(index, node);
        self.refresh(Refresh::StructureChanged);
    }

    fn remove_node(&mut self, index: usize) -> NodeValue {
        self.make_room(index, Edit::Remove);
        let node = self.nodes.remove(index);
        self.refresh(Refresh::StructureChanged);
        node.value
    }

    /// Append a value
    pub fn push(&mut self, value: impl Into<NodeValue>) {
        let index = self.nodes.len();
        self.insert_node(index, value.into());
    }

    /// Remove and return the last value
    pub fn pop(&mut self) -> Result<NodeValue> {
        let index = self.nodes.len().checked_sub(1).ok_or(AlgoVizError::Index {
            op: "pop",
            index: 0,
            len: 0,
        })?;
        Ok(self.remove_node(index))
    }

    /// Prepend a value
    pub fn unshift(&mut self, value: impl Into<NodeValue>) {
        self.insert_node(0, value.into());
    }

    /// Remove and return the first value
    pub fn shift(&mut self) -> Result<NodeValue> {
        self.check_index("shift", 0)?;
        Ok(self.remove_node(0))
    }

    /// Insert a value so it ends up at `index` (`0..=len`)
    pub fn insert_at(&mut self, index: usize, value: impl Into<NodeValue>) -> Result<()> {
        if index > self.nodes.len() {
            return Err(AlgoVizError::Index {
                op: "insert_at",
                index,
                len: self.nodes.len(),
            });
        }
        self.insert_node(index, value.into());
        Ok(())
    }

    /// Remove and return the value at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<NodeValue> {
        self.check_index("remove_at", index)?;
        Ok(self.remove_node(index))
    }

    /// Replace the value at `index` and return the old one
    ///
    /// The node keeps its id and position; only its value changes.
    pub fn replace_at(&mut self, index: usize, value: impl Into<NodeValue>) -> Result<NodeValue> {
        self.check_index("replace_at", index)?;
        let old = std::mem::replace(&mut self.nodes[index].value, value.into());
        self.refresh(Refresh::ValueChanged);
        Ok(old)
    }

    /// Exchange the nodes at `i` and `j`
    ///
    /// The nodes keep their ids and trade `left` coordinates, so a renderer
    /// animates a straight horizontal swap.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        self.check_index("swap", i)?;
        self.check_index("swap", j)?;
        if i == j {
            return Ok(());
        }
        let (left_i, left_j) = (self.nodes[i].left, self.nodes[j].left);
        self.nodes.swap(i, j);
        self.nodes[i].left = left_i;
        self.nodes[j].left = left_j;
        self.refresh(Refresh::ValueChanged);
        Ok(())
    }

    /// Append several values in order
    pub fn append_values(&mut self, values: impl IntoIterator<Item = NodeValue>) {
        for value in values {
            self.push(value);
        }
    }

    /// Set the selection mode of the node at `index`
    ///
    /// `Custom` requires a color; a missing or malformed color is a format
    /// error and the node is left unchanged.
    pub fn set_selection_mode(
        &mut self,
        index: usize,
        mode: SelectionMode,
        color: Option<&str>,
    ) -> Result<()> {
        self.check_index("set_selection_mode", index)?;
        match mode {
            SelectionMode::Custom => {
                let color = color.ok_or_else(|| {
                    AlgoVizError::Format("custom mode requires a color".to_string())
                })?;
                let color = HexColor::parse(color)?;
                self.nodes[index].set_custom_color(&color);
            }
            _ => self.nodes[index].set_mode(mode),
        }
        Ok(())
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        self.set_selection_mode(index, SelectionMode::Selected, None)
    }

    pub fn compare(&mut self, index: usize) -> Result<()> {
        self.set_selection_mode(index, SelectionMode::Compared, None)
    }

    pub fn clear_mode(&mut self, index: usize) -> Result<()> {
        self.set_selection_mode(index, SelectionMode::None, None)
    }

    /// Give the node at `index` a custom color
    pub fn set_custom_color(&mut self, index: usize, color: &str) -> Result<()> {
        self.set_selection_mode(index, SelectionMode::Custom, Some(color))
    }

    /// Apply a recorded mutation
    ///
    /// Returns the value removed or replaced by the op, if any.
    pub fn apply(&mut self, op: &GraphOp) -> Result<Option<NodeValue>> {
        match op {
            GraphOp::Push(value) => self.push(value.clone()),
            GraphOp::Pop => return self.pop().map(Some),
            GraphOp::Unshift(value) => self.unshift(value.clone()),
            GraphOp::Shift => return self.shift().map(Some),
            GraphOp::InsertAt(index, value) => self.insert_at(*index, value.clone())?,
            GraphOp::RemoveAt(index) => return self.remove_at(*index).map(Some),
            GraphOp::ReplaceAt(index, value) => {
                return self.replace_at(*index, value.clone()).map(Some)
            }
            GraphOp::Swap(i, j) => self.swap(*i, *j)?,
            GraphOp::SetMode(index, mode) => self.set_selection_mode(*index, *mode, None)?,
            GraphOp::SetColor(index, color) => {
                self.set_selection_mode(*index, SelectionMode::Custom, Some(color.as_str()))?
            }
        }
        Ok(None)
    }
}
