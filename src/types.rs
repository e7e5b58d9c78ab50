//! Core data types for AlgoViz-RS
//!
//! This module contains the fundamental data structures used throughout
//! the engine for representing animated nodes, their values and how they
//! are drawn.
//!
//! # Main Types
//!
//! - [`NodeValue`] - Numeric or textual payload carried by a node
//! - [`NodeKind`] - Visual shape of a node (circle, square, bar)
//! - [`StructureKind`] - Data structure being animated (list, bar plot, tree)
//! - [`SelectionMode`] - Highlight state that drives a node's color
//! - [`HexColor`] - Validated `#rgb` / `#rrggbb` color string
//! - [`Node`] - One visual element with identity, value and geometry

use crate::error::{AlgoVizError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color of nodes with no selection
pub const DEFAULT_HEX_COLOR: &str = "#5c6bc0";

/// Color of selected nodes
pub const SELECTED_HEX_COLOR: &str = "#ffa726";

/// Color of nodes being compared
pub const COMPARED_HEX_COLOR: &str = "#ef5350";

/// Default seed used when a configuration carries no initial values
pub const DEFAULT_INITIAL_VALUES: [f64; 8] = [1.0, 6.0, 2.0, 4.0, 8.0, 0.0, 8.0, 3.0];

/// Payload carried by a node
///
/// Serialized untagged so that JSON numbers and strings map directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    /// Numeric value (bar plots require these)
    Number(f64),
    /// Free-form text value
    Text(String),
}

impl NodeValue {
    /// Numeric view of the value
    ///
    /// Text is parsed if it looks like a number, otherwise `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NodeValue::Number(n) => Some(*n),
            NodeValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Check if this is a numeric value
    pub fn is_number(&self) -> bool {
        matches!(self, NodeValue::Number(_))
    }
}

impl From<f64> for NodeValue {
    fn from(value: f64) -> Self {
        NodeValue::Number(value)
    }
}

impl From<i64> for NodeValue {
    fn from(value: i64) -> Self {
        NodeValue::Number(value as f64)
    }
}

impl From<&str> for NodeValue {
    fn from(value: &str) -> Self {
        NodeValue::Text(value.to_string())
    }
}

impl From<String> for NodeValue {
    fn from(value: String) -> Self {
        NodeValue::Text(value)
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Number(n) => write!(f, "{}", n),
            NodeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Visual shape of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Round node, used by trees
    Circle,
    /// Square cell, used by lists
    Square,
    /// Vertical bar, used by bar plots
    Bar,
}

impl NodeKind {
    /// Display name for the node kind
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Circle => "Circle",
            NodeKind::Square => "Square",
            NodeKind::Bar => "Bar",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Data structure being animated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Binary tree (declared but not supported by the engine)
    Tree,
    /// Horizontal list of squares
    List,
    /// Bar plot whose bar heights follow the values
    BarPlot,
}

impl StructureKind {
    /// All structure kinds
    pub fn all() -> &'static [StructureKind] {
        &[StructureKind::Tree, StructureKind::List, StructureKind::BarPlot]
    }

    /// Display name for the structure kind
    pub fn display_name(&self) -> &'static str {
        match self {
            StructureKind::Tree => "Tree",
            StructureKind::List => "List",
            StructureKind::BarPlot => "BarPlot",
        }
    }

    /// The node shape a structure is drawn with
    pub fn node_kind(&self) -> NodeKind {
        match self {
            StructureKind::Tree => NodeKind::Circle,
            StructureKind::List => NodeKind::Square,
            StructureKind::BarPlot => NodeKind::Bar,
        }
    }

    /// Whether the engine can lay out and animate this structure
    pub fn is_supported(&self) -> bool {
        !matches!(self, StructureKind::Tree)
    }

    /// Whether nodes carry bar heights
    pub fn has_bar_heights(&self) -> bool {
        matches!(self, StructureKind::BarPlot)
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Highlight state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Not highlighted
    #[default]
    None,
    /// Selected (e.g. the element being moved)
    Selected,
    /// Being compared against another node
    Compared,
    /// User-chosen color
    Custom,
}

impl SelectionMode {
    /// Palette color for the fixed modes
    ///
    /// `Custom` has no palette color; the node carries its own.
    pub fn palette_color(&self) -> Option<&'static str> {
        match self {
            SelectionMode::None => Some(DEFAULT_HEX_COLOR),
            SelectionMode::Selected => Some(SELECTED_HEX_COLOR),
            SelectionMode::Compared => Some(COMPARED_HEX_COLOR),
            SelectionMode::Custom => None,
        }
    }

    /// Parse a mode from its name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(SelectionMode::None),
            "selected" => Some(SelectionMode::Selected),
            "compared" => Some(SelectionMode::Compared),
            "custom" => Some(SelectionMode::Custom),
            _ => None,
        }
    }
}

/// A validated hex color, always stored with a leading `#`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a 3 or 6 digit hex color, with or without a leading `#`
    pub fn parse(input: &str) -> Result<Self> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        let valid_len = digits.len() == 3 || digits.len() == 6;
        if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AlgoVizError::Format(format!(
                "'{}' is not a 3 or 6 digit hex color",
                input
            )));
        }
        Ok(Self(format!("#{}", digits)))
    }

    /// The color as a `#`-prefixed string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = AlgoVizError;

    fn try_from(value: String) -> Result<Self> {
        HexColor::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One visual element of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity, never reused within a graph
    pub id: u64,
    /// The payload shown by the node
    pub value: NodeValue,
    /// Highlight state
    pub selection_mode: SelectionMode,
    /// Bar height in pixels (bar plots only)
    pub height: Option<f64>,
    /// Horizontal offset from the layout origin in pixels
    pub left: f64,
    /// Current fill color
    pub color: String,
}

impl Node {
    /// Create a node with no selection and no geometry yet
    pub fn new(id: u64, value: NodeValue) -> Self {
        Self {
            id,
            value,
            selection_mode: SelectionMode::None,
            height: None,
            left: 0.0,
            color: DEFAULT_HEX_COLOR.to_string(),
        }
    }

    /// Switch to one of the palette modes
    ///
    /// Switching to `Custom` without a color keeps the current color.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
        if let Some(color) = mode.palette_color() {
            self.color = color.to_string();
        }
    }

    /// Switch to `Custom` mode with the given color
    pub fn set_custom_color(&mut self, color: &HexColor) {
        self.selection_mode = SelectionMode::Custom;
        self.color = color.as_str().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_accepts_short_and_long_forms() {
        assert_eq!(HexColor::parse("fff").unwrap().as_str(), "#fff");
        assert_eq!(HexColor::parse("#A0b1C2").unwrap().as_str(), "#A0b1C2");
    }

    #[test]
    fn test_hex_color_rejects_bad_input() {
        for bad in ["", "#", "ff", "ffff", "#gggggg", "##fff", "1234567"] {
            let err = HexColor::parse(bad).unwrap_err();
            assert!(matches!(err, AlgoVizError::Format(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_node_value_untagged_json() {
        let values: Vec<NodeValue> = serde_json::from_str(r#"[1, 2.5, "three"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                NodeValue::Number(1.0),
                NodeValue::Number(2.5),
                NodeValue::Text("three".to_string())
            ]
        );
        assert_eq!(NodeValue::Text(" 4 ".into()).as_number(), Some(4.0));
        assert_eq!(NodeValue::Text("four".into()).as_number(), None);
    }

    #[test]
    fn test_structure_node_kinds() {
        assert_eq!(StructureKind::BarPlot.node_kind(), NodeKind::Bar);
        assert_eq!(StructureKind::List.node_kind(), NodeKind::Square);
        assert_eq!(StructureKind::Tree.node_kind(), NodeKind::Circle);
        assert!(!StructureKind::Tree.is_supported());
    }

    #[test]
    fn test_node_modes_drive_color() {
        let mut node = Node::new(0, 1.0.into());
        assert_eq!(node.color, DEFAULT_HEX_COLOR);
        node.set_mode(SelectionMode::Compared);
        assert_eq!(node.color, COMPARED_HEX_COLOR);
        node.set_custom_color(&HexColor::parse("abc").unwrap());
        assert_eq!(node.selection_mode, SelectionMode::Custom);
        assert_eq!(node.color, "#abc");
        node.set_mode(SelectionMode::None);
        assert_eq!(node.color, DEFAULT_HEX_COLOR);
    }
}
