//! Recordable graph mutations
//!
//! Scripts run against a detached copy of the graph, and every mutation they
//! make is captured as a [`GraphOp`] so it can be replayed on the live graph
//! at the right moment during playback.

use crate::types::{HexColor, NodeValue, SelectionMode};

/// One mutation of a [`super::Graph`]
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    Push(NodeValue),
    Pop,
    Unshift(NodeValue),
    Shift,
    InsertAt(usize, NodeValue),
    RemoveAt(usize),
    ReplaceAt(usize, NodeValue),
    Swap(usize, usize),
    SetMode(usize, SelectionMode),
    SetColor(usize, HexColor),
}

impl GraphOp {
    /// Short name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            GraphOp::Push(_) => "push",
            GraphOp::Pop => "pop",
            GraphOp::Unshift(_) => "unshift",
            GraphOp::Shift => "shift",
            GraphOp::InsertAt(..) => "insert_at",
            GraphOp::RemoveAt(_) => "remove_at",
            GraphOp::ReplaceAt(..) => "replace_at",
            GraphOp::Swap(..) => "swap",
            GraphOp::SetMode(..) => "set_mode",
            GraphOp::SetColor(..) => "set_color",
        }
    }

    /// Whether the op changes the node count
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphOp::Push(_)
                | GraphOp::Pop
                | GraphOp::Unshift(_)
                | GraphOp::Shift
                | GraphOp::InsertAt(..)
                | GraphOp::RemoveAt(_)
        )
    }
}
