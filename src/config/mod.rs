//! Configuration module for AlgoViz-RS
//!
//! This module handles the two kinds of configuration:
//! - Animation configs (`.json`): the user's executable, the code/comment
//!   lines shown next to the animation, the seed values and the structure
//! - Playback settings (`.toml`): step delay, viewport size and run limits
//!
//! # Example
//!
//! ```ignore
//! use algoviz_rs::config::AnimationConfig;
//!
//! let config = AnimationConfig::load("bubble_sort.json")?;
//! config.save("copy.json")?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{AlgoVizError, Result, ResultExt};
use crate::scripting::builtins::Template;
use crate::types::{NodeKind, NodeValue, StructureKind, DEFAULT_INITIAL_VALUES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Animation config file extension
pub const CONFIG_FILE_EXTENSION: &str = "json";

/// One line of displayed code with its explanation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayLine {
    pub code: String,
    #[serde(default)]
    pub comment: String,
}

impl DisplayLine {
    pub fn new(code: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            comment: comment.into(),
        }
    }
}

fn default_initial_values() -> Vec<NodeValue> {
    DEFAULT_INITIAL_VALUES
        .iter()
        .map(|&v| NodeValue::Number(v))
        .collect()
}

/// Everything needed to set up one animation
///
/// Field names follow the JSON files produced by the code editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationConfig {
    /// Optional title shown above the animation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Rhai source declaring the interactive functions
    pub executable: String,

    /// Code and comment lines, indexed by step line numbers
    #[serde(
        rename = "displayableCodeComments",
        alias = "displayable",
        alias = "displayLines",
        default
    )]
    pub display_lines: Vec<DisplayLine>,

    /// Values the graph is seeded with
    #[serde(default = "default_initial_values")]
    pub initial_values: Vec<NodeValue>,

    /// Node shape; derived from the structure when absent
    #[serde(
        rename = "nodeType",
        alias = "nodeKind",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub node_kind: Option<NodeKind>,

    /// Data structure being animated
    #[serde(rename = "dataStructure", alias = "structureKind")]
    pub structure: StructureKind,
}

impl AnimationConfig {
    /// Create a config with default seed values and no display lines
    pub fn new(structure: StructureKind, executable: impl Into<String>) -> Self {
        Self {
            title: None,
            executable: executable.into(),
            display_lines: Vec::new(),
            initial_values: default_initial_values(),
            node_kind: None,
            structure,
        }
    }

    /// Build the config of a built-in template
    pub fn from_template(template: &Template) -> Self {
        Self {
            title: Some(template.title.to_string()),
            executable: template.executable.to_string(),
            display_lines: template
                .display_lines
                .iter()
                .map(|(code, comment)| DisplayLine::new(*code, *comment))
                .collect(),
            initial_values: template
                .initial_values
                .iter()
                .map(|&v| NodeValue::Number(v))
                .collect(),
            node_kind: None,
            structure: template.structure,
        }
    }

    /// Node shape, explicit or derived from the structure
    pub fn effective_node_kind(&self) -> NodeKind {
        self.node_kind.unwrap_or_else(|| self.structure.node_kind())
    }

    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AlgoVizError::Syntax(format!("Invalid config: {}", e)))
    }

    /// Serialize the config to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(AlgoVizError::from)
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlgoVizError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_json(&content).with_context(|| format!("{:?}", path))
    }

    /// Save the config to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_json()?;

        std::fs::write(path, content).map_err(|e| {
            AlgoVizError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
