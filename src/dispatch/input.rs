//! Parameter kinds, validation and casting of raw user input

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AlgoVizError, Result};

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"^-?(\d+(\.\d+)?|\.\d+)$").unwrap();
    static ref NUMBER_LIST_RE: Regex =
        Regex::new(r"^\s*-?(\d+(\.\d+)?|\.\d+)\s*(,\s*-?(\d+(\.\d+)?|\.\d+)\s*)*$").unwrap();
}

/// Kind of value an interactive parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    Number,
    NumberList,
    String,
    StringList,
}

impl InputKind {
    pub fn all() -> &'static [InputKind] {
        &[
            InputKind::Number,
            InputKind::NumberList,
            InputKind::String,
            InputKind::StringList,
        ]
    }

    /// Name used in configs and scripts
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Number => "number",
            InputKind::NumberList => "numberList",
            InputKind::String => "string",
            InputKind::StringList => "stringList",
        }
    }

    /// Parse the config/script name of a kind
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }

    /// Hint shown next to an input box
    pub fn placeholder(&self) -> &'static str {
        match self {
            InputKind::Number => "e.g. 42",
            InputKind::NumberList => "e.g. 3, 1, 2",
            InputKind::String => "text",
            InputKind::StringList => "e.g. a, b, c",
        }
    }

    /// Check a raw input, returning a message describing the problem
    pub fn check(&self, raw: &str) -> std::result::Result<(), String> {
        if raw.is_empty() {
            return Err("value is required".to_string());
        }
        match self {
            InputKind::Number if !NUMBER_RE.is_match(raw.trim()) => {
                Err(format!("'{}' is not a number", raw))
            }
            InputKind::NumberList if !NUMBER_LIST_RE.is_match(raw) => {
                Err(format!("'{}' is not a comma separated list of numbers", raw))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared parameter of an interactive function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: InputKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Validate a raw input for this parameter
    pub fn validate(&self, raw: &str) -> Result<()> {
        self.kind
            .check(raw)
            .map_err(|message| AlgoVizError::Validation {
                param: self.name.clone(),
                message,
            })
    }

    /// Validate and cast a raw input
    pub fn cast(&self, raw: &str) -> Result<ParamValue> {
        self.validate(raw)?;
        let number = |s: &str| {
            s.trim().parse::<f64>().map_err(|e| AlgoVizError::Validation {
                param: self.name.clone(),
                message: e.to_string(),
            })
        };
        let value = match self.kind {
            InputKind::Number => ParamValue::Number(number(raw)?),
            InputKind::NumberList => ParamValue::NumberList(
                raw.split(',').map(number).collect::<Result<Vec<_>>>()?,
            ),
            InputKind::String => ParamValue::String(raw.to_string()),
            InputKind::StringList => {
                ParamValue::StringList(raw.split(',').map(|s| s.trim().to_string()).collect())
            }
        };
        Ok(value)
    }
}

/// A cast parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    NumberList(Vec<f64>),
    String(String),
    StringList(Vec<String>),
}

impl ParamValue {
    pub fn kind(&self) -> InputKind {
        match self {
            ParamValue::Number(_) => InputKind::Number,
            ParamValue::NumberList(_) => InputKind::NumberList,
            ParamValue::String(_) => InputKind::String,
            ParamValue::StringList(_) => InputKind::StringList,
        }
    }
}
