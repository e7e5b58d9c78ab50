//! Error handling for the AlgoViz-RS engine
//!
//! This module defines the engine error type, a Result alias, and the
//! coarse [`ErrorSurface`] categories reported to the display layer.

use crate::types::StructureKind;
use thiserror::Error;

/// Main error type for AlgoViz-RS operations
#[derive(Error, Debug)]
pub enum AlgoVizError {
    /// The user's executable failed to compile or to describe its functions
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The user's code failed while producing steps
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// An interactive function input failed its format check
    #[error("Invalid value for '{param}': {message}")]
    Validation { param: String, message: String },

    /// A custom node color was malformed
    #[error("Format error: {0}")]
    Format(String),

    /// A structural index was out of range
    #[error("Index {index} out of range for {op} on {len} nodes")]
    Index {
        op: &'static str,
        index: usize,
        len: usize,
    },

    /// A step referenced a line outside the active function
    #[error("Line {line} is outside the function's lines {start}..={end}")]
    Range { line: usize, start: usize, end: usize },

    /// The structure kind has no layout rules
    #[error("Unsupported structure kind: {0}")]
    UnsupportedStructure(StructureKind),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AlgoVizError>,
    },
}

/// How an error is presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSurface {
    /// Configuration rejected at load
    Syntax,
    /// The running animation failed
    Runtime,
    /// Inline input error, nothing was invoked
    Validation,
    /// Bad custom color, mutation rejected
    Format,
    /// Host-side failure (files, serialization)
    Host,
}

impl AlgoVizError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AlgoVizError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a syntax error from a Rhai error
    pub fn from_rhai_syntax(err: impl std::fmt::Display) -> Self {
        AlgoVizError::Syntax(err.to_string())
    }

    /// Create a runtime error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        AlgoVizError::Runtime(err.to_string())
    }

    /// The category this error is reported under
    pub fn surface(&self) -> ErrorSurface {
        match self {
            AlgoVizError::Syntax(_) => ErrorSurface::Syntax,
            AlgoVizError::Runtime(_)
            | AlgoVizError::Index { .. }
            | AlgoVizError::Range { .. } => ErrorSurface::Runtime,
            AlgoVizError::Validation { .. } => ErrorSurface::Validation,
            AlgoVizError::Format(_) => ErrorSurface::Format,
            AlgoVizError::UnsupportedStructure(_) => ErrorSurface::Syntax,
            AlgoVizError::Config(_) | AlgoVizError::Io(_) | AlgoVizError::Serialization(_) => {
                ErrorSurface::Host
            }
            AlgoVizError::WithContext { source, .. } => source.surface(),
        }
    }
}

impl From<serde_json::Error> for AlgoVizError {
    fn from(err: serde_json::Error) -> Self {
        AlgoVizError::Serialization(err.to_string())
    }
}

/// Result type alias for AlgoViz-RS operations
pub type Result<T> = std::result::Result<T, AlgoVizError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AlgoVizError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AlgoVizError::from_rhai_error(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AlgoVizError::Validation {
            param: "n".to_string(),
            message: "expected a number".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for 'n': expected a number");
    }

    #[test]
    fn test_error_with_context() {
        let err = AlgoVizError::Syntax("unexpected '}'".to_string());
        let with_ctx = err.with_context("Failed to load config");
        assert!(with_ctx.to_string().contains("Failed to load config"));
        assert_eq!(with_ctx.surface(), ErrorSurface::Syntax);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(AlgoVizError::Format("bad color".to_string()));
        let err = result.context("Setting node color").unwrap_err();
        assert_eq!(err.to_string(), "Setting node color: Format error: bad color");
        assert_eq!(err.surface(), ErrorSurface::Format);

        let rhai_result: std::result::Result<(), Box<rhai::EvalAltResult>> =
            Err("boom".into());
        let err = rhai_result.with_context(|| "In function 'f'".to_string()).unwrap_err();
        assert_eq!(err.surface(), ErrorSurface::Runtime);
        assert!(err.to_string().starts_with("In function 'f': "));
    }

    #[test]
    fn test_index_and_range_surface_as_runtime() {
        let index = AlgoVizError::Index {
            op: "remove_at",
            index: 4,
            len: 3,
        };
        assert_eq!(index.surface(), ErrorSurface::Runtime);
        assert!(index.to_string().contains("remove_at"));

        let range = AlgoVizError::Range {
            line: 12,
            start: 0,
            end: 5,
        };
        assert_eq!(range.surface(), ErrorSurface::Runtime);
        assert!(range.to_string().contains("0..=5"));
    }
}
