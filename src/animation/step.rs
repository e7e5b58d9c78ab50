//! Steps and step producers

use crate::error::Result;
use crate::graph::Graph;
use serde::{Deserialize, Serialize};

/// One unit of animation progress
///
/// Serialized untagged, so both `3` and `{"line": 3, "comment": "..."}`
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Highlight a line and show its static comment
    Line(usize),
    /// Highlight a line and show this comment instead
    Annotated {
        line: usize,
        #[serde(default)]
        comment: Option<String>,
    },
}

impl Step {
    /// Line number this step highlights
    pub fn line(&self) -> usize {
        match self {
            Step::Line(line) | Step::Annotated { line, .. } => *line,
        }
    }

    /// Dynamic comment, if one was given and is not empty
    pub fn comment(&self) -> Option<&str> {
        match self {
            Step::Annotated {
                comment: Some(comment),
                ..
            } if !comment.is_empty() => Some(comment),
            _ => None,
        }
    }

    /// Step with a dynamic comment
    pub fn annotated(line: usize, comment: impl Into<String>) -> Self {
        Step::Annotated {
            line,
            comment: Some(comment.into()),
        }
    }
}

impl From<usize> for Step {
    fn from(line: usize) -> Self {
        Step::Line(line)
    }
}

/// A resumable sequence of steps bound to one graph
///
/// Each call advances by exactly one step. Implementations apply whatever
/// graph mutations precede that step before returning it, so the graph
/// always reflects the moment the step describes.
pub trait StepSource: Send {
    /// Advance to the next step, or `None` once exhausted
    fn next_step(&mut self, graph: &mut Graph) -> Option<Result<Step>>;
}

/// A step source that only highlights lines and never touches the graph
#[derive(Debug)]
pub struct PlainSteps<I> {
    steps: I,
}

impl<I> PlainSteps<I>
where
    I: Iterator<Item = Step> + Send,
{
    pub fn new(steps: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            steps: steps.into_iter(),
        }
    }
}

impl<I> StepSource for PlainSteps<I>
where
    I: Iterator<Item = Step> + Send,
{
    fn next_step(&mut self, _graph: &mut Graph) -> Option<Result<Step>> {
        self.steps.next().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_json_forms() {
        let steps: Vec<Step> =
            serde_json::from_str(r#"[2, {"line": 4, "comment": "swap"}, {"line": 5}]"#).unwrap();
        assert_eq!(steps[0], Step::Line(2));
        assert_eq!(steps[1], Step::annotated(4, "swap"));
        assert_eq!(steps[2].line(), 5);
        assert_eq!(steps[2].comment(), None);
    }

    #[test]
    fn test_empty_comment_is_absent() {
        assert_eq!(Step::annotated(1, "").comment(), None);
        assert_eq!(Step::annotated(1, "hi").comment(), Some("hi"));
    }
}
