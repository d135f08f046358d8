//! Error types for the reactive graph

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RealmError {
    #[error("Unknown node: {node}")]
    UnknownNode { node: String },

    #[error("No node declared under '{name}'")]
    MissingNode { name: String },

    #[error("Node '{name}' is already declared")]
    DuplicateNode { name: String },

    #[error("Node '{node}' holds {found}, expected {expected}")]
    TypeMismatch {
        node: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cell '{node}' requires an initial value")]
    InvalidInitialState { node: String },

    #[error("{} failure(s) during propagation: {}", failures.len(), summarize(failures))]
    Propagation { failures: Vec<PropagationFailure> },
}

impl RealmError {
    /// Failures isolated during propagation, if that is what this error carries
    pub fn failures(&self) -> &[PropagationFailure] {
        match self {
            RealmError::Propagation { failures } => failures,
            _ => &[],
        }
    }
}

/// Where an isolated failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// A subscription callback returned an error
    Subscriber,
    /// A fallible pipeline stage returned an error
    Operator,
}

/// A failure isolated to one subscriber (or one pipeline branch)
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationFailure {
    pub node: String,
    pub stage: FailureStage,
    pub message: String,
}

impl fmt::Display for PropagationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            FailureStage::Subscriber => "subscriber",
            FailureStage::Operator => "operator",
        };
        write!(f, "{} of '{}': {}", stage, self.node, self.message)
    }
}

fn summarize(failures: &[PropagationFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
