//! Error taxonomy for the generator
//!
//! Configuration problems are collected and reported together. Report
//! window problems are raised as soon as they are found.

use std::fmt;

/// A single offending configuration field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one configuration object
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid generator configuration ({} problem(s)): {}", .violations.len(), join_violations(.violations))]
pub struct ConfigError {
    pub violations: Vec<Violation>,
}

impl ConfigError {
    /// Turn a collected list into a result; empty means valid
    pub fn check(violations: Vec<Violation>) -> Result<(), ConfigError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { violations })
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Invalid report window bounds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("{field} is not a valid date or timestamp: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("end {end} is before start {start}")]
    EndBeforeStart { start: String, end: String },
}

/// Inconsistent attribute override tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("volume claim {claim} in namespace {namespace} references unknown pod {pod}")]
    UnknownPod {
        namespace: String,
        claim: String,
        pod: String,
    },
}

/// Umbrella error for generator entry points
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
