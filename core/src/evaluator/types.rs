use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ActionRequest, Caller};

pub type QualifiedName = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorDescriptor {
    pub qualified_name: QualifiedName,
    /// Search-path location the unit was first found at.
    pub location: String,
}

impl EvaluatorDescriptor {
    pub fn new(qualified_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for EvaluatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.qualified_name, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub message: String,
}

/// Violations reported while evaluating one candidate action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationCollection {
    entries: Vec<Violation>,
}

impl ViolationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Violation {
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.entries.iter()
    }

    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|violation| format!("{}: {}", violation.code, violation.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOutcome {
    pub request_name: String,
    pub allowed: bool,
}

/// Everything an evaluator sees for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub request: &'a ActionRequest,
    pub caller: &'a Caller,
    /// Outcomes of the candidates already decided in this run, in order.
    pub prior: &'a [CandidateOutcome],
}
