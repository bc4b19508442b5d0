use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("search path location '{location}' does not exist")]
    MissingLocation { location: String },
    #[error("search path location '{location}' is neither a directory nor an archive")]
    UnsupportedLocation { location: String },
    #[error("failed to read archive '{location}': {message}")]
    Archive { location: String, message: String },
    #[error("failed to walk '{location}': {message}")]
    Walk { location: String, message: String },
    #[error("unable to identify unit '{qualified_name}': {message}")]
    UnitLoad {
        qualified_name: String,
        message: String,
    },
}

impl DiscoveryError {
    pub fn unit_load(qualified_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnitLoad {
            qualified_name: qualified_name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationErrorKind {
    EvaluatorUnavailable,
    EvaluatorFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationError {
    pub kind: EvaluationErrorKind,
    pub message: String,
}

impl EvaluationError {
    pub fn new(kind: EvaluationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvaluationError {}

pub fn evaluator_unavailable(message: impl Into<String>) -> EvaluationError {
    EvaluationError::new(EvaluationErrorKind::EvaluatorUnavailable, message)
}

pub fn evaluator_failed(message: impl Into<String>) -> EvaluationError {
    EvaluationError::new(EvaluationErrorKind::EvaluatorFailed, message)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unit name '{0}' is not a valid qualified name")]
    InvalidName(String),
    #[error("unit '{0}' is already registered")]
    Duplicate(String),
}
