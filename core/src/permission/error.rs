use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    ConnectionUnavailable,
    QueryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupError {
    pub kind: LookupErrorKind,
    pub message: String,
}

impl LookupError {
    pub fn new(kind: LookupErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LookupError {}

pub fn connection_unavailable(message: impl Into<String>) -> LookupError {
    LookupError::new(LookupErrorKind::ConnectionUnavailable, message)
}

pub fn query_failed(message: impl Into<String>) -> LookupError {
    LookupError::new(LookupErrorKind::QueryFailed, message)
}
