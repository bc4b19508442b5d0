use std::sync::Arc;

use crate::evaluator::{
    error::{DiscoveryError, EvaluationError},
    types::{EvaluatorDescriptor, RuleInput, ViolationCollection},
};

/// Capability every pluggable evaluator implements.
///
/// `Ok(false)` denies the candidate; violations explaining the denial go into
/// `violations`. An `Err` or a panic is treated as a denial by the orchestrator.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(
        &self,
        input: &RuleInput<'_>,
        violations: &mut ViolationCollection,
    ) -> Result<bool, EvaluationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Evaluator,
    AbstractEvaluator,
    Auxiliary,
}

/// Narrow plugin-loader seam: maps a qualified unit name to what it is and
/// hands out evaluator instances.
pub trait UnitLoader: Send + Sync {
    fn identify(&self, qualified_name: &str) -> Result<UnitKind, DiscoveryError>;

    fn instantiate(
        &self,
        descriptor: &EvaluatorDescriptor,
    ) -> Result<Arc<dyn RuleEvaluator>, EvaluationError>;
}

pub trait EvaluatorDiscoveryPort: Send + Sync {
    fn discover(&self, locations: &[String]) -> Vec<EvaluatorDescriptor>;
}
