use std::sync::Arc;

use crate::evaluator::{
    catalog::{EvaluatorCatalog, EvaluatorCatalogBuilder},
    error::EvaluationError,
    ports::RuleEvaluator,
    types::{RuleInput, ViolationCollection},
};

pub const RULE_BASE_UNIT: &str = "portgate.rules.RuleBase";
pub const REQUIRED_FIELDS_RULE: &str = "portgate.rules.RequiredFields";

/// Denies a candidate whose key fields are absent from the record.
#[derive(Debug, Clone, Default)]
pub struct RequiredFieldsRule;

impl RuleEvaluator for RequiredFieldsRule {
    fn evaluate(
        &self,
        input: &RuleInput<'_>,
        violations: &mut ViolationCollection,
    ) -> Result<bool, EvaluationError> {
        let mut complete = true;
        for field in input.request.missing_key_fields() {
            complete = false;
            violations.push(
                "missing_field",
                format!("{} requires field {:?}", input.request.request_name, field),
            );
        }
        Ok(complete)
    }
}

/// Catalog builder preloaded with the units shipped in this crate.
pub fn builtin_catalog() -> EvaluatorCatalogBuilder {
    EvaluatorCatalog::builder()
        .abstract_unit(RULE_BASE_UNIT)
        .evaluator(REQUIRED_FIELDS_RULE, Arc::new(RequiredFieldsRule))
}
