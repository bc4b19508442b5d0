pub mod builtin;
pub mod cache;
pub mod catalog;
pub mod discovery;
pub mod error;
pub mod ports;
pub mod types;

pub use builtin::{REQUIRED_FIELDS_RULE, RULE_BASE_UNIT, RequiredFieldsRule, builtin_catalog};
pub use cache::EvaluatorCache;
pub use catalog::{EvaluatorCatalog, EvaluatorCatalogBuilder, EvaluatorFactory};
pub use discovery::{DEFAULT_UNIT_SUFFIX, EvaluatorDiscovery, INNER_UNIT_MARKER};
pub use error::{
    CatalogError, DiscoveryError, EvaluationError, EvaluationErrorKind, evaluator_failed,
    evaluator_unavailable,
};
pub use ports::{EvaluatorDiscoveryPort, RuleEvaluator, UnitKind, UnitLoader};
pub use types::{
    CandidateOutcome, EvaluatorDescriptor, QualifiedName, RuleInput, Violation,
    ViolationCollection,
};
