pub mod candidates;
pub mod facade;
pub mod pipeline;

pub use candidates::{CandidateAction, candidates_for};
pub use facade::AllowedActionsService;
pub use pipeline::RuleEvaluationOrchestrator;
