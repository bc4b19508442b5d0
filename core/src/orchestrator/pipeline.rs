use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tracing::Instrument;
use uuid::Uuid;

use crate::{
    evaluator::{
        EvaluationError, EvaluatorCache, EvaluatorDescriptor, RuleEvaluator, UnitLoader,
        evaluator_failed,
        types::{CandidateOutcome, RuleInput, ViolationCollection},
    },
    orchestrator::candidates::{CandidateAction, candidates_for},
    permission::{LrnOwnershipKey, PermissionGate},
    types::{AllowedActionList, Caller, RecordContext, ServiceType},
};

struct LoadedEvaluator {
    descriptor: EvaluatorDescriptor,
    evaluator: Result<Arc<dyn RuleEvaluator>, EvaluationError>,
}

/// Runs the discovered evaluators over a rule-evaluated service type's
/// candidate actions and collects the ones that pass.
pub struct RuleEvaluationOrchestrator {
    gate: Arc<PermissionGate>,
    cache: Arc<EvaluatorCache>,
    loader: Arc<dyn UnitLoader>,
    search_path: String,
}

impl RuleEvaluationOrchestrator {
    pub fn new(
        gate: Arc<PermissionGate>,
        cache: Arc<EvaluatorCache>,
        loader: Arc<dyn UnitLoader>,
        search_path: impl Into<String>,
    ) -> Self {
        Self {
            gate,
            cache,
            loader,
            search_path: search_path.into(),
        }
    }

    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    pub fn cache(&self) -> &Arc<EvaluatorCache> {
        &self.cache
    }

    /// Never fails: lookup and evaluator errors only narrow the result.
    pub async fn allowed_actions(
        &self,
        caller: &Caller,
        context: &RecordContext,
    ) -> AllowedActionList {
        let run_id = Uuid::now_v7();
        let run_span = tracing::info_span!(
            target: "orchestrator",
            "rule_evaluation",
            run_id = %run_id,
            service_type = %context.service_type,
            user_id = %caller.user_id,
            customer_id = %caller.customer_id
        );
        self.run(caller, context).instrument(run_span).await
    }

    async fn run(&self, caller: &Caller, context: &RecordContext) -> AllowedActionList {
        let candidates = candidates_for(context.service_type);
        if candidates.is_empty() {
            return Vec::new();
        }

        let permissions = self.gate.permissions_for(caller).await;
        if !self.gate.may_evaluate(context.service_type, &permissions) {
            tracing::info!(
                target: "orchestrator",
                service_type = %context.service_type,
                "rule_evaluation_gated"
            );
            return Vec::new();
        }

        let descriptors = self.cache.get_or_discover(&self.search_path);
        let evaluators = self.load_evaluators(&descriptors);

        let mut allowed_actions = Vec::with_capacity(candidates.len());
        let mut prior = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let allowed = self
                .evaluate_candidate(candidate, caller, context, &evaluators, &prior)
                .await;
            if allowed {
                allowed_actions.push(candidate.action.to_string());
            }
            prior.push(CandidateOutcome {
                request_name: candidate.request_name.to_string(),
                allowed,
            });
        }

        tracing::info!(
            target: "orchestrator",
            evaluators = evaluators.len(),
            candidates = candidates.len(),
            allowed = allowed_actions.len(),
            "rule_evaluation_completed"
        );
        allowed_actions
    }

    fn load_evaluators(&self, descriptors: &[EvaluatorDescriptor]) -> Vec<LoadedEvaluator> {
        descriptors
            .iter()
            .map(|descriptor| {
                let evaluator = self.loader.instantiate(descriptor);
                if let Err(err) = &evaluator {
                    tracing::warn!(
                        target: "orchestrator",
                        evaluator = %descriptor.qualified_name,
                        error = %err,
                        "evaluator_instantiation_failed"
                    );
                }
                LoadedEvaluator {
                    descriptor: descriptor.clone(),
                    evaluator,
                }
            })
            .collect()
    }

    async fn evaluate_candidate(
        &self,
        candidate: &CandidateAction,
        caller: &Caller,
        context: &RecordContext,
        evaluators: &[LoadedEvaluator],
        prior: &[CandidateOutcome],
    ) -> bool {
        let request = candidate.build_request(context);
        let input = RuleInput {
            request: &request,
            caller,
            prior,
        };
        let mut violations = ViolationCollection::new();
        let mut allowed = run_evaluators(evaluators, &input, &mut violations);

        if context.service_type == ServiceType::NpaNxx && caller.in_sub_domain() {
            allowed = false;
            violations.push(
                "sub_domain_scope",
                format!(
                    "sub-domain '{}' may not request {}",
                    caller.sub_domain.as_deref().unwrap_or_default(),
                    candidate.request_name
                ),
            );
        }

        if candidate.lrn_ownership_override && !allowed {
            allowed = self.caller_owns_lrn(caller, context).await;
        }

        if !allowed {
            tracing::info!(
                target: "orchestrator",
                request_name = candidate.request_name,
                violations = violations.len(),
                detail = %violations.summary(),
                "candidate_denied"
            );
        }
        allowed
    }

    /// `true` only when the directory names the caller's customer as the
    /// LRN owner. Missing key fields and lookup failures both yield `false`.
    async fn caller_owns_lrn(&self, caller: &Caller, context: &RecordContext) -> bool {
        let Some(key) = LrnOwnershipKey::from_fields(&context.fields) else {
            tracing::debug!(target: "orchestrator", "lrn_ownership_key_incomplete");
            return false;
        };

        match self.gate.lrn_owner(&key).await {
            Ok(Some(owner)) if owner.trim() == caller.customer_id.trim() => {
                tracing::info!(
                    target: "orchestrator",
                    lrn = %key.lrn,
                    customer_id = %caller.customer_id,
                    "lrn_ownership_override_applied"
                );
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(
                    target: "orchestrator",
                    lrn = %key.lrn,
                    region_id = %key.region_id,
                    spid = %key.spid,
                    error = %err,
                    "lrn_ownership_lookup_failed"
                );
                false
            }
        }
    }
}

/// Stops at the first evaluator that denies or errors.
fn run_evaluators(
    evaluators: &[LoadedEvaluator],
    input: &RuleInput<'_>,
    violations: &mut ViolationCollection,
) -> bool {
    for loaded in evaluators {
        let outcome = match &loaded.evaluator {
            Ok(evaluator) => evaluate_contained(evaluator.as_ref(), input, violations),
            Err(err) => Err(err.clone()),
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(
                    target: "orchestrator",
                    request_name = %input.request.request_name,
                    evaluator = %loaded.descriptor.qualified_name,
                    "evaluator_denied"
                );
                return false;
            }
            Err(err) => {
                tracing::warn!(
                    target: "orchestrator",
                    request_name = %input.request.request_name,
                    evaluator = %loaded.descriptor.qualified_name,
                    error_kind = ?err.kind,
                    error = %err,
                    "evaluator_failed"
                );
                violations.push("evaluator_error", err.to_string());
                return false;
            }
        }
    }
    true
}

/// A panicking evaluator denies its candidate like any other evaluator failure.
fn evaluate_contained(
    evaluator: &dyn RuleEvaluator,
    input: &RuleInput<'_>,
    violations: &mut ViolationCollection,
) -> Result<bool, EvaluationError> {
    panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(input, violations)))
        .unwrap_or_else(|payload| Err(evaluator_failed(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    format!("evaluator panicked: {detail}")
}
