use std::sync::Arc;

use crate::{
    orchestrator::pipeline::RuleEvaluationOrchestrator,
    permission::PermissionGate,
    status::StatusActionMatrix,
    types::{AllowedActionList, Caller, RecordContext, RecordDocument},
};

/// Entry point answering "which actions may this caller request on this record".
pub struct AllowedActionsService {
    gate: Arc<PermissionGate>,
    orchestrator: RuleEvaluationOrchestrator,
}

impl AllowedActionsService {
    pub fn new(gate: Arc<PermissionGate>, orchestrator: RuleEvaluationOrchestrator) -> Self {
        Self { gate, orchestrator }
    }

    pub fn orchestrator(&self) -> &RuleEvaluationOrchestrator {
        &self.orchestrator
    }

    pub async fn allowed_actions(
        &self,
        caller: &Caller,
        context: &RecordContext,
    ) -> AllowedActionList {
        if !context.service_type.uses_status_matrix() {
            return self.orchestrator.allowed_actions(caller, context).await;
        }

        let permissions = self.gate.permissions_for(caller).await;
        if !self.gate.may_use_status_matrix(&permissions) {
            tracing::info!(
                target: "orchestrator",
                service_type = %context.service_type,
                user_id = %caller.user_id,
                "status_matrix_gated"
            );
            return Vec::new();
        }

        let actions: AllowedActionList =
            StatusActionMatrix::allowed_actions(context.service_type, &context.status)
                .iter()
                .map(|action| action.as_str().to_string())
                .collect();
        tracing::debug!(
            target: "orchestrator",
            service_type = %context.service_type,
            status = %context.status,
            allowed = actions.len(),
            "status_matrix_resolved"
        );
        actions
    }

    /// Unrecognised service types yield an empty list.
    pub async fn allowed_actions_for_document(
        &self,
        caller: &Caller,
        document: RecordDocument,
    ) -> AllowedActionList {
        match RecordContext::try_from(document) {
            Ok(context) => self.allowed_actions(caller, &context).await,
            Err(err) => {
                tracing::warn!(target: "orchestrator", error = %err, "unknown_service_type");
                Vec::new()
            }
        }
    }

    /// Invalidation hook; returns the number of dropped search-path entries.
    pub fn flush_evaluator_cache(&self) -> usize {
        self.orchestrator.cache().flush()
    }
}
