use crate::types::{ActionRequest, RecordContext, RecordField, ServiceType};

use RecordField::{AuditId, DashX, EffectiveDate, GttId, Lrn, NpaNxx, NpbId, RegionId, Spid};

/// One entry of a service type's fixed candidate registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateAction {
    pub request_name: &'static str,
    /// Name appended to the allowed-action list on success.
    pub action: &'static str,
    pub key_fields: &'static [RecordField],
    /// Denial may be lifted when the caller's customer owns the record's LRN.
    pub lrn_ownership_override: bool,
}

impl CandidateAction {
    const fn new(
        request_name: &'static str,
        action: &'static str,
        key_fields: &'static [RecordField],
    ) -> Self {
        Self {
            request_name,
            action,
            key_fields,
            lrn_ownership_override: false,
        }
    }

    const fn with_lrn_ownership_override(mut self) -> Self {
        self.lrn_ownership_override = true;
        self
    }

    pub fn build_request(&self, context: &RecordContext) -> ActionRequest {
        ActionRequest {
            request_name: self.request_name.to_string(),
            service_type: context.service_type,
            status: context.status.trim().to_string(),
            key_fields: self.key_fields.to_vec(),
            fields: RecordField::ALL
                .into_iter()
                .filter_map(|field| {
                    context
                        .fields
                        .get(field)
                        .map(|value| (field, value.to_string()))
                })
                .collect(),
        }
    }
}

const LRN: &[CandidateAction] = &[
    CandidateAction::new("LrnCreateRequest", "Create", &[Lrn, Spid, RegionId]),
    CandidateAction::new("LrnDeleteRequest", "Delete", &[Lrn, Spid, RegionId])
        .with_lrn_ownership_override(),
    CandidateAction::new("LrnQueryRequest", "Query", &[Lrn]),
];

const NPA_NXX: &[CandidateAction] = &[
    CandidateAction::new(
        "NpaNxxCreateRequest",
        "Create",
        &[NpaNxx, Spid, RegionId, EffectiveDate],
    ),
    CandidateAction::new("NpaNxxDeleteRequest", "Delete", &[NpaNxx, Spid, RegionId]),
    CandidateAction::new("NpaNxxQueryRequest", "Query", &[NpaNxx]),
];

const NUMBER_POOL_BLOCK: &[CandidateAction] = &[
    CandidateAction::new("NumberPoolBlockModifyRequest", "Modify", &[NpbId, Spid]),
    CandidateAction::new("NumberPoolBlockQueryRequest", "Query", &[NpbId]),
];

const AUDIT: &[CandidateAction] = &[
    CandidateAction::new("AuditCreateRequest", "Create", &[Spid, RegionId]),
    CandidateAction::new("AuditCancelRequest", "Cancel", &[AuditId, Spid]),
    CandidateAction::new("AuditQueryRequest", "Query", &[AuditId]),
];

const GTT: &[CandidateAction] = &[
    CandidateAction::new("GttCreateRequest", "Create", &[NpaNxx, Spid]),
    CandidateAction::new("GttModifyRequest", "Modify", &[GttId, Spid]),
    CandidateAction::new("GttDeleteRequest", "Delete", &[GttId, Spid]),
    CandidateAction::new("GttQueryRequest", "Query", &[GttId]),
];

const SERVICE_PROVIDER: &[CandidateAction] = &[
    CandidateAction::new("ServiceProviderModifyRequest", "Modify", &[Spid, RegionId]),
    CandidateAction::new("ServiceProviderQueryRequest", "Query", &[Spid]),
];

const NPA_NXX_X: &[CandidateAction] = &[
    CandidateAction::new(
        "NpaNxxXCreateRequest",
        "Create",
        &[NpaNxx, DashX, Spid, EffectiveDate],
    ),
    CandidateAction::new("NpaNxxXModifyRequest", "Modify", &[NpaNxx, DashX, Spid]),
    CandidateAction::new("NpaNxxXDeleteRequest", "Delete", &[NpaNxx, DashX, Spid]),
    CandidateAction::new("NpaNxxXQueryRequest", "Query", &[NpaNxx, DashX]),
];

/// Candidates in evaluation order; empty for the status-matrix types.
pub fn candidates_for(service_type: ServiceType) -> &'static [CandidateAction] {
    match service_type {
        ServiceType::Lrn => LRN,
        ServiceType::NpaNxx => NPA_NXX,
        ServiceType::NumberPoolBlock => NUMBER_POOL_BLOCK,
        ServiceType::Audit => AUDIT,
        ServiceType::Gtt => GTT,
        ServiceType::ServiceProvider => SERVICE_PROVIDER,
        ServiceType::NpaNxxX => NPA_NXX_X,
        ServiceType::PortIn | ServiceType::PortOut | ServiceType::IntraPort => &[],
    }
}
