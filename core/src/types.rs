use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type CustomerId = String;
pub type ActionName = String;
pub type AllowedActionList = Vec<ActionName>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    PortIn,
    PortOut,
    IntraPort,
    Lrn,
    NpaNxx,
    NumberPoolBlock,
    Audit,
    Gtt,
    ServiceProvider,
    NpaNxxX,
}

impl ServiceType {
    pub const ALL: [ServiceType; 10] = [
        ServiceType::PortIn,
        ServiceType::PortOut,
        ServiceType::IntraPort,
        ServiceType::Lrn,
        ServiceType::NpaNxx,
        ServiceType::NumberPoolBlock,
        ServiceType::Audit,
        ServiceType::Gtt,
        ServiceType::ServiceProvider,
        ServiceType::NpaNxxX,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::PortIn => "PortIn",
            ServiceType::PortOut => "PortOut",
            ServiceType::IntraPort => "IntraPort",
            ServiceType::Lrn => "Lrn",
            ServiceType::NpaNxx => "NpaNxx",
            ServiceType::NumberPoolBlock => "NumberPoolBlock",
            ServiceType::Audit => "Audit",
            ServiceType::Gtt => "Gtt",
            ServiceType::ServiceProvider => "ServiceProvider",
            ServiceType::NpaNxxX => "NpaNxxX",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownServiceType> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownServiceType(trimmed.to_string()))
    }

    /// Subscription-version types answered from the status matrix alone.
    pub fn uses_status_matrix(self) -> bool {
        matches!(
            self,
            ServiceType::PortIn | ServiceType::PortOut | ServiceType::IntraPort
        )
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service type '{0}'")]
pub struct UnknownServiceType(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Lrn,
    Spid,
    RegionId,
    NpaNxx,
    DashX,
    NpbId,
    Tn,
    GttId,
    AuditId,
    EffectiveDate,
}

impl RecordField {
    pub const ALL: [RecordField; 10] = [
        RecordField::Lrn,
        RecordField::Spid,
        RecordField::RegionId,
        RecordField::NpaNxx,
        RecordField::DashX,
        RecordField::NpbId,
        RecordField::Tn,
        RecordField::GttId,
        RecordField::AuditId,
        RecordField::EffectiveDate,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    pub lrn: Option<String>,
    pub spid: Option<String>,
    pub region_id: Option<String>,
    pub npa_nxx: Option<String>,
    pub dash_x: Option<String>,
    pub npb_id: Option<String>,
    pub tn: Option<String>,
    pub gtt_id: Option<String>,
    pub audit_id: Option<String>,
    pub effective_date: Option<String>,
}

impl RecordFields {
    /// Returns the trimmed value, treating blank strings as absent.
    pub fn get(&self, field: RecordField) -> Option<&str> {
        let value = match field {
            RecordField::Lrn => &self.lrn,
            RecordField::Spid => &self.spid,
            RecordField::RegionId => &self.region_id,
            RecordField::NpaNxx => &self.npa_nxx,
            RecordField::DashX => &self.dash_x,
            RecordField::NpbId => &self.npb_id,
            RecordField::Tn => &self.tn,
            RecordField::GttId => &self.gtt_id,
            RecordField::AuditId => &self.audit_id,
            RecordField::EffectiveDate => &self.effective_date,
        };
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Raw record as handed over by the query-result parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDocument {
    pub service_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fields: RecordFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub service_type: ServiceType,
    pub status: String,
    pub fields: RecordFields,
}

impl RecordContext {
    pub fn new(service_type: ServiceType, status: impl Into<String>, fields: RecordFields) -> Self {
        Self {
            service_type,
            status: status.into(),
            fields,
        }
    }
}

impl TryFrom<RecordDocument> for RecordContext {
    type Error = UnknownServiceType;

    fn try_from(document: RecordDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            service_type: ServiceType::parse(&document.service_type)?,
            status: document.status,
            fields: document.fields,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub sub_domain: Option<String>,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            customer_id: customer_id.into(),
            sub_domain: None,
        }
    }

    pub fn with_sub_domain(mut self, sub_domain: impl Into<String>) -> Self {
        self.sub_domain = Some(sub_domain.into());
        self
    }

    pub fn in_sub_domain(&self) -> bool {
        self.sub_domain
            .as_deref()
            .is_some_and(|scope| !scope.trim().is_empty())
    }
}

/// Request representation produced by a candidate action for the evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRequest {
    pub request_name: String,
    pub service_type: ServiceType,
    pub status: String,
    /// Fields the candidate action is keyed on, in declaration order.
    pub key_fields: Vec<RecordField>,
    pub fields: BTreeMap<RecordField, String>,
}

impl ActionRequest {
    pub fn field(&self, field: RecordField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn missing_key_fields(&self) -> impl Iterator<Item = RecordField> + '_ {
        self.key_fields
            .iter()
            .copied()
            .filter(|field| !self.fields.contains_key(field))
    }
}
