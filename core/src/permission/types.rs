use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{RecordField, RecordFields};

/// De-duplicated permission codes of one (user, customer) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    codes: BTreeSet<String>,
}

impl PermissionSet {
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(|code| code.as_ref().trim().to_string())
                .filter(|code| !code.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

fn default_universal_code() -> String {
    "1".to_string()
}

fn default_secondary_universal_code() -> String {
    "2".to_string()
}

fn default_rule_primary_code() -> String {
    "41".to_string()
}

fn default_rule_secondary_code() -> String {
    "35".to_string()
}

fn default_audit_code() -> String {
    "44".to_string()
}

fn default_port_code() -> String {
    "36".to_string()
}

/// Permission codes consulted by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    #[serde(default = "default_universal_code")]
    pub universal_code: String,
    #[serde(default = "default_secondary_universal_code")]
    pub secondary_universal_code: String,
    /// Rule-evaluated types other than Audit need this and `rule_secondary_code`.
    #[serde(default = "default_rule_primary_code")]
    pub rule_primary_code: String,
    #[serde(default = "default_rule_secondary_code")]
    pub rule_secondary_code: String,
    #[serde(default = "default_audit_code")]
    pub audit_code: String,
    #[serde(default = "default_port_code")]
    pub port_code: String,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            universal_code: default_universal_code(),
            secondary_universal_code: default_secondary_universal_code(),
            rule_primary_code: default_rule_primary_code(),
            rule_secondary_code: default_rule_secondary_code(),
            audit_code: default_audit_code(),
            port_code: default_port_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LrnOwnershipKey {
    pub lrn: String,
    pub region_id: String,
    pub spid: String,
}

impl LrnOwnershipKey {
    /// `None` unless the record carries all of LRN, region and SPID.
    pub fn from_fields(fields: &RecordFields) -> Option<Self> {
        Some(Self {
            lrn: fields.get(RecordField::Lrn)?.to_string(),
            region_id: fields.get(RecordField::RegionId)?.to_string(),
            spid: fields.get(RecordField::Spid)?.to_string(),
        })
    }
}
