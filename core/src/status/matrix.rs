use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ServiceType;

use SvAction::*;

/// Lifecycle status of a subscription version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SvStatus {
    Creating,
    NpacCreateFailure,
    Pending,
    Active,
    Canceled,
    CancelPending,
    Old,
    DisconnectPending,
    Conflict,
    DownloadFailedPartial,
    DownloadFailed,
}

impl SvStatus {
    pub const ALL: [SvStatus; 11] = [
        SvStatus::Creating,
        SvStatus::NpacCreateFailure,
        SvStatus::Pending,
        SvStatus::Active,
        SvStatus::Canceled,
        SvStatus::CancelPending,
        SvStatus::Old,
        SvStatus::DisconnectPending,
        SvStatus::Conflict,
        SvStatus::DownloadFailedPartial,
        SvStatus::DownloadFailed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SvStatus::Creating => "Creating",
            SvStatus::NpacCreateFailure => "NpacCreateFailure",
            SvStatus::Pending => "Pending",
            SvStatus::Active => "Active",
            SvStatus::Canceled => "Canceled",
            SvStatus::CancelPending => "CancelPending",
            SvStatus::Old => "Old",
            SvStatus::DisconnectPending => "DisconnectPending",
            SvStatus::Conflict => "Conflict",
            SvStatus::DownloadFailedPartial => "DownloadFailedPartial",
            SvStatus::DownloadFailed => "DownloadFailed",
        }
    }

    /// Case-insensitive; `-`, `_` and spaces between words are ignored, so
    /// `cancel-pending` and `CANCEL_PENDING` both name [`SvStatus::CancelPending`].
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' ' | '\t'))
            .collect();
        if normalized.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&normalized))
    }
}

impl fmt::Display for SvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SvAction {
    Create,
    Query,
    Cancel,
    Modify,
    Activate,
    ModifyActive,
    Disconnect,
    ModifyCancelPending,
    CancelAsNew,
    ModifyDisconnectPending,
    RemoveFromConflict,
    Release,
    ReleaseInConflict,
    CancelAsOld,
}

impl SvAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SvAction::Create => "Create",
            SvAction::Query => "Query",
            SvAction::Cancel => "Cancel",
            SvAction::Modify => "Modify",
            SvAction::Activate => "Activate",
            SvAction::ModifyActive => "ModifyActive",
            SvAction::Disconnect => "Disconnect",
            SvAction::ModifyCancelPending => "ModifyCancelPending",
            SvAction::CancelAsNew => "CancelAsNew",
            SvAction::ModifyDisconnectPending => "ModifyDisconnectPending",
            SvAction::RemoveFromConflict => "RemoveFromConflict",
            SvAction::Release => "Release",
            SvAction::ReleaseInConflict => "ReleaseInConflict",
            SvAction::CancelAsOld => "CancelAsOld",
        }
    }
}

impl fmt::Display for SvAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const NONE: &[SvAction] = &[];
const QUERY_ONLY: &[SvAction] = &[Query];
const CREATE_QUERY: &[SvAction] = &[Create, Query];

/// Status to allowed-action tables for the subscription-version service types.
pub struct StatusActionMatrix;

impl StatusActionMatrix {
    /// Actions allowed for `status`, in table order. Unknown statuses and
    /// rule-evaluated service types yield an empty slice.
    pub fn allowed_actions(service_type: ServiceType, status: &str) -> &'static [SvAction] {
        match SvStatus::parse(status) {
            Some(status) => Self::lookup(service_type, status),
            None => NONE,
        }
    }

    pub fn lookup(service_type: ServiceType, status: SvStatus) -> &'static [SvAction] {
        match service_type {
            ServiceType::PortIn => port_in(status),
            ServiceType::PortOut => port_out(status),
            ServiceType::IntraPort => intra_port(status),
            _ => NONE,
        }
    }
}

fn port_in(status: SvStatus) -> &'static [SvAction] {
    match status {
        SvStatus::Creating | SvStatus::NpacCreateFailure => CREATE_QUERY,
        SvStatus::Pending => &[Create, Cancel, Modify, Activate, Query],
        SvStatus::Active => &[ModifyActive, Disconnect, Query],
        SvStatus::Canceled => CREATE_QUERY,
        SvStatus::CancelPending => &[ModifyCancelPending, CancelAsNew, Query],
        SvStatus::Old => CREATE_QUERY,
        SvStatus::DisconnectPending => &[Cancel, ModifyDisconnectPending, Query],
        SvStatus::Conflict => &[Create, Cancel, Modify, RemoveFromConflict, Query],
        SvStatus::DownloadFailedPartial | SvStatus::DownloadFailed => QUERY_ONLY,
    }
}

fn port_out(status: SvStatus) -> &'static [SvAction] {
    match status {
        SvStatus::Pending => &[Release, ReleaseInConflict, Modify, Cancel, Query],
        SvStatus::Conflict => &[Cancel, Modify, RemoveFromConflict, Query],
        SvStatus::Canceled => &[Release, ReleaseInConflict, Query],
        SvStatus::CancelPending => &[ModifyCancelPending, CancelAsOld, Query],
        SvStatus::Creating | SvStatus::NpacCreateFailure => &[Release, ReleaseInConflict, Query],
        SvStatus::Old
        | SvStatus::DownloadFailed
        | SvStatus::DownloadFailedPartial
        | SvStatus::Active => QUERY_ONLY,
        SvStatus::DisconnectPending => NONE,
    }
}

fn intra_port(status: SvStatus) -> &'static [SvAction] {
    match status {
        SvStatus::Pending => &[Cancel, Activate, Modify, Query],
        SvStatus::Active => &[Disconnect, ModifyActive, Query],
        SvStatus::Canceled | SvStatus::Old => CREATE_QUERY,
        SvStatus::Creating | SvStatus::NpacCreateFailure => CREATE_QUERY,
        SvStatus::DownloadFailedPartial | SvStatus::DownloadFailed => QUERY_ONLY,
        SvStatus::DisconnectPending => &[Cancel, ModifyDisconnectPending, Query],
        SvStatus::CancelPending => &[Cancel, Query],
        SvStatus::Conflict => NONE,
    }
}
