use serde::{Deserialize, Serialize};

use crate::types::{ActionName, Caller, RecordDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    AllowedActions {
        request_id: String,
        caller: Caller,
        record: RecordDocument,
    },
    FlushEvaluatorCache,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AllowedActions {
        request_id: String,
        actions: Vec<ActionName>,
    },
    EvaluatorCacheFlushed {
        entries: usize,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("'{kind}' message requires field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("'{kind}' message does not accept field '{field}'")]
    UnexpectedField {
        kind: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: WireMessageType,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    caller: Option<Caller>,
    #[serde(default)]
    record: Option<RecordDocument>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireMessageType {
    AllowedActions,
    FlushEvaluatorCache,
    Exit,
}

impl WireMessageType {
    fn as_str(self) -> &'static str {
        match self {
            WireMessageType::AllowedActions => "allowed_actions",
            WireMessageType::FlushEvaluatorCache => "flush_evaluator_cache",
            WireMessageType::Exit => "exit",
        }
    }
}

impl WireMessage {
    fn reject_payload(&self) -> Result<(), ProtocolError> {
        let kind = self.kind.as_str();
        let present = [
            ("request_id", self.request_id.is_some()),
            ("caller", self.caller.is_some()),
            ("record", self.record.is_some()),
        ];
        match present.into_iter().find(|(_, is_present)| *is_present) {
            Some((field, _)) => Err(ProtocolError::UnexpectedField { kind, field }),
            None => Ok(()),
        }
    }
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, ProtocolError> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let kind = wire.kind.as_str();
    let message = match wire.kind {
        WireMessageType::AllowedActions => ClientMessage::AllowedActions {
            request_id: wire.request_id.ok_or(ProtocolError::MissingField {
                kind,
                field: "request_id",
            })?,
            caller: wire.caller.ok_or(ProtocolError::MissingField {
                kind,
                field: "caller",
            })?,
            record: wire.record.ok_or(ProtocolError::MissingField {
                kind,
                field: "record",
            })?,
        },
        WireMessageType::FlushEvaluatorCache => {
            wire.reject_payload()?;
            ClientMessage::FlushEvaluatorCache
        }
        WireMessageType::Exit => {
            wire.reject_payload()?;
            ClientMessage::Exit
        }
    };
    Ok(message)
}

/// One NDJSON line, newline included.
pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
