//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between protobuf wire types (proto_types.rs) and the
//! kernel's CommandEnvelope (which uses serde_json::Value payloads).
//!
//! The JSON payload built here must match exactly what the kernel's
//! transitions.rs reads.

use ballot_kernel::events::{CommandEnvelope, INITIALIZE, REGISTER_VOTER, VOTE};
use ballot_kernel::domain::Identity;
use serde_json::{json, Value};

use crate::error::BridgeError;
use crate::proto_types::*;

/// Convert a protobuf envelope read from the log into a kernel command.
pub fn proto_to_kernel(proto: &ProtoCommandEnvelope) -> Result<CommandEnvelope, BridgeError> {
    let kind = proto
        .command
        .as_ref()
        .and_then(|c| c.kind.as_ref())
        .ok_or(BridgeError::MissingCommand {
            sequence: proto.sequence,
        })?;

    let (command_type, payload) = match kind {
        CommandKind::Initialize(init) => {
            let mut payload = json!({ "candidate_names": init.candidate_names });
            if let Some(admin) = &init.admin {
                payload["admin"] = Value::String(admin.clone());
            }
            (INITIALIZE, payload)
        }
        CommandKind::RegisterVoter(rv) => (REGISTER_VOTER, json!({ "voter": rv.voter })),
        CommandKind::Vote(v) => (VOTE, json!({ "candidate_id": v.candidate_id })),
    };

    Ok(CommandEnvelope {
        command_type: command_type.to_string(),
        sequence: proto.sequence,
        caller: Identity::new(proto.caller.clone()),
        payload,
        schema_version: proto.schema_version,
    })
}

/// Convert a kernel command to its protobuf form for the append-only log.
pub fn kernel_to_proto(kernel: &CommandEnvelope) -> Result<ProtoCommandEnvelope, BridgeError> {
    let p = &kernel.payload;
    let kind = match kernel.command_type.as_str() {
        INITIALIZE => {
            let candidate_names = p
                .get("candidate_names")
                .and_then(Value::as_array)
                .ok_or_else(|| malformed(kernel, "missing 'candidate_names' array"))?
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| malformed(kernel, "candidate names must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let admin = p.get("admin").and_then(Value::as_str).map(str::to_string);
            CommandKind::Initialize(Initialize {
                candidate_names,
                admin,
            })
        }
        REGISTER_VOTER => CommandKind::RegisterVoter(RegisterVoter {
            voter: p
                .get("voter")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(kernel, "missing 'voter'"))?
                .to_string(),
        }),
        VOTE => CommandKind::Vote(Vote {
            candidate_id: p
                .get("candidate_id")
                .and_then(Value::as_i64)
                .ok_or_else(|| malformed(kernel, "'candidate_id' must fit in i64"))?,
        }),
        other => return Err(BridgeError::UnsupportedCommand(other.to_string())),
    };

    Ok(ProtoCommandEnvelope {
        sequence: kernel.sequence,
        caller: kernel.caller.to_string(),
        schema_version: kernel.schema_version,
        command: Some(ProtoCommand { kind: Some(kind) }),
    })
}

fn malformed(kernel: &CommandEnvelope, reason: &str) -> BridgeError {
    BridgeError::MalformedPayload {
        command_type: kernel.command_type.clone(),
        reason: reason.to_string(),
    }
}
