/// Ballot kernel v1: Command Definitions
///
/// Commands are pure data: the caller identity plus a JSON payload.
/// They contain ZERO transition logic.
///
/// Schema version is locked at 1. Envelopes with any other
/// schema_version are rejected by the engine.

use serde_json::{json, Value};

use crate::domain::{CandidateId, Identity};

/// Schema version for v1 kernel commands.
pub const SCHEMA_VERSION: u32 = 1;

pub const INITIALIZE: &str = "initialize";
pub const REGISTER_VOTER: &str = "register_voter";
pub const VOTE: &str = "vote";

/// A single mutating call against the ballot.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    pub command_type: String,
    pub sequence: u64,
    pub caller: Identity,
    pub payload: Value,
    pub schema_version: u32,
}

impl CommandEnvelope {
    /// `initialize` with the caller as administrator.
    pub fn initialize<S: AsRef<str>>(sequence: u64, caller: impl Into<Identity>, names: &[S]) -> Self {
        Self::new(
            INITIALIZE,
            sequence,
            caller.into(),
            json!({ "candidate_names": name_list(names) }),
        )
    }

    /// `initialize` naming an administrator other than the caller.
    pub fn initialize_with_admin<S: AsRef<str>>(
        sequence: u64,
        caller: impl Into<Identity>,
        admin: impl Into<Identity>,
        names: &[S],
    ) -> Self {
        let admin: Identity = admin.into();
        Self::new(
            INITIALIZE,
            sequence,
            caller.into(),
            json!({ "candidate_names": name_list(names), "admin": admin.as_str() }),
        )
    }

    pub fn register_voter(
        sequence: u64,
        caller: impl Into<Identity>,
        voter: impl Into<Identity>,
    ) -> Self {
        let voter: Identity = voter.into();
        Self::new(
            REGISTER_VOTER,
            sequence,
            caller.into(),
            json!({ "voter": voter.as_str() }),
        )
    }

    pub fn vote(sequence: u64, caller: impl Into<Identity>, candidate_id: CandidateId) -> Self {
        Self::new(
            VOTE,
            sequence,
            caller.into(),
            json!({ "candidate_id": candidate_id }),
        )
    }

    /// `vote` with a raw signed index, as it may arrive over the wire.
    pub fn vote_raw(sequence: u64, caller: impl Into<Identity>, candidate_id: i64) -> Self {
        Self::new(
            VOTE,
            sequence,
            caller.into(),
            json!({ "candidate_id": candidate_id }),
        )
    }

    fn new(command_type: &str, sequence: u64, caller: Identity, payload: Value) -> Self {
        Self {
            command_type: command_type.to_string(),
            sequence,
            caller,
            payload,
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Convert to a serde_json::Value (fixture and history format).
    pub fn to_value(&self) -> Value {
        json!({
            "command_type": self.command_type,
            "sequence": self.sequence,
            "caller": self.caller.as_str(),
            "payload": self.payload,
            "schema_version": self.schema_version,
        })
    }

    /// Parse a CommandEnvelope from a serde_json::Value (fixture format).
    /// A missing schema_version is read as the current one.
    pub fn from_value(v: &Value) -> Self {
        Self {
            command_type: v["command_type"].as_str().unwrap_or("").to_string(),
            sequence: v["sequence"].as_u64().unwrap_or(0),
            caller: Identity::new(v["caller"].as_str().unwrap_or("")),
            payload: v["payload"].clone(),
            schema_version: v
                .get("schema_version")
                .and_then(|v| v.as_u64())
                .unwrap_or(SCHEMA_VERSION as u64) as u32,
        }
    }
}

fn name_list<S: AsRef<str>>(names: &[S]) -> Vec<&str> {
    names.iter().map(|n| n.as_ref()).collect()
}
