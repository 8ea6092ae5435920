//! Hand-written protobuf types for the command log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are frozen: never renumber, only append.

use prost::Message;

// ── Command Envelope ───────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommandEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(string, tag = "2")]
    pub caller: String,
    #[prost(uint32, tag = "3")]
    pub schema_version: u32,
    #[prost(message, optional, tag = "4")]
    pub command: Option<ProtoCommand>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommand {
    #[prost(oneof = "CommandKind", tags = "1, 2, 3")]
    pub kind: Option<CommandKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum CommandKind {
    #[prost(message, tag = "1")]
    Initialize(Initialize),
    #[prost(message, tag = "2")]
    RegisterVoter(RegisterVoter),
    #[prost(message, tag = "3")]
    Vote(Vote),
}

// ── Command Types ──────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct Initialize {
    #[prost(string, repeated, tag = "1")]
    pub candidate_names: Vec<String>,
    /// Absent means the caller is the administrator.
    #[prost(string, optional, tag = "2")]
    pub admin: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct RegisterVoter {
    #[prost(string, tag = "1")]
    pub voter: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Vote {
    /// Signed so out-of-range wire values survive the log unchanged.
    #[prost(sint64, tag = "1")]
    pub candidate_id: i64,
}
