/// Ballot kernel v1: Error Types
///
/// `BallotError` is a caller contract violation detected before any
/// mutation. `EngineError` adds the envelope-level rejections of the
/// command engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection of a ballot operation. Never retriable, never partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BallotError {
    #[error("Only admin can call this function")]
    AccessDenied,
    #[error("Voter is already registered")]
    AlreadyRegistered,
    #[error("Voter is not registered")]
    NotRegistered,
    #[error("You have already voted")]
    AlreadyVoted,
    #[error("Invalid candidate ID")]
    InvalidCandidate,
}

/// Rejection of a command envelope by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] BallotError),

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },

    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("first command must be initialize, got {0:?}")]
    NotInitialized(String),

    #[error("initialize can only be the first command")]
    AlreadyInitialized,

    #[error("unknown command type: {0:?}")]
    UnknownCommand(String),

    #[error("malformed {command_type} payload: {reason}")]
    MalformedPayload {
        command_type: String,
        reason: String,
    },

    #[error("ballot has not been initialized")]
    Uninitialized,
}

impl EngineError {
    /// The ballot rejection behind this error, if it is one.
    pub fn as_ballot_error(&self) -> Option<BallotError> {
        match self {
            EngineError::Rejected(e) => Some(*e),
            _ => None,
        }
    }
}
