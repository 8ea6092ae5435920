//! Runtime error types.

use std::io;

use ballot_kernel::error::{BallotError, EngineError};
use thiserror::Error;

use crate::snapshot_codec::SnapshotError;

/// Failure converting between wire and kernel command envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("command envelope {sequence} carries no command")]
    MissingCommand { sequence: u64 },

    #[error("command type {0:?} has no wire form")]
    UnsupportedCommand(String),

    #[error("malformed {command_type} payload: {reason}")]
    MalformedPayload {
        command_type: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("invalid config: {0}")]
    Config(String),

    /// Session ids name a single directory under the data dir.
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),

    #[error("vote {sequence} was accepted without a VoteCast")]
    MissingVoteCast { sequence: u64 },
}

impl RuntimeError {
    /// The ballot rejection behind this error, if it is one.
    pub fn as_ballot_error(&self) -> Option<BallotError> {
        match self {
            RuntimeError::Engine(e) => e.as_ballot_error(),
            _ => None,
        }
    }
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
