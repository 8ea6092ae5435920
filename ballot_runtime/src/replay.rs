//! Replay orchestrator: rebuild the ballot from its command log.
//!
//! Delegates every decision to the kernel. No shortcuts, no cached state.

use ballot_kernel::domain::BallotState;
use ballot_kernel::engine::BallotEngine;
use ballot_kernel::error::EngineError;
use ballot_kernel::events::CommandEnvelope;
use ballot_kernel::hashing::canonical_hash;

use crate::error::Result;
use crate::proto_bridge::proto_to_kernel;
use crate::proto_types::ProtoCommandEnvelope;

/// Rebuild the ballot from a sequence of commands.
///
/// Returns `(final_state, canonical_hash)`. Deterministic by the
/// kernel's guarantee.
pub fn rebuild_state(commands: &[CommandEnvelope]) -> Result<(BallotState, String), EngineError> {
    let mut engine = BallotEngine::new();
    let state = engine.replay(commands)?.clone();
    let hash = canonical_hash(&state);
    Ok((state, hash))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(commands: &[CommandEnvelope]) -> Result<String, EngineError> {
    rebuild_state(commands).map(|(_, hash)| hash)
}

/// Decode log frames into kernel commands.
pub fn decode_log(frames: &[ProtoCommandEnvelope]) -> Result<Vec<CommandEnvelope>> {
    frames
        .iter()
        .map(|f| proto_to_kernel(f).map_err(Into::into))
        .collect()
}
