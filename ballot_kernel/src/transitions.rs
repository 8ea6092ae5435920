/// Ballot kernel v1: Centralized Transition Logic
///
/// ALL state-mutation logic lives here. Every operation checks all of
/// its preconditions before touching state, so a rejected call leaves
/// the ballot exactly as it was.

use serde_json::Value;

use crate::domain::{BallotState, CandidateId, Identity, TransitionResult, VoteCast};
use crate::error::{BallotError, EngineError};
use crate::events::{CommandEnvelope, INITIALIZE, REGISTER_VOTER, VOTE};
use crate::state::create_initial_state;

// ---------------------------------------------------------------------------
// Ballot operations
// ---------------------------------------------------------------------------

impl BallotState {
    /// Mark `target` as registered. Admin only; never registers twice.
    pub fn register_voter(&mut self, caller: &Identity, target: &Identity) -> Result<(), BallotError> {
        if caller != &self.admin {
            return Err(BallotError::AccessDenied);
        }
        if self.voter(target).registered {
            return Err(BallotError::AlreadyRegistered);
        }

        self.voters.entry(target.clone()).or_default().registered = true;
        Ok(())
    }

    /// Record `caller`'s single vote for `candidate_id`.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// registration, then double voting, then the candidate range.
    pub fn vote(&mut self, caller: &Identity, candidate_id: CandidateId) -> Result<VoteCast, BallotError> {
        self.cast_vote(caller, Some(candidate_id))
    }

    /// `candidate_id == None` stands for an index no candidate can have
    /// (negative or wider than u64 on the wire).
    pub(crate) fn cast_vote(
        &mut self,
        caller: &Identity,
        candidate_id: Option<CandidateId>,
    ) -> Result<VoteCast, BallotError> {
        let voter = self.voter(caller);
        if !voter.registered {
            return Err(BallotError::NotRegistered);
        }
        if voter.has_voted {
            return Err(BallotError::AlreadyVoted);
        }
        let candidate_id = candidate_id.ok_or(BallotError::InvalidCandidate)?;
        let idx = self.candidate_index(candidate_id)?;

        let record = self.voters.entry(caller.clone()).or_default();
        record.has_voted = true;
        record.voted_candidate_id = Some(candidate_id);
        self.candidates[idx].vote_count += 1;

        Ok(VoteCast { candidate_id })
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Build the initial ballot from an `initialize` command.
/// The payload's `admin` wins over the caller when present.
pub fn initial_state(command: &CommandEnvelope) -> Result<BallotState, EngineError> {
    if command.command_type != INITIALIZE {
        return Err(EngineError::NotInitialized(command.command_type.clone()));
    }
    let p = &command.payload;

    let names = p
        .get("candidate_names")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(command, "missing 'candidate_names' array"))?;
    let names = names
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| malformed(command, "candidate names must be strings"))
        })
        .collect::<Result<Vec<&str>, _>>()?;

    let admin = match p.get("admin") {
        None | Some(Value::Null) => command.caller.clone(),
        Some(v) => Identity::new(
            v.as_str()
                .ok_or_else(|| malformed(command, "'admin' must be a string"))?,
        ),
    };

    Ok(create_initial_state(&names, admin))
}

/// Apply a post-initialization command to `state` and return
/// `(new_state, result)`. The input state is never mutated; a clone is
/// made first and dropped on rejection.
pub fn apply_command(
    state: &BallotState,
    command: &CommandEnvelope,
) -> Result<(BallotState, TransitionResult), EngineError> {
    let mut new_state = state.clone();
    let mut notifications = Vec::new();

    match command.command_type.as_str() {
        REGISTER_VOTER => {
            let voter = command
                .payload
                .get("voter")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(command, "missing 'voter'"))?;
            new_state.register_voter(&command.caller, &Identity::new(voter))?;
        }
        VOTE => {
            let candidate_id = parse_candidate_id(command)?;
            notifications.push(new_state.cast_vote(&command.caller, candidate_id)?);
        }
        INITIALIZE => return Err(EngineError::AlreadyInitialized),
        other => return Err(EngineError::UnknownCommand(other.to_string())),
    }

    let result = TransitionResult {
        command_type: command.command_type.clone(),
        sequence: command.sequence,
        notifications,
    };
    Ok((new_state, result))
}

// ---------------------------------------------------------------------------
// Helpers (private)
// ---------------------------------------------------------------------------

/// Any JSON number is a candidate reference; those outside u64 map to None.
fn parse_candidate_id(command: &CommandEnvelope) -> Result<Option<CandidateId>, EngineError> {
    match command.payload.get("candidate_id") {
        Some(Value::Number(n)) => Ok(n.as_u64()),
        _ => Err(malformed(command, "missing numeric 'candidate_id'")),
    }
}

fn malformed(command: &CommandEnvelope, reason: &str) -> EngineError {
    EngineError::MalformedPayload {
        command_type: command.command_type.clone(),
        reason: reason.to_string(),
    }
}
