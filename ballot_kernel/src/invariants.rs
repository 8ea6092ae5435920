/// Ballot kernel v1: Invariant Checks
///
/// Two families:
///   - state checks, which hold for any reachable ballot;
///   - transition checks, which compare the ballot before and after a
///     command and reject anything that is not monotonic.
///
/// `validate_*` panics (a failure there is a kernel bug);
/// `try_validate_*` returns `Err(message)` for untrusted input such as
/// restored snapshots.

use std::collections::BTreeMap;

use crate::domain::{BallotState, CandidateId};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every state check. Panics on the first failure.
pub fn validate_invariants(state: &BallotState) {
    if let Err(msg) = try_validate_invariants(state) {
        panic!("Invariant violation: {}", msg);
    }
}

/// Run every transition check. Panics on the first failure.
pub fn validate_transition(before: &BallotState, after: &BallotState) {
    if let Err(msg) = try_validate_transition(before, after) {
        panic!("Invariant violation: {}", msg);
    }
}

/// Non-panicking variant of `validate_invariants`.
pub fn try_validate_invariants(state: &BallotState) -> Result<(), String> {
    check_candidate_ids(state)?;
    check_vote_records(state)?;
    check_tallies(state)?;
    Ok(())
}

/// Non-panicking variant of `validate_transition`.
pub fn try_validate_transition(before: &BallotState, after: &BallotState) -> Result<(), String> {
    check_admin_fixed(before, after)?;
    check_candidates_fixed(before, after)?;
    check_voters_monotonic(before, after)?;
    check_counts_monotonic(before, after)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// State checks (private)
// ---------------------------------------------------------------------------

/// Candidate ids are their positions.
fn check_candidate_ids(state: &BallotState) -> Result<(), String> {
    for (idx, c) in state.candidates.iter().enumerate() {
        if c.id != idx as CandidateId {
            return Err(format!(
                "[INVARIANT:candidate_ids] Candidate at position {} has id {}",
                idx, c.id
            ));
        }
    }
    Ok(())
}

/// A vote implies registration, a recorded choice, and a choice in range.
fn check_vote_records(state: &BallotState) -> Result<(), String> {
    let total = state.total_candidates();
    for (identity, voter) in &state.voters {
        if voter.has_voted != voter.voted_candidate_id.is_some() {
            return Err(format!(
                "[INVARIANT:vote_record] Voter {:?} has has_voted={} but choice {:?}",
                identity.as_str(),
                voter.has_voted,
                voter.voted_candidate_id
            ));
        }
        if voter.has_voted && !voter.registered {
            return Err(format!(
                "[INVARIANT:vote_record] Voter {:?} voted without being registered",
                identity.as_str()
            ));
        }
        if let Some(choice) = voter.voted_candidate_id {
            if choice >= total {
                return Err(format!(
                    "[INVARIANT:vote_record] Voter {:?} chose candidate {} of {}",
                    identity.as_str(),
                    choice,
                    total
                ));
            }
        }
    }
    Ok(())
}

/// Each tally equals the number of voters that chose the candidate.
fn check_tallies(state: &BallotState) -> Result<(), String> {
    let mut expected: BTreeMap<CandidateId, u64> = BTreeMap::new();
    for voter in state.voters.values() {
        if let Some(choice) = voter.voted_candidate_id {
            *expected.entry(choice).or_default() += 1;
        }
    }
    for c in &state.candidates {
        let want = expected.get(&c.id).copied().unwrap_or(0);
        if c.vote_count != want {
            return Err(format!(
                "[INVARIANT:tally] Candidate {} ({:?}) has {} votes, voters recorded {}",
                c.id, c.name, c.vote_count, want
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transition checks (private)
// ---------------------------------------------------------------------------

fn check_admin_fixed(before: &BallotState, after: &BallotState) -> Result<(), String> {
    if before.admin != after.admin {
        return Err(format!(
            "[INVARIANT:admin_fixed] Administrator changed from {:?} to {:?}",
            before.admin.as_str(),
            after.admin.as_str()
        ));
    }
    Ok(())
}

fn check_candidates_fixed(before: &BallotState, after: &BallotState) -> Result<(), String> {
    if before.candidates.len() != after.candidates.len() {
        return Err(format!(
            "[INVARIANT:candidates_fixed] Candidate count changed from {} to {}",
            before.candidates.len(),
            after.candidates.len()
        ));
    }
    for (a, b) in before.candidates.iter().zip(&after.candidates) {
        if a.id != b.id || a.name != b.name {
            return Err(format!(
                "[INVARIANT:candidates_fixed] Candidate {} ({:?}) became {} ({:?})",
                a.id, a.name, b.id, b.name
            ));
        }
    }
    Ok(())
}

/// Records never disappear, flags never revert, choices never change.
fn check_voters_monotonic(before: &BallotState, after: &BallotState) -> Result<(), String> {
    for (identity, old) in &before.voters {
        let new = match after.voters.get(identity) {
            Some(v) => v,
            None => {
                return Err(format!(
                    "[INVARIANT:voter_monotonic] Voter {:?} disappeared",
                    identity.as_str()
                ))
            }
        };
        if old.registered && !new.registered {
            return Err(format!(
                "[INVARIANT:voter_monotonic] Voter {:?} was unregistered",
                identity.as_str()
            ));
        }
        if old.has_voted && (!new.has_voted || new.voted_candidate_id != old.voted_candidate_id) {
            return Err(format!(
                "[INVARIANT:voter_monotonic] Voter {:?} changed recorded vote {:?} to {:?}",
                identity.as_str(),
                old.voted_candidate_id,
                new.voted_candidate_id
            ));
        }
    }
    Ok(())
}

fn check_counts_monotonic(before: &BallotState, after: &BallotState) -> Result<(), String> {
    for (a, b) in before.candidates.iter().zip(&after.candidates) {
        if b.vote_count < a.vote_count {
            return Err(format!(
                "[INVARIANT:count_monotonic] Candidate {} dropped from {} to {} votes",
                a.id, a.vote_count, b.vote_count
            ));
        }
    }
    Ok(())
}
