//! Drift detection: determinism verification and tally comparison.
//!
//! All counts are integers. No float arithmetic anywhere.

use std::collections::BTreeSet;

use ballot_kernel::domain::{BallotState, CandidateId, Identity};
use ballot_kernel::error::EngineError;
use ballot_kernel::events::CommandEnvelope;
use thiserror::Error;
use tracing::error;

use crate::replay;

/// Replaying the same commands twice produced different hashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("determinism failure: replay 1 = {first}, replay 2 = {second}")]
pub struct DeterminismFailure {
    pub first: String,
    pub second: String,
}

/// Verify determinism by replaying the same commands twice and
/// comparing hashes. Returns the hash on success.
pub fn verify_determinism(commands: &[CommandEnvelope]) -> Result<String, DriftError> {
    let first = replay::rebuild_hash(commands)?;
    let second = replay::rebuild_hash(commands)?;

    if first != second {
        error!(%first, %second, "replay is not deterministic");
        return Err(DeterminismFailure { first, second }.into());
    }
    Ok(first)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriftError {
    #[error(transparent)]
    Replay(#[from] EngineError),

    #[error(transparent)]
    Nondeterministic(#[from] DeterminismFailure),
}

/// Vote count movement for one candidate between two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDelta {
    pub id: CandidateId,
    pub name: String,
    pub votes_a: u64,
    pub votes_b: u64,
}

impl CandidateDelta {
    /// Signed change, wide enough for any pair of `u64` counts.
    pub fn delta(&self) -> i128 {
        i128::from(self.votes_b) - i128::from(self.votes_a)
    }
}

/// Structured comparison of two ballot states, `a` before `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyReport {
    pub candidate_count_a: u64,
    pub candidate_count_b: u64,
    pub total_votes_a: u64,
    pub total_votes_b: u64,
    /// Candidates whose count differs, in id order.
    pub changed_candidates: Vec<CandidateDelta>,
    pub newly_registered: Vec<Identity>,
    pub newly_voted: Vec<Identity>,
}

impl TallyReport {
    pub fn total_votes_delta(&self) -> i128 {
        i128::from(self.total_votes_b) - i128::from(self.total_votes_a)
    }

    pub fn is_unchanged(&self) -> bool {
        self.candidate_count_a == self.candidate_count_b
            && self.changed_candidates.is_empty()
            && self.newly_registered.is_empty()
            && self.newly_voted.is_empty()
    }
}

fn total_votes(state: &BallotState) -> u64 {
    state.candidates().iter().map(|c| c.vote_count).sum()
}

fn voters_where(state: &BallotState, pred: impl Fn(bool, bool) -> bool) -> BTreeSet<&Identity> {
    state
        .voters()
        .filter(|(_, v)| pred(v.registered, v.has_voted))
        .map(|(id, _)| id)
        .collect()
}

/// Compare two ballot states. Candidates present only in `b` count
/// from zero in `a`.
pub fn compare_states(state_a: &BallotState, state_b: &BallotState) -> TallyReport {
    let changed_candidates = state_b
        .candidates()
        .iter()
        .filter_map(|cb| {
            let votes_a = state_a.candidate(cb.id).map(|ca| ca.vote_count).unwrap_or(0);
            (votes_a != cb.vote_count).then(|| CandidateDelta {
                id: cb.id,
                name: cb.name.clone(),
                votes_a,
                votes_b: cb.vote_count,
            })
        })
        .collect();

    let registered_a = voters_where(state_a, |registered, _| registered);
    let registered_b = voters_where(state_b, |registered, _| registered);
    let voted_a = voters_where(state_a, |_, voted| voted);
    let voted_b = voters_where(state_b, |_, voted| voted);

    TallyReport {
        candidate_count_a: state_a.total_candidates(),
        candidate_count_b: state_b.total_candidates(),
        total_votes_a: total_votes(state_a),
        total_votes_b: total_votes(state_b),
        changed_candidates,
        newly_registered: registered_b.difference(&registered_a).map(|id| (*id).clone()).collect(),
        newly_voted: voted_b.difference(&voted_a).map(|id| (*id).clone()).collect(),
    }
}
