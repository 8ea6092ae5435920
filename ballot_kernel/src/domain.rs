/// Ballot kernel v1: Core Domain Types
///
/// Plain data plus read-only accessors. All mutation lives in
/// `transitions`, all validation in `invariants`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BallotError;

/// Ordinal index of a candidate, assigned at construction in input order.
pub type CandidateId = u64;

// ── Identities ─────────────────────────────────────────────────────

/// Opaque caller identity. Whatever the host asserts is taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Entities ───────────────────────────────────────────────────────

/// A named candidate and its running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub vote_count: u64,
}

impl Candidate {
    pub fn new(id: CandidateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count: 0,
        }
    }
}

/// Per-identity voting record. The default value is the record of an
/// identity the ballot has never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Voter {
    pub registered: bool,
    pub has_voted: bool,
    /// `Some` exactly when `has_voted` is true.
    pub voted_candidate_id: Option<CandidateId>,
}

/// Notification emitted for every accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub candidate_id: CandidateId,
}

/// Outcome of a successfully applied command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub command_type: String,
    pub sequence: u64,
    pub notifications: Vec<VoteCast>,
}

// ── Ballot state ───────────────────────────────────────────────────

/// Complete ballot: administrator, fixed candidate list, voter registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallotState {
    pub(crate) admin: Identity,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) voters: BTreeMap<Identity, Voter>,
}

impl BallotState {
    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn total_candidates(&self) -> u64 {
        self.candidates.len() as u64
    }

    /// Snapshot of a single candidate.
    pub fn candidate(&self, candidate_id: CandidateId) -> Result<Candidate, BallotError> {
        let idx = self.candidate_index(candidate_id)?;
        Ok(self.candidates[idx].clone())
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Voter record for `identity`; unseen identities read as `Voter::default()`.
    pub fn voter(&self, identity: &Identity) -> Voter {
        self.voters.get(identity).copied().unwrap_or_default()
    }

    /// Every identity the ballot holds a record for, sorted by identity.
    pub fn voters(&self) -> impl Iterator<Item = (&Identity, &Voter)> {
        self.voters.iter()
    }

    /// Position of `candidate_id` in the candidate list, if it names one.
    pub(crate) fn candidate_index(&self, candidate_id: CandidateId) -> Result<usize, BallotError> {
        usize::try_from(candidate_id)
            .ok()
            .filter(|idx| *idx < self.candidates.len())
            .ok_or(BallotError::InvalidCandidate)
    }
}
