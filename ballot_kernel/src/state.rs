/// Ballot kernel v1: State Construction

use std::collections::BTreeMap;

use crate::domain::{BallotState, Candidate, Identity};

/// Create a fresh ballot. One candidate per name, in input order;
/// duplicates are kept as independent candidates. An empty list is valid.
pub fn create_initial_state<S: AsRef<str>>(candidate_names: &[S], admin: Identity) -> BallotState {
    let candidates = candidate_names
        .iter()
        .enumerate()
        .map(|(idx, name)| Candidate::new(idx as u64, name.as_ref()))
        .collect();

    BallotState {
        admin,
        candidates,
        voters: BTreeMap::new(),
    }
}

impl BallotState {
    /// Construct a ballot administered by `admin`.
    pub fn new<S: AsRef<str>>(candidate_names: &[S], admin: impl Into<Identity>) -> Self {
        create_initial_state(candidate_names, admin.into())
    }
}
