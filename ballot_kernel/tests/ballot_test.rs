//! Behavioral tests for the ballot and the command engine.

use ballot_kernel::domain::{BallotState, Candidate, Identity, VoteCast, Voter};
use ballot_kernel::engine::BallotEngine;
use ballot_kernel::error::{BallotError, EngineError};
use ballot_kernel::events::CommandEnvelope;

const NAMES: [&str; 3] = ["Alice", "Bob", "Charlie"];

fn id(s: &str) -> Identity {
    Identity::from(s)
}

fn ballot() -> BallotState {
    BallotState::new(&NAMES, "admin")
}

// ─────────────────────────────────────────────────────────────
// BallotState
// ─────────────────────────────────────────────────────────────

#[test]
fn construction_initializes_candidates() {
    let state = ballot();
    assert_eq!(state.total_candidates(), NAMES.len() as u64);
    for (i, name) in NAMES.iter().enumerate() {
        assert_eq!(
            state.candidate(i as u64).unwrap(),
            Candidate {
                id: i as u64,
                name: name.to_string(),
                vote_count: 0,
            }
        );
    }
    assert_eq!(state.admin(), &id("admin"));
}

#[test]
fn duplicate_names_are_kept() {
    let state = BallotState::new(&["Alice", "Alice"], "admin");
    assert_eq!(state.total_candidates(), 2);
    assert_eq!(state.candidate(0).unwrap().name, "Alice");
    assert_eq!(state.candidate(1).unwrap().name, "Alice");
    assert_eq!(state.candidate(1).unwrap().id, 1);
}

#[test]
fn admin_registers_voter() {
    let mut state = ballot();
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    assert!(state.voter(&id("voter1")).registered);
    assert!(!state.voter(&id("voter1")).has_voted);
}

#[test]
fn non_admin_cannot_register() {
    let mut state = ballot();
    for caller in ["voter1", "voter2", "", "ADMIN"] {
        let err = state.register_voter(&id(caller), &id("voter2")).unwrap_err();
        assert_eq!(err, BallotError::AccessDenied);
        assert_eq!(err.to_string(), "Only admin can call this function");
    }
    assert!(!state.voter(&id("voter2")).registered);
}

#[test]
fn double_registration_is_rejected() {
    let mut state = ballot();
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    let err = state.register_voter(&id("admin"), &id("voter1")).unwrap_err();
    assert_eq!(err, BallotError::AlreadyRegistered);
    assert_eq!(err.to_string(), "Voter is already registered");
    assert!(state.voter(&id("voter1")).registered);
}

#[test]
fn votes_update_counts() {
    let mut state = ballot();
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    state.register_voter(&id("admin"), &id("voter2")).unwrap();

    assert_eq!(state.vote(&id("voter1"), 0), Ok(VoteCast { candidate_id: 0 }));
    assert_eq!(state.candidate(0).unwrap().vote_count, 1);

    assert_eq!(state.vote(&id("voter2"), 1), Ok(VoteCast { candidate_id: 1 }));
    assert_eq!(state.candidate(0).unwrap().vote_count, 1);
    assert_eq!(state.candidate(1).unwrap().vote_count, 1);
    assert_eq!(state.candidate(2).unwrap().vote_count, 0);

    assert_eq!(
        state.voter(&id("voter1")),
        Voter {
            registered: true,
            has_voted: true,
            voted_candidate_id: Some(0),
        }
    );
}

#[test]
fn multiple_votes_for_one_candidate() {
    let mut state = ballot();
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    state.register_voter(&id("admin"), &id("voter2")).unwrap();
    state.vote(&id("voter1"), 0).unwrap();
    state.vote(&id("voter2"), 0).unwrap();

    assert_eq!(state.candidate(0).unwrap().vote_count, 2);
    assert_eq!(state.candidate(1).unwrap().vote_count, 0);
    assert_eq!(state.candidate(2).unwrap().vote_count, 0);
}

#[test]
fn double_vote_is_rejected() {
    let mut state = ballot();
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    state.vote(&id("voter1"), 0).unwrap();

    let err = state.vote(&id("voter1"), 1).unwrap_err();
    assert_eq!(err, BallotError::AlreadyVoted);
    assert_eq!(err.to_string(), "You have already voted");
    assert_eq!(state.voter(&id("voter1")).voted_candidate_id, Some(0));
    assert_eq!(state.candidate(1).unwrap().vote_count, 0);
}

#[test]
fn unregistered_caller_cannot_vote() {
    let mut state = ballot();
    // the admin is not implicitly a voter
    let err = state.vote(&id("admin"), 0).unwrap_err();
    assert_eq!(err, BallotError::NotRegistered);
    assert_eq!(err.to_string(), "Voter is not registered");
}

#[test]
fn out_of_range_candidate_is_rejected() {
    let mut state = ballot();
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    for bad in [999, NAMES.len() as u64, u64::MAX] {
        let err = state.vote(&id("voter1"), bad).unwrap_err();
        assert_eq!(err, BallotError::InvalidCandidate);
        assert_eq!(err.to_string(), "Invalid candidate ID");
    }
    assert!(!state.voter(&id("voter1")).has_voted);
    // a rejected vote does not consume the voter's right
    state.vote(&id("voter1"), 2).unwrap();
}

#[test]
fn candidate_lookup_out_of_range() {
    let state = ballot();
    assert_eq!(state.candidate(3), Err(BallotError::InvalidCandidate));
}

#[test]
fn unknown_voter_reads_as_default() {
    let state = ballot();
    assert_eq!(state.voter(&id("nobody")), Voter::default());
    assert_eq!(state.voters().count(), 0, "lookup must not create records");
}

#[test]
fn empty_ballot() {
    let mut state = BallotState::new(&[] as &[&str], "admin");
    assert_eq!(state.total_candidates(), 0);
    state.register_voter(&id("admin"), &id("voter1")).unwrap();
    for bad in [0, 1, u64::MAX] {
        assert_eq!(state.vote(&id("voter1"), bad), Err(BallotError::InvalidCandidate));
    }
    assert_eq!(state.candidate(0), Err(BallotError::InvalidCandidate));
}

// ─────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────

fn initialized_engine() -> BallotEngine {
    let mut engine = BallotEngine::new();
    engine
        .apply_command(&CommandEnvelope::initialize(1, "admin", &NAMES))
        .unwrap();
    engine
}

#[test]
fn engine_emits_vote_cast_in_call_order() {
    let mut engine = initialized_engine();
    let commands = [
        CommandEnvelope::register_voter(2, "admin", "voter1"),
        CommandEnvelope::register_voter(3, "admin", "voter2"),
        CommandEnvelope::vote(4, "voter1", 0),
        CommandEnvelope::vote(5, "voter2", 1),
    ];
    let state = engine.apply_sequence(&commands).unwrap();
    assert_eq!(state.candidate(0).unwrap().vote_count, 1);
    assert_eq!(state.candidate(1).unwrap().vote_count, 1);
    assert_eq!(state.candidate(2).unwrap().vote_count, 0);

    assert_eq!(
        engine.take_notifications(),
        vec![VoteCast { candidate_id: 0 }, VoteCast { candidate_id: 1 }]
    );
    assert!(engine.notifications().is_empty());
}

#[test]
fn engine_rejection_keeps_sequence_and_state() {
    let mut engine = initialized_engine();
    let before = engine.state().unwrap().clone();

    let err = engine
        .apply_command(&CommandEnvelope::register_voter(2, "mallory", "voter1"))
        .unwrap_err();
    assert_eq!(err, EngineError::Rejected(BallotError::AccessDenied));
    assert_eq!(err.as_ballot_error(), Some(BallotError::AccessDenied));
    assert_eq!(engine.last_sequence(), 1);
    assert_eq!(engine.state().unwrap(), &before);

    // the same sequence number is still available
    engine
        .apply_command(&CommandEnvelope::register_voter(2, "admin", "voter1"))
        .unwrap();
    assert_eq!(engine.last_sequence(), 2);
}

#[test]
fn engine_requires_initialize_first() {
    let mut engine = BallotEngine::new();
    assert_eq!(engine.state().unwrap_err(), EngineError::Uninitialized);

    let err = engine
        .apply_command(&CommandEnvelope::register_voter(1, "admin", "voter1"))
        .unwrap_err();
    assert_eq!(err, EngineError::NotInitialized("register_voter".to_string()));
    assert!(!engine.is_initialized());
}

#[test]
fn engine_rejects_second_initialize() {
    let mut engine = initialized_engine();
    let err = engine
        .apply_command(&CommandEnvelope::initialize(2, "admin", &["Mallory"]))
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyInitialized);
    assert_eq!(engine.state().unwrap().total_candidates(), 3);
}

#[test]
fn engine_enforces_sequence_and_schema() {
    let mut engine = initialized_engine();

    let err = engine
        .apply_command(&CommandEnvelope::register_voter(3, "admin", "voter1"))
        .unwrap_err();
    assert_eq!(err, EngineError::SequenceViolation { expected: 2, got: 3 });

    let mut cmd = CommandEnvelope::register_voter(2, "admin", "voter1");
    cmd.schema_version = 2;
    assert_eq!(
        engine.apply_command(&cmd).unwrap_err(),
        EngineError::SchemaMismatch { expected: 1, got: 2 }
    );

    let mut cmd = CommandEnvelope::register_voter(2, "admin", "voter1");
    cmd.command_type = "delegate".to_string();
    assert_eq!(
        engine.apply_command(&cmd).unwrap_err(),
        EngineError::UnknownCommand("delegate".to_string())
    );
}

#[test]
fn engine_initialize_with_explicit_admin() {
    let mut engine = BallotEngine::new();
    engine
        .apply_command(&CommandEnvelope::initialize_with_admin(1, "deployer", "admin", &NAMES))
        .unwrap();
    assert_eq!(
        engine
            .apply_command(&CommandEnvelope::register_voter(2, "deployer", "voter1"))
            .unwrap_err(),
        EngineError::Rejected(BallotError::AccessDenied)
    );
    engine
        .apply_command(&CommandEnvelope::register_voter(2, "admin", "voter1"))
        .unwrap();
}

#[test]
fn engine_empty_ballot_rejects_every_vote() {
    let mut engine = BallotEngine::new();
    engine
        .apply_command(&CommandEnvelope::initialize(1, "admin", &[] as &[&str]))
        .unwrap();
    assert_eq!(engine.state().unwrap().total_candidates(), 0);
    engine
        .apply_command(&CommandEnvelope::register_voter(2, "admin", "voter1"))
        .unwrap();
    for raw in [-1, 0, 1] {
        assert_eq!(
            engine
                .apply_command(&CommandEnvelope::vote_raw(3, "voter1", raw))
                .unwrap_err(),
            EngineError::Rejected(BallotError::InvalidCandidate)
        );
    }
}

#[test]
fn engine_replay_resets_first() {
    let commands = vec![
        CommandEnvelope::initialize(1, "admin", &NAMES),
        CommandEnvelope::register_voter(2, "admin", "voter1"),
        CommandEnvelope::vote(3, "voter1", 2),
    ];
    let mut engine = BallotEngine::new();
    engine.apply_sequence(&commands).unwrap();
    let first = engine.state().unwrap().clone();

    let replayed = engine.replay(&commands).unwrap();
    assert_eq!(replayed, &first);
    assert_eq!(engine.notifications(), &[VoteCast { candidate_id: 2 }]);
}

#[test]
fn engine_clone_is_an_independent_checkpoint() {
    let mut engine = initialized_engine();
    engine
        .apply_command(&CommandEnvelope::register_voter(2, "admin", "voter1"))
        .unwrap();
    let checkpoint = engine.clone();

    engine
        .apply_command(&CommandEnvelope::vote(3, "voter1", 0))
        .unwrap();
    assert_eq!(engine.last_sequence(), 3);

    let mut engine = checkpoint;
    assert_eq!(engine.last_sequence(), 2);
    assert!(engine.notifications().is_empty());
    assert!(!engine.state().unwrap().voter(&id("voter1")).has_voted);
    // the checkpoint accepts the same sequence number again
    engine
        .apply_command(&CommandEnvelope::vote(3, "voter1", 1))
        .unwrap();
}
