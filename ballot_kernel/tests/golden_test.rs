/// Golden determinism test: replays the frozen command stream
/// and asserts the canonical hash matches the permanent v1 value.
///
/// This test must NEVER be modified to match new behavior.
/// If it fails, the kernel has been broken.

use std::fs;

use ballot_kernel::engine::BallotEngine;
use ballot_kernel::events::CommandEnvelope;
use ballot_kernel::hashing::canonical_hash;
use ballot_kernel::KERNEL_VERSION;

fn load_commands(path: &str) -> Vec<CommandEnvelope> {
    let data = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    let arr: Vec<serde_json::Value> =
        serde_json::from_str(&data).expect("Failed to parse commands JSON");
    arr.iter().map(CommandEnvelope::from_value).collect()
}

fn load_expected_hash(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
        .trim()
        .to_string()
}

#[test]
fn golden_replay_hash_matches() {
    let commands = load_commands("tests/golden/commands.json");
    let mut engine = BallotEngine::new();
    let state = engine.replay(&commands).expect("golden stream must apply");
    let hash = canonical_hash(state);

    let expected = load_expected_hash("tests/golden/expected_hash.txt");
    assert_eq!(
        hash, expected,
        "GOLDEN TEST FAILED: Kernel v1 replay produced a different hash.\n\
         Got:      {}\n\
         Expected: {}",
        hash, expected
    );
}

#[test]
fn golden_replay_tallies() {
    let commands = load_commands("tests/golden/commands.json");
    let mut engine = BallotEngine::new();
    let state = engine.replay(&commands).unwrap();

    let counts: Vec<u64> = state.candidates().iter().map(|c| c.vote_count).collect();
    assert_eq!(counts, vec![2, 1, 0]);
    assert_eq!(engine.last_sequence(), commands.len() as u64);
    let emitted: Vec<u64> = engine.notifications().iter().map(|n| n.candidate_id).collect();
    assert_eq!(emitted, vec![0, 1, 0]);
}

#[test]
fn golden_replay_is_deterministic() {
    let commands = load_commands("tests/golden/commands.json");

    let mut engine1 = BallotEngine::new();
    let h1 = canonical_hash(engine1.replay(&commands).unwrap());

    let mut engine2 = BallotEngine::new();
    let h2 = canonical_hash(engine2.replay(&commands).unwrap());

    assert_eq!(
        h1, h2,
        "DETERMINISM FAILURE: Two replays of the same commands produced different hashes.\n\
         Run 1: {}\n\
         Run 2: {}",
        h1, h2
    );
}

#[test]
fn kernel_version_is_one() {
    assert_eq!(KERNEL_VERSION, 1, "KERNEL_VERSION must be 1 and never change");
}
