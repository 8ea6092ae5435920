/// Ballot kernel v1: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
///
/// Rules:
///   - Top-level field order: kernel_version, admin, candidates, voters
///   - Candidates in id order, voters sorted by identity (UTF-8 byte order)
///   - UTF-8 JSON, no whitespace, no float

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::BallotState;
use crate::KERNEL_VERSION;

/// Canonical serialization of BallotState to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &BallotState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &BallotState) -> String {
    sha256_hex(&canonical_serialize(state))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// serde_json::Map preserves insertion order (`preserve_order` feature).
fn build_canonical_value(state: &BallotState) -> Value {
    let candidates: Vec<Value> = state
        .candidates()
        .iter()
        .map(|c| {
            let mut m = Map::new();
            m.insert("id".to_string(), Value::from(c.id));
            m.insert("name".to_string(), Value::String(c.name.clone()));
            m.insert("vote_count".to_string(), Value::from(c.vote_count));
            Value::Object(m)
        })
        .collect();

    // BTreeMap iteration is already sorted by identity
    let voters: Vec<Value> = state
        .voters()
        .map(|(identity, v)| {
            let mut m = Map::new();
            m.insert("identity".to_string(), Value::String(identity.to_string()));
            m.insert("registered".to_string(), Value::Bool(v.registered));
            m.insert("has_voted".to_string(), Value::Bool(v.has_voted));
            m.insert(
                "voted_candidate_id".to_string(),
                v.voted_candidate_id.map(Value::from).unwrap_or(Value::Null),
            );
            Value::Object(m)
        })
        .collect();

    // kernel_version MUST be first, it is part of the kernel identity.
    let mut root = Map::new();
    root.insert("kernel_version".to_string(), Value::from(KERNEL_VERSION));
    root.insert("admin".to_string(), Value::String(state.admin().to_string()));
    root.insert("candidates".to_string(), Value::Array(candidates));
    root.insert("voters".to_string(), Value::Array(voters));

    Value::Object(root)
}
