//! Snapshot Codec: deterministic BallotState encoder/decoder.
//!
//! Pure codec layer. No side-effects, no timestamps, no envelope.
//!
//! - `encode_snapshot`:  BallotState → JSON string
//! - `decode_snapshot`:  JSON string → BallotState (strict, no defaults)
//! - `restore_snapshot`: decode + invariant validation
//! - `export_snapshot_to_file` / `import_snapshot_from_file`: file I/O
//! - `snapshot_hash`:    SHA-256 of the JSON encoding (lowercase hex)

use std::fs;
use std::io;
use std::path::Path;

use ballot_kernel::domain::BallotState;
use ballot_kernel::hashing::sha256_hex;
use ballot_kernel::invariants::try_validate_invariants;
use thiserror::Error;

/// All possible snapshot codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("SerializationError: {0}")]
    Serialization(String),
    /// Malformed JSON, missing fields or unknown fields.
    #[error("DeserializationError: {0}")]
    Deserialization(String),
    /// Decoded state violates kernel invariants.
    #[error("InvariantViolation: {0}")]
    InvariantViolation(String),
    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Encoder / decoder
// ---------------------------------------------------------------------------

/// Encode a BallotState as compact JSON. BTreeMap keeps voters sorted,
/// so equal states always encode to identical bytes.
pub fn encode_snapshot(state: &BallotState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

/// Strict decode: unknown fields and missing fields both fail.
/// No invariant validation; use `restore_snapshot` for untrusted input.
pub fn decode_snapshot(json: &str) -> Result<BallotState, SnapshotError> {
    serde_json::from_str::<BallotState>(json)
        .map_err(|e| SnapshotError::Deserialization(e.to_string()))
}

/// Decode and validate invariants. Entry point for untrusted sources.
pub fn restore_snapshot(json: &str) -> Result<BallotState, SnapshotError> {
    let state = decode_snapshot(json)?;
    try_validate_invariants(&state).map_err(SnapshotError::InvariantViolation)?;
    Ok(state)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub fn export_snapshot_to_file(state: &BallotState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_snapshot(state)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

/// Read, decode and validate a state file.
pub fn import_snapshot_from_file(path: &Path) -> Result<BallotState, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_snapshot(&content)
}

/// SHA-256 of `encode_snapshot`'s output. This is a file-integrity hash,
/// not the canonical kernel hash from `hashing.rs`.
pub fn snapshot_hash(state: &BallotState) -> Result<String, SnapshotError> {
    Ok(sha256_hex(encode_snapshot(state)?.as_bytes()))
}
