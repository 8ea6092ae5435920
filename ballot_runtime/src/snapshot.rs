//! Snapshot layer: periodic, self-verifying state snapshots.
//!
//! Each snapshot stores the canonical JSON and its hash. No timestamps
//! in snapshot content. If a snapshot hash doesn't match a replay of
//! the log, the log wins.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ballot_kernel::domain::BallotState;
use ballot_kernel::hashing::{canonical_hash, canonical_serialize, sha256_hex};
use ballot_kernel::KERNEL_VERSION;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence of the last command applied before the snapshot.
    pub sequence: u64,
    /// Canonical JSON of the state (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    pub kernel_version: u32,
}

fn snapshot_file_name(sequence: u64) -> String {
    format!("snapshot_{:06}.json", sequence)
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(snapshot_file_name(sequence))
}

/// Sequence encoded in `name`, only if `name` is exactly the file name
/// `save_snapshot` writes for it.
fn parse_snapshot_name(name: &str) -> Option<u64> {
    let seq = name
        .strip_prefix("snapshot_")?
        .strip_suffix(".json")?
        .parse::<u64>()
        .ok()?;
    (snapshot_file_name(seq) == name).then_some(seq)
}

/// Write `snapshot_NNNNNN.json` for `state` at `sequence`.
pub fn save_snapshot(dir: &Path, sequence: u64, state: &BallotState) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let canonical_json = String::from_utf8(canonical_serialize(state))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let snap = Snapshot {
        sequence,
        canonical_json,
        hash: canonical_hash(state),
        kernel_version: KERNEL_VERSION,
    };
    let content = serde_json::to_string(&snap)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let path = snapshot_path(dir, sequence);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    debug!(sequence, path = %path.display(), "snapshot saved");
    Ok(path)
}

/// Load the snapshot taken at `sequence`, if there is one.
pub fn load_snapshot(dir: &Path, sequence: u64) -> io::Result<Option<Snapshot>> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap = serde_json::from_str(&content).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Bad snapshot: {}", e))
    })?;
    Ok(Some(snap))
}

/// Sequences of every `snapshot_NNNNNN.json` in `dir`, ascending.
pub fn list_snapshots(dir: &Path) -> io::Result<Vec<u64>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sequences = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(seq) = name.to_str().and_then(parse_snapshot_name) {
            sequences.push(seq);
        }
    }
    sequences.sort_unstable();
    Ok(sequences)
}

/// Load the snapshot with the highest sequence in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> io::Result<Option<Snapshot>> {
    match list_snapshots(dir)?.last() {
        Some(seq) => load_snapshot(dir, *seq),
        None => Ok(None),
    }
}

/// True if the stored hash matches the stored canonical JSON.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    sha256_hex(snap.canonical_json.as_bytes()) == snap.hash
}
