//! Append-only command log of protobuf frames.
//!
//! Each frame is a 4-byte little-endian length followed by one encoded
//! `ProtoCommandEnvelope`. Only commands the kernel accepted are ever
//! appended, each one fsynced before `append` returns. Sequences in the
//! file run 1, 2, 3... with no gaps; reading checks that too.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, warn};

use crate::proto_types::ProtoCommandEnvelope;

/// Upper bound on a single frame; anything larger is corruption.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// Append-only command log backed by a single file.
#[derive(Debug)]
pub struct CommandLog {
    path: PathBuf,
    last_sequence: u64,
}

impl CommandLog {
    /// Open or create a log at `path`. Existing frames are decoded to
    /// recover the last sequence, so a damaged log fails here.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let log = Self {
            path: path.to_path_buf(),
            last_sequence: 0,
        };
        let last_sequence = log.load_all()?.last().map_or(0, |c| c.sequence);
        debug!(path = %path.display(), last_sequence, "command log opened");

        Ok(Self { last_sequence, ..log })
    }

    /// Append one command. Its sequence must be exactly `last + 1`.
    pub fn append(&mut self, command: &ProtoCommandEnvelope) -> io::Result<()> {
        let expected = self.last_sequence + 1;
        if command.sequence != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "command log expects sequence {}, got {}",
                    expected, command.sequence
                ),
            ));
        }

        let frame = encode_frame(command)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let start = file.metadata()?.len();
        append_frame(&mut file, start, &frame)?;

        self.last_sequence = command.sequence;
        debug!(sequence = command.sequence, bytes = frame.len(), "command appended");
        Ok(())
    }

    /// Every command in the log, in sequence order.
    pub fn load_all(&self) -> io::Result<Vec<ProtoCommandEnvelope>> {
        match fs::read(&self.path) {
            Ok(bytes) => decode_frames(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The file operations an append needs, so a failed write can be undone.
trait LogFile: Write {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_all()
    }
}

/// Write and sync one frame. On failure the file is cut back to `start`
/// so no torn frame is left behind.
fn append_frame<F: LogFile>(file: &mut F, start: u64, frame: &[u8]) -> io::Result<()> {
    let written = file.write_all(frame).and_then(|()| file.sync());
    if let Err(e) = written {
        if let Err(undo) = file.truncate_to(start) {
            warn!(start, error = %undo, "could not remove partial frame");
        }
        return Err(e);
    }
    Ok(())
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn encode_frame(command: &ProtoCommandEnvelope) -> io::Result<Vec<u8>> {
    let len = command.encoded_len();
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("command frame too large: {} bytes", len),
        ));
    }
    let mut frame = Vec::with_capacity(LEN_PREFIX + len);
    frame.extend_from_slice(&(len as u32).to_le_bytes());
    command
        .encode(&mut frame)
        .map_err(|e| invalid_data(e.to_string()))?;
    Ok(frame)
}

/// Split `bytes` into frames and decode each one. Fails on a bad length,
/// a truncated tail, an undecodable payload or a sequence gap.
fn decode_frames(mut bytes: &[u8]) -> io::Result<Vec<ProtoCommandEnvelope>> {
    let mut commands: Vec<ProtoCommandEnvelope> = Vec::new();

    while !bytes.is_empty() {
        let at = commands.len();
        if bytes.len() < LEN_PREFIX {
            return Err(invalid_data(format!("truncated length prefix after {} commands", at)));
        }
        let (prefix, rest) = bytes.split_at(LEN_PREFIX);
        let mut len_buf = [0u8; LEN_PREFIX];
        len_buf.copy_from_slice(prefix);
        let len = u32::from_le_bytes(len_buf) as usize;

        if len == 0 || len > MAX_FRAME_LEN {
            return Err(invalid_data(format!("invalid frame length {} after {} commands", len, at)));
        }
        if rest.len() < len {
            return Err(invalid_data(format!(
                "truncated frame after {} commands: need {} bytes, have {}",
                at,
                len,
                rest.len()
            )));
        }
        let (payload, rest) = rest.split_at(len);

        let command = ProtoCommandEnvelope::decode(payload)
            .map_err(|e| invalid_data(format!("undecodable frame after {} commands: {}", at, e)))?;
        let expected = at as u64 + 1;
        if command.sequence != expected {
            return Err(invalid_data(format!(
                "sequence gap in command log: expected {}, found {}",
                expected, command.sequence
            )));
        }

        commands.push(command);
        bytes = rest;
    }

    Ok(commands)
}
