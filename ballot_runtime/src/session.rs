//! Session manager: isolated ballots with apply-then-persist semantics.
//!
//! Each session gets its own directory with a command log and snapshots.
//! Concurrency: `SharedSession` serializes every call behind a Mutex,
//! no global mutable state.
//!
//! Apply-then-persist order:
//!   1. engine.apply_command(command): rejections stop here, nothing logged
//!   2. command_log.append(): only if step 1 succeeded
//!   3. snapshot if interval reached

use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ballot_kernel::domain::{BallotState, CandidateId, Identity, TransitionResult, VoteCast};
use ballot_kernel::engine::BallotEngine;
use ballot_kernel::events::CommandEnvelope;
use ballot_kernel::hashing::canonical_hash;
use tracing::{error, info, warn};

use crate::command_log::CommandLog;
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::proto_bridge::kernel_to_proto;
use crate::replay;
use crate::snapshot;

/// An isolated ballot with its own command log and snapshots.
pub struct Session {
    session_id: String,
    session_dir: PathBuf,
    engine: BallotEngine,
    log: CommandLog,
    snapshot_interval: u64,
}

impl Session {
    /// Open (or create) a session, replaying any commands already logged.
    ///
    /// Directory structure:
    ///   <base_dir>/<session_id>/commands.log
    ///   <base_dir>/<session_id>/snapshots/
    pub fn open(base_dir: &Path, session_id: &str, snapshot_interval: u64) -> Result<Self> {
        validate_session_id(session_id)?;
        let session_dir = base_dir.join(session_id);
        let log = CommandLog::open(&session_dir.join("commands.log"))?;

        let mut engine = BallotEngine::new();
        if log.last_sequence() > 0 {
            let commands = replay::decode_log(&log.load_all()?)?;
            engine.replay(&commands)?;
            // notifications from history were delivered when first applied
            engine.take_notifications();
        }
        info!(session_id, sequence = log.last_sequence(), "session opened");

        Ok(Self {
            session_id: session_id.to_string(),
            session_dir,
            engine,
            log,
            snapshot_interval,
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Self::open(&config.data_dir, &config.session_id, config.snapshot_interval)
    }

    /// Apply a command through the kernel, then persist it.
    pub fn apply(&mut self, command: &CommandEnvelope) -> Result<TransitionResult> {
        // Fail on unencodable commands before the kernel sees them.
        let proto = kernel_to_proto(command)?;

        let checkpoint = self.engine.clone();
        let result = self.engine.apply_command(command)?;

        if let Err(e) = self.log.append(&proto) {
            error!(sequence = command.sequence, error = %e, "command log append failed, rolling back");
            self.engine = checkpoint;
            return Err(e.into());
        }

        // Committed once logged; snapshot failures are not command failures.
        if self.snapshot_interval > 0 && command.sequence % self.snapshot_interval == 0 {
            if let Err(e) = self.save_snapshot(command.sequence) {
                warn!(sequence = command.sequence, error = %e, "interval snapshot failed");
            }
        }

        Ok(result)
    }

    fn save_snapshot(&self, sequence: u64) -> Result<PathBuf> {
        Ok(snapshot::save_snapshot(&self.snapshot_dir(), sequence, self.engine.state()?)?)
    }

    // ── Ballot operations (sequence assigned by the session) ──────────

    pub fn initialize<S: AsRef<str>>(
        &mut self,
        caller: impl Into<Identity>,
        admin: Option<Identity>,
        candidate_names: &[S],
    ) -> Result<TransitionResult> {
        let seq = self.next_sequence();
        let command = match admin {
            Some(admin) => CommandEnvelope::initialize_with_admin(seq, caller, admin, candidate_names),
            None => CommandEnvelope::initialize(seq, caller, candidate_names),
        };
        self.apply(&command)
    }

    pub fn register_voter(
        &mut self,
        caller: impl Into<Identity>,
        voter: impl Into<Identity>,
    ) -> Result<TransitionResult> {
        let command = CommandEnvelope::register_voter(self.next_sequence(), caller, voter);
        self.apply(&command)
    }

    pub fn vote(&mut self, caller: impl Into<Identity>, candidate_id: CandidateId) -> Result<VoteCast> {
        let command = CommandEnvelope::vote(self.next_sequence(), caller, candidate_id);
        let result = self.apply(&command)?;
        result
            .notifications
            .into_iter()
            .next()
            .ok_or(RuntimeError::MissingVoteCast {
                sequence: command.sequence,
            })
    }

    // ── Replay / verification ─────────────────────────────────────────

    /// Discard in-memory state and rebuild it from the log.
    pub fn replay_full(&mut self) -> Result<(BallotState, String)> {
        self.reload_from_log()?;
        let state = self.engine.state()?.clone();
        let hash = canonical_hash(&state);
        Ok((state, hash))
    }

    /// Check the newest snapshot against a replay of the log up to its
    /// sequence. `None` when no snapshot exists.
    pub fn verify_latest_snapshot(&self) -> Result<Option<bool>> {
        let snap = match snapshot::load_latest_snapshot(&self.snapshot_dir())? {
            Some(snap) => snap,
            None => return Ok(None),
        };
        if !snapshot::verify_snapshot_hash(&snap) {
            return Ok(Some(false));
        }

        let commands = self.logged_commands()?;
        let prefix: Vec<CommandEnvelope> = commands
            .into_iter()
            .take_while(|c| c.sequence <= snap.sequence)
            .collect();
        if prefix.last().map(|c| c.sequence) != Some(snap.sequence) {
            return Ok(Some(false));
        }
        let hash = replay::rebuild_hash(&prefix)?;
        Ok(Some(hash == snap.hash))
    }

    /// Every command persisted in this session's log, in order.
    pub fn logged_commands(&self) -> Result<Vec<CommandEnvelope>> {
        replay::decode_log(&self.log.load_all()?)
    }

    fn reload_from_log(&mut self) -> Result<()> {
        let commands = self.logged_commands()?;
        self.engine = BallotEngine::new();
        if !commands.is_empty() {
            self.engine.replay(&commands)?;
            self.engine.take_notifications();
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn state(&self) -> Result<&BallotState> {
        Ok(self.engine.state()?)
    }

    pub fn current_hash(&self) -> Result<String> {
        Ok(canonical_hash(self.engine.state()?))
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn next_sequence(&self) -> u64 {
        self.engine.last_sequence() + 1
    }

    /// VoteCast notifications emitted since the session was opened.
    pub fn take_notifications(&mut self) -> Vec<VoteCast> {
        self.engine.take_notifications()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.session_dir.join("snapshots")
    }
}

fn validate_session_id(session_id: &str) -> Result<()> {
    let mut components = Path::new(session_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None)
            if name == session_id && !session_id.contains(['/', '\\']) =>
        {
            Ok(())
        }
        _ => Err(RuntimeError::InvalidSessionId(session_id.to_string())),
    }
}

/// Thread-safe session handle.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    // Commands are swapped in whole, so a poisoned session is still consistent.
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply(&self, command: &CommandEnvelope) -> Result<TransitionResult> {
        self.lock().apply(command)
    }

    pub fn initialize<S: AsRef<str>>(
        &self,
        caller: impl Into<Identity>,
        admin: Option<Identity>,
        candidate_names: &[S],
    ) -> Result<TransitionResult> {
        self.lock().initialize(caller, admin, candidate_names)
    }

    pub fn register_voter(
        &self,
        caller: impl Into<Identity>,
        voter: impl Into<Identity>,
    ) -> Result<TransitionResult> {
        self.lock().register_voter(caller, voter)
    }

    pub fn vote(&self, caller: impl Into<Identity>, candidate_id: CandidateId) -> Result<VoteCast> {
        self.lock().vote(caller, candidate_id)
    }

    /// Run a read-only query against the current ballot.
    pub fn with_state<R>(&self, f: impl FnOnce(&BallotState) -> R) -> Result<R> {
        let session = self.lock();
        Ok(f(session.state()?))
    }

    pub fn current_hash(&self) -> Result<String> {
        self.lock().current_hash()
    }

    pub fn current_sequence(&self) -> u64 {
        self.lock().current_sequence()
    }
}
